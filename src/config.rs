//! Gateway configuration.
//!
//! Layers, lowest first: built-in defaults, the config file, `RACKGATE__*`
//! environment variables, then `--set key=value` overrides.

use crate::errors::GatewayError;
use rackgate_auth::model::LocalUser;
use rackgate_auth::prelude::DEFAULT_HASH_ITERATIONS;
use rackgate_config::prelude::*;
use rackgate_interceptors::prelude::{DefaultCredentials, DiscriminatorRule};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const ENV_PREFIX: &str = "RACKGATE";
pub const ENV_SEPARATOR: &str = "__";
pub const DEFAULT_CONFIG_FILE: &str = "config/rackgate.yaml";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub schemas: SchemasConfig,
    pub templates: TemplatesConfig,
    pub defaults: DefaultsConfig,
    pub handler: HandlerConfig,
    pub api_spec: ApiSpecConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Used when the API document declares no `basePath`.
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".into(),
            base_path: "/api/2.0".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level; `debug` also discloses stacks in error envelopes.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    /// HS256 secret; a random one is generated when absent.
    pub token_secret: Option<String>,
    /// Token lifetime; 0 disables expiry.
    pub token_ttl_secs: u64,
    /// Redfish session lifetime; 0 keeps sessions until revoked.
    pub session_ttl_secs: u64,
    /// PBKDF2 iterations every `users[].password_hash` was produced with.
    pub hash_iterations: u32,
    pub users: Vec<LocalUser>,
    /// Extra role parents on top of the built-in hierarchy.
    pub role_parents: BTreeMap<String, Vec<String>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            token_secret: None,
            token_ttl_secs: 86_400,
            session_ttl_secs: 1_800,
            hash_iterations: DEFAULT_HASH_ITERATIONS,
            users: Vec::new(),
            role_parents: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemasConfig {
    pub dir: Option<PathBuf>,
    pub discriminators: Vec<DiscriminatorRule>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Back-filled into PUT payloads of discriminated families that carry no credentials.
    pub credentials: Option<DefaultCredentials>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    pub timeout_ms: u64,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

impl HandlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSpecConfig {
    pub path: PathBuf,
}

impl Default for ApiSpecConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config/api-spec.json"),
        }
    }
}

impl GatewayConfig {
    /// Applies a `--log-level` override. The returned level drives both the
    /// log filter and stack disclosure in error envelopes.
    pub fn apply_log_level(&mut self, override_level: Option<&str>) -> &str {
        if let Some(level) = override_level.map(str::trim).filter(|l| !l.is_empty()) {
            self.logging.level = level.to_string();
        }
        &self.logging.level
    }
}

/// Config files tried when `--config` is not given; missing ones are skipped.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
    if let Some(mut dir) = dirs::config_dir() {
        dir.push("rackgate");
        dir.push("rackgate.yaml");
        paths.push(dir);
    }
    paths
}

fn defaults_tree() -> Result<serde_json::Value, GatewayError> {
    serde_json::to_value(GatewayConfig::default())
        .map_err(|e| GatewayError::startup(&format!("serialize defaults: {e}")))
}

/// Loads the layered configuration. An explicit `config_path` must exist.
pub async fn load(
    config_path: Option<&Path>,
    overrides: &[String],
) -> Result<(GatewayConfig, ConfigSnapshot), GatewayError> {
    let files = match config_path {
        Some(path) => FileSource::required(vec![path.to_path_buf()]),
        None => FileSource {
            paths: default_config_paths(),
            optional: true,
        },
    };

    let snapshot = Loader::new(defaults_tree()?)
        .with_source(Arc::new(files))
        .with_source(Arc::new(EnvSource {
            prefix: ENV_PREFIX.into(),
            separator: ENV_SEPARATOR.into(),
        }))
        .with_source(Arc::new(CliArgsSource {
            args: overrides.to_vec(),
        }))
        .load_once()
        .await?;

    let config: GatewayConfig = snapshot.deserialize()?;
    tracing::debug!(checksum = %snapshot.checksum().0, "configuration loaded");
    Ok((config, snapshot))
}
