use super::*;
use crate::{
    access,
    errors::schema_invalid,
    model::{KeyPath, Layer},
};
use chrono::Utc;

/// `key=value` overrides from the command line (`--set logging.level=debug`).
pub struct CliArgsSource {
    pub args: Vec<String>,
}

#[async_trait::async_trait]
impl Source for CliArgsSource {
    fn id(&self) -> &'static str {
        "cli"
    }

    async fn load(&self) -> Result<SourceSnapshot, ConfigError> {
        let mut map = serde_json::Map::new();
        let mut provenance = Vec::new();

        for arg in &self.args {
            let arg = arg.strip_prefix("--").unwrap_or(arg);
            let Some((key, value)) = arg.split_once('=') else {
                return Err(schema_invalid("cli", &format!("expected key=value, got '{arg}'")));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(schema_invalid("cli", "empty key"));
            }
            access::set_path(&mut map, key, access::parse_scalar(value));
            provenance.push(ProvenanceEntry {
                key: KeyPath(key.into()),
                source_id: self.id().to_string(),
                layer: Layer::Cli,
                ts_ms: Utc::now().timestamp_millis(),
            });
        }

        Ok(SourceSnapshot { map, provenance })
    }
}
