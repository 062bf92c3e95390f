use super::*;
use crate::access::merge_object;
use crate::errors::{io_provider_unavailable, schema_invalid};
use crate::model::{KeyPath, Layer};
use chrono::Utc;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Reads JSON, YAML or TOML documents, picked by file extension.
pub struct FileSource {
    pub paths: Vec<PathBuf>,
    /// Missing files are skipped instead of failing the load.
    pub optional: bool,
}

impl FileSource {
    pub fn required(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            optional: false,
        }
    }
}

#[async_trait::async_trait]
impl Source for FileSource {
    fn id(&self) -> &'static str {
        "file"
    }

    async fn load(&self) -> Result<SourceSnapshot, ConfigError> {
        let mut merged = Map::new();
        let mut provenance = Vec::new();

        for path in &self.paths {
            if self.optional && !path.exists() {
                tracing::debug!(path = %path.display(), "optional config file absent");
                continue;
            }
            let content = std::fs::read_to_string(path).map_err(|e| {
                io_provider_unavailable(&format!("read {}", path.display()), &e.to_string())
            })?;

            if let Value::Object(obj) = parse_document(path, &content)? {
                merge_object(&mut merged, obj);
                provenance.push(ProvenanceEntry {
                    key: KeyPath("**".into()),
                    source_id: format!("{}:{}", self.id(), path.display()),
                    layer: Layer::File,
                    ts_ms: Utc::now().timestamp_millis(),
                });
            }
        }

        Ok(SourceSnapshot {
            map: merged,
            provenance,
        })
    }
}

pub fn parse_document(path: &Path, content: &str) -> Result<Value, ConfigError> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    let value = match ext {
        "json" => serde_json::from_str::<Value>(content)
            .map_err(|e| schema_invalid("json parse", &e.to_string()))?,
        "yml" | "yaml" => {
            #[cfg(feature = "yaml")]
            {
                serde_yaml::from_str::<Value>(content)
                    .map_err(|e| schema_invalid("yaml parse", &e.to_string()))?
            }
            #[cfg(not(feature = "yaml"))]
            {
                return Err(schema_invalid("yaml parse", "yaml support disabled"));
            }
        }
        "toml" => {
            #[cfg(feature = "toml")]
            {
                let parsed: toml::Value = toml::from_str(content)
                    .map_err(|e| schema_invalid("toml parse", &e.to_string()))?;
                serde_json::to_value(parsed)
                    .map_err(|e| schema_invalid("toml convert", &e.to_string()))?
            }
            #[cfg(not(feature = "toml"))]
            {
                return Err(schema_invalid("toml parse", "toml support disabled"));
            }
        }
        other => {
            return Err(schema_invalid(
                "file",
                &format!("unsupported extension '{other}' for {}", path.display()),
            ))
        }
    };
    Ok(value)
}
