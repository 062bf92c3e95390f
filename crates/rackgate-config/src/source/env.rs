use super::*;
use crate::access;
use crate::model::{KeyPath, Layer};
use chrono::Utc;

/// `RACKGATE__AUTH__ENABLED=false` becomes `auth.enabled = false`.
pub struct EnvSource {
    pub prefix: String,
    pub separator: String,
}

#[async_trait::async_trait]
impl Source for EnvSource {
    fn id(&self) -> &'static str {
        "env"
    }

    async fn load(&self) -> Result<SourceSnapshot, ConfigError> {
        let mut map = serde_json::Map::new();
        let mut provenance = Vec::new();

        for (key, value) in std::env::vars() {
            let Some(trimmed) = key.strip_prefix(&self.prefix) else {
                continue;
            };
            let trimmed = trimmed.trim_start_matches(&self.separator);
            if trimmed.is_empty() {
                continue;
            }
            let normalized = trimmed
                .split(&self.separator)
                .filter(|seg| !seg.is_empty())
                .map(|seg| seg.to_ascii_lowercase())
                .collect::<Vec<_>>()
                .join(".");

            access::set_path(&mut map, &normalized, access::parse_scalar(&value));
            provenance.push(ProvenanceEntry {
                key: KeyPath(normalized),
                source_id: self.id().to_string(),
                layer: Layer::Env,
                ts_ms: Utc::now().timestamp_millis(),
            });
        }

        Ok(SourceSnapshot { map, provenance })
    }
}
