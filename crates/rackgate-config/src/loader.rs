use crate::{
    access::merge_object,
    errors::{self, ConfigError},
    model::{ConfigMap, KeyPath, Layer, ProvenanceEntry, SnapshotVersion},
    snapshot::ConfigSnapshot,
    source::Source,
};
use chrono::Utc;
use std::sync::Arc;

/// Merges built-in defaults with every source, in order.
pub struct Loader {
    pub defaults: serde_json::Value,
    pub sources: Vec<Arc<dyn Source>>,
}

impl Loader {
    pub fn new(defaults: serde_json::Value) -> Self {
        Self {
            defaults,
            sources: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn Source>) -> Self {
        self.sources.push(source);
        self
    }

    pub async fn load_once(&self) -> Result<ConfigSnapshot, ConfigError> {
        let mut map = match self.defaults.clone() {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => ConfigMap::new(),
            other => {
                return Err(errors::schema_invalid(
                    "defaults",
                    &format!("expected object, got {other}"),
                ))
            }
        };
        let mut provenance = vec![ProvenanceEntry {
            key: KeyPath("**".into()),
            source_id: "defaults".into(),
            layer: Layer::Defaults,
            ts_ms: Utc::now().timestamp_millis(),
        }];

        for source in &self.sources {
            let snapshot = source.load().await?;
            tracing::debug!(
                source = source.id(),
                keys = snapshot.provenance.len(),
                "config source loaded"
            );
            merge_object(&mut map, snapshot.map);
            provenance.extend(snapshot.provenance);
        }

        Ok(ConfigSnapshot::from_tree(
            serde_json::Value::Object(map),
            SnapshotVersion("v1".into()),
            provenance,
        ))
    }
}
