use super::ValidationOutcome;
use crate::errors::InterceptError;
use jsonschema::{Draft, JSONSchema};
use rackgate_config::source::file::parse_document;
use rackgate_errors::prelude::ValidationGroup;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Compiled Draft 7 schemas keyed by name.
#[derive(Default)]
pub struct JsonSchemaRegistry {
    compiled: HashMap<String, JSONSchema>,
}

impl JsonSchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every schema document directly under `dir`, named by file stem.
    pub fn load_dir(dir: &Path) -> Result<Self, InterceptError> {
        let mut registry = Self::new();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            InterceptError::internal(&format!("schema dir {}: {e}", dir.display()))
        })?;
        for entry in entries {
            let path = entry
                .map_err(|e| InterceptError::internal(&format!("schema dir entry: {e}")))?
                .path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = std::fs::read_to_string(&path).map_err(|e| {
                InterceptError::internal(&format!("read {}: {e}", path.display()))
            })?;
            let doc = parse_document(&path, &content)?;
            registry.insert(name, &doc)?;
        }
        tracing::info!(dir = %dir.display(), schemas = registry.len(), "schemas loaded");
        Ok(registry)
    }

    pub fn insert(&mut self, name: &str, schema: &Value) -> Result<(), InterceptError> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|e| InterceptError::internal(&format!("schema '{name}' compile: {e}")))?;
        self.compiled.insert(name.to_string(), compiled);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.compiled.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.compiled.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Unknown names report `missing_schema` instead of failing.
    pub fn validate(&self, name: &str, payload: &Value) -> ValidationOutcome {
        let Some(schema) = self.compiled.get(name) else {
            return ValidationOutcome::missing(name);
        };
        let errors = match schema.validate(payload) {
            Ok(()) => return ValidationOutcome::ok(),
            Err(errors) => errors,
        };

        let mut groups: Vec<ValidationGroup> = Vec::new();
        for err in errors {
            let pointer = err.instance_path.to_string();
            let message = err.to_string();
            match groups.iter_mut().find(|g| g.pointer == pointer) {
                Some(group) => group.messages.push(message),
                None => groups.push(ValidationGroup::new(pointer, vec![message])),
            }
        }
        ValidationOutcome::failed(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> JsonSchemaRegistry {
        let mut registry = JsonSchemaRegistry::new();
        registry
            .insert(
                "ipmi-obm-service",
                &json!({
                    "type": "object",
                    "required": ["host", "user"],
                    "properties": {
                        "host": {"type": "string"},
                        "user": {"type": "string"},
                        "port": {"type": "integer"}
                    }
                }),
            )
            .unwrap();
        registry
    }

    #[test]
    fn matching_payload_is_valid_with_no_errors() {
        let outcome = registry().validate(
            "ipmi-obm-service",
            &json!({"host": "10.1.1.3", "user": "admin", "port": 623}),
        );
        assert!(outcome.valid);
        assert!(outcome.errors.is_empty());
        assert!(!outcome.missing_schema);
    }

    #[test]
    fn failures_are_grouped_by_location() {
        let outcome = registry().validate(
            "ipmi-obm-service",
            &json!({"host": 7, "port": "x"}),
        );
        assert!(!outcome.valid);
        assert_eq!(outcome.errors.len(), 3);
        let pointers: Vec<&str> = outcome.groups.iter().map(|g| g.pointer.as_str()).collect();
        assert!(pointers.contains(&""));
        assert!(pointers.contains(&"/host"));
        assert!(pointers.contains(&"/port"));
    }

    #[test]
    fn unknown_schema_is_reported_not_thrown() {
        let outcome = registry().validate("nope", &json!({}));
        assert!(outcome.missing_schema);
        assert!(!outcome.valid);
    }

    #[test]
    fn loads_schema_files_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("node.json"),
            r#"{"type":"object","required":["name"]}"#,
        )
        .unwrap();
        let registry = JsonSchemaRegistry::load_dir(dir.path()).unwrap();
        assert_eq!(registry.names(), vec!["node"]);
        assert!(!registry.validate("node", &json!({})).valid);
    }
}
