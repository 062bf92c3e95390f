use crate::errors::InterceptError;
use crate::scope::{ScopeStack, GLOBAL_SCOPE};
use rackgate_config::access::get_path;
use rackgate_config::source::file::parse_document;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Output templates with per-scope overrides.
///
/// On disk, `<dir>/<name>.json` is the global template and
/// `<dir>/<scope>/<name>.json` overrides it for one scope.
#[derive(Clone, Debug, Default)]
pub struct ScopedTemplateStore {
    templates: HashMap<(String, String), Value>,
}

impl ScopedTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_dir(dir: &Path) -> Result<Self, InterceptError> {
        let mut store = Self::new();
        store.load_scope(dir, GLOBAL_SCOPE)?;
        for entry in read_dir(dir)? {
            if entry.is_dir() {
                if let Some(scope) = entry.file_name().and_then(|s| s.to_str()) {
                    store.load_scope(&entry, scope)?;
                }
            }
        }
        tracing::info!(dir = %dir.display(), templates = store.len(), "templates loaded");
        Ok(store)
    }

    fn load_scope(&mut self, dir: &Path, scope: &str) -> Result<(), InterceptError> {
        for path in read_dir(dir)? {
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
            self.insert(scope, name, doc);
        }
        Ok(())
    }

    pub fn insert(&mut self, scope: &str, name: &str, template: Value) {
        self.templates
            .insert((scope.to_string(), name.to_string()), template);
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Narrowest scope first; returns the scope the template came from.
    pub fn lookup<'a, 's>(
        &'a self,
        name: &str,
        scope: &'s ScopeStack,
    ) -> Option<(&'s str, &'a Value)> {
        scope.iter().find_map(|s| {
            self.templates
                .get(&(s.to_string(), name.to_string()))
                .map(|doc| (s, doc))
        })
    }
}

fn read_dir(dir: &Path) -> Result<Vec<std::path::PathBuf>, InterceptError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        InterceptError::internal(&format!("template dir {}: {e}", dir.display()))
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| InterceptError::internal(&format!("template dir entry: {e}")))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

/// Fills a template document from `payload`.
///
/// A string that is exactly `{{path}}` takes the referenced value with its
/// JSON type (object keys whose path is absent are dropped); `{{.}}` is the
/// whole payload. Placeholders inside longer strings are interpolated as text.
/// An array payload renders the template once per element.
pub fn render_document(template: &Value, payload: &Value) -> Value {
    match payload {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| fill(template, item).unwrap_or(Value::Null))
                .collect(),
        ),
        single => fill(template, single).unwrap_or(Value::Null),
    }
}

fn fill(template: &Value, payload: &Value) -> Option<Value> {
    match template {
        Value::String(text) => fill_string(text, payload),
        Value::Array(items) => Some(Value::Array(
            items
                .iter()
                .map(|item| fill(item, payload).unwrap_or(Value::Null))
                .collect(),
        )),
        Value::Object(fields) => {
            let mut out = Map::new();
            for (key, value) in fields {
                if let Some(filled) = fill(value, payload) {
                    out.insert(key.clone(), filled);
                }
            }
            Some(Value::Object(out))
        }
        other => Some(other.clone()),
    }
}

fn placeholder(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("{{")?.strip_suffix("}}")?.trim();
    (!inner.contains("{{") && !inner.contains("}}")).then_some(inner)
}

fn resolve<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    if path == "." {
        Some(payload)
    } else {
        get_path(payload, path)
    }
}

fn fill_string(text: &str, payload: &Value) -> Option<Value> {
    if let Some(path) = placeholder(text) {
        return resolve(payload, path).cloned();
    }
    if !text.contains("{{") {
        return Some(Value::String(text.to_string()));
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        match resolve(payload, after[..end].trim()) {
            Some(Value::String(s)) => out.push_str(s),
            Some(Value::Null) | None => {}
            Some(other) => out.push_str(&other.to_string()),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Some(Value::String(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn narrowest_scope_wins() {
        let mut store = ScopedTemplateStore::new();
        store.insert(GLOBAL_SCOPE, "node.2.0", json!({"scope": "global"}));
        store.insert("sku-a", "node.2.0", json!({"scope": "sku-a"}));

        let mut stack = ScopeStack::new();
        assert_eq!(store.lookup("node.2.0", &stack).unwrap().0, "global");
        stack.push_front("sku-b");
        assert_eq!(store.lookup("node.2.0", &stack).unwrap().0, "global");
        stack.push_front("sku-a");
        let (scope, doc) = store.lookup("node.2.0", &stack).unwrap();
        assert_eq!(scope, "sku-a");
        assert_eq!(doc["scope"], "sku-a");
        assert!(store.lookup("missing", &stack).is_none());
    }

    #[test]
    fn placeholders_keep_types_and_drop_absent_keys() {
        let template = json!({
            "id": "{{id}}",
            "obms": "{{obms}}",
            "href": "/api/2.0/nodes/{{id}}/obm",
            "sku": "{{sku}}",
            "fixed": 1
        });
        let payload = json!({"id": "n1", "obms": [{"service": "ipmi-obm-service"}]});
        let out = render_document(&template, &payload);
        assert_eq!(
            out,
            json!({
                "id": "n1",
                "obms": [{"service": "ipmi-obm-service"}],
                "href": "/api/2.0/nodes/n1/obm",
                "fixed": 1
            })
        );
    }

    #[test]
    fn array_payload_renders_each_element() {
        let out = render_document(&json!({"name": "{{name}}"}), &json!([{"name": "a"}, {"name": "b"}]));
        assert_eq!(out, json!([{"name": "a"}, {"name": "b"}]));
    }

    #[test]
    fn loads_global_and_scoped_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("obm.json"), r#"{"v":"global"}"#).unwrap();
        std::fs::create_dir(dir.path().join("sku-a")).unwrap();
        std::fs::write(dir.path().join("sku-a").join("obm.json"), r#"{"v":"sku"}"#).unwrap();

        let store = ScopedTemplateStore::load_dir(dir.path()).unwrap();
        assert_eq!(store.len(), 2);
        let mut stack = ScopeStack::new();
        stack.push_front("sku-a");
        assert_eq!(store.lookup("obm", &stack).unwrap().1["v"], "sku");
    }
}
