use serde_json::{Map, Value};

/// Walks a dotted path (`auth.users`) through nested objects.
pub fn get_path<'a>(root: &'a Value, dotted: &str) -> Option<&'a Value> {
    if dotted.is_empty() {
        return Some(root);
    }
    let mut current = root;
    for segment in dotted.split('.') {
        current = match current {
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            other => other.get(segment)?,
        };
    }
    Some(current)
}

pub fn get_path_mut<'a>(root: &'a mut Value, dotted: &str) -> Option<&'a mut Value> {
    if dotted.is_empty() {
        return Some(root);
    }
    let mut current = root;
    for segment in dotted.split('.') {
        current = current.get_mut(segment)?;
    }
    Some(current)
}

/// Inserts `value` at `dotted`, creating (or replacing non-object) intermediates.
pub fn set_path(root: &mut Map<String, Value>, dotted: &str, value: Value) {
    let mut current = root;
    let mut segments = dotted.split('.').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let slot = current
            .entry(segment)
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
}

/// Deep merge; objects merge key by key, everything else is replaced.
pub fn merge_object(dst: &mut Map<String, Value>, src: Map<String, Value>) {
    for (key, value) in src {
        match (dst.get_mut(&key), value) {
            (Some(Value::Object(dst_obj)), Value::Object(src_obj)) => {
                merge_object(dst_obj, src_obj);
            }
            (_, v) => {
                dst.insert(key, v);
            }
        }
    }
}

/// Text from env/CLI becomes a JSON scalar when it parses as one.
///
/// `"true"` is a bool, `"8080"` a number, `"[\"a\"]"` an array; anything that is
/// not valid JSON stays a string. Quote a value (`'"1234"'`) to force a string.
pub fn parse_scalar(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw.trim()).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_path_replaces_scalar_intermediates() {
        let mut map = Map::new();
        set_path(&mut map, "server", json!("flat"));
        set_path(&mut map, "server.bind", json!("127.0.0.1:1"));
        assert_eq!(Value::Object(map), json!({"server": {"bind": "127.0.0.1:1"}}));
    }

    #[test]
    fn get_path_indexes_arrays() {
        let doc = json!({"auth": {"users": [{"username": "admin"}]}});
        assert_eq!(
            get_path(&doc, "auth.users.0.username"),
            Some(&json!("admin"))
        );
        assert_eq!(get_path(&doc, ""), Some(&doc));
        assert!(get_path(&doc, "auth.missing").is_none());
    }

    #[test]
    fn scalars_are_typed() {
        assert_eq!(parse_scalar("true"), json!(true));
        assert_eq!(parse_scalar("8080"), json!(8080));
        assert_eq!(parse_scalar("debug"), json!("debug"));
        assert_eq!(parse_scalar("\"1234\""), json!("1234"));
    }
}
