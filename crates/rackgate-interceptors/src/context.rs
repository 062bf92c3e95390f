use crate::operation::RouteMatch;
use crate::scope::ScopeStack;
use async_trait::async_trait;
use rackgate_auth::model::Caller;
use std::collections::{BTreeMap, BTreeSet};

/// Per-request state, owned by one request and discarded with it.
#[derive(Clone, Debug, Default)]
pub struct InterceptContext {
    pub correlation_id: String,
    pub route: Option<RouteMatch>,
    pub caller: Option<Caller>,
    /// Expanded roles; filled only after authorization ran.
    pub roles: BTreeSet<String>,
    pub scope: ScopeStack,
    /// Decoded (and possibly back-filled) request payload.
    pub body: Option<serde_json::Value>,
    pub query: BTreeMap<String, String>,
}

impl InterceptContext {
    pub fn operation_id(&self) -> Option<&str> {
        self.route
            .as_ref()
            .map(|r| r.descriptor.operation_id.as_str())
    }
}

#[async_trait]
pub trait ProtoRequest: Send {
    fn method(&self) -> &str;
    fn path(&self) -> &str;
    fn header(&self, name: &str) -> Option<String>;
    fn query(&self) -> BTreeMap<String, String>;
    async fn read_json(&mut self) -> Result<serde_json::Value, crate::errors::InterceptError>;
}

#[async_trait]
pub trait ProtoResponse: Send {
    fn set_status(&mut self, code: u16);
    fn insert_header(&mut self, name: &str, value: &str);
    async fn write_json(
        &mut self,
        body: &serde_json::Value,
    ) -> Result<(), crate::errors::InterceptError>;
}

/// Parses `a=1&b=two` into a map; later duplicates win.
pub fn parse_query(raw: Option<&str>) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(raw.unwrap_or("").as_bytes())
        .into_owned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_query;

    #[test]
    fn query_pairs() {
        let q = parse_query(Some("auth_token=abc&flag&x=1&x=2"));
        assert_eq!(q.get("auth_token").map(String::as_str), Some("abc"));
        assert_eq!(q.get("flag").map(String::as_str), Some(""));
        assert_eq!(q.get("x").map(String::as_str), Some("2"));
        assert!(parse_query(None).is_empty());
    }

    #[test]
    fn query_values_are_percent_decoded() {
        let q = parse_query(Some("auth_token=abc%2Edef&identifier=rack%20a&name=a+b"));
        assert_eq!(q.get("auth_token").map(String::as_str), Some("abc.def"));
        assert_eq!(q.get("identifier").map(String::as_str), Some("rack a"));
        assert_eq!(q.get("name").map(String::as_str), Some("a b"));
    }
}
