use super::{SchemaService, ValidationOutcome};
use rackgate_config::access::{get_path, get_path_mut, set_path};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A base schema name that is resolved from a field of the payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscriminatorRule {
    pub base: String,
    /// Dotted path of the discriminator inside the payload.
    #[serde(default = "default_field")]
    pub field: String,
    /// Concrete schema used when the discriminator is absent or unknown.
    pub default: String,
    #[serde(default = "default_partial_suffix")]
    pub partial_suffix: String,
    /// Object receiving default credentials on PUT; `None` disables back-fill.
    #[serde(default)]
    pub credentials_path: Option<String>,
}

fn default_field() -> String {
    "service".to_string()
}

fn default_partial_suffix() -> String {
    "-partial".to_string()
}

impl DiscriminatorRule {
    pub fn new(base: &str, default: &str) -> Self {
        Self {
            base: base.to_string(),
            field: default_field(),
            default: default.to_string(),
            partial_suffix: default_partial_suffix(),
            credentials_path: None,
        }
    }

    pub fn with_credentials_path(mut self, path: &str) -> Self {
        self.credentials_path = Some(path.to_string());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultCredentials {
    pub user: String,
    pub password: String,
}

#[derive(Clone, Debug, Default)]
pub struct SchemaSelector {
    rules: Vec<DiscriminatorRule>,
    default_credentials: Option<DefaultCredentials>,
}

impl SchemaSelector {
    pub fn new(rules: Vec<DiscriminatorRule>, default_credentials: Option<DefaultCredentials>) -> Self {
        Self {
            rules,
            default_credentials,
        }
    }

    fn rule(&self, base: &str) -> Option<&DiscriminatorRule> {
        self.rules.iter().find(|r| r.base == base)
    }

    /// Concrete schema for `base`: `<discriminator>-<base>`, plus the partial
    /// suffix for PATCH, when the service knows it; else the rule's default.
    pub fn select(
        &self,
        service: &dyn SchemaService,
        base: &str,
        method: &str,
        payload: &Value,
    ) -> String {
        let Some(rule) = self.rule(base) else {
            return base.to_string();
        };
        let discriminator = get_path(payload, &rule.field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());
        if let Some(kind) = discriminator {
            let mut candidate = format!("{kind}-{}", rule.base);
            if method.eq_ignore_ascii_case("PATCH") {
                candidate.push_str(&rule.partial_suffix);
            }
            if service.contains(&candidate) {
                return candidate;
            }
            tracing::debug!(base, discriminator = kind, "unknown discriminator, using default schema");
        }
        rule.default.clone()
    }

    /// Inserts the default credentials into a PUT payload that carries neither field.
    pub fn backfill(&self, base: &str, method: &str, payload: &mut Value) -> bool {
        if !method.eq_ignore_ascii_case("PUT") {
            return false;
        }
        let (Some(creds), Some(path)) = (
            self.default_credentials.as_ref(),
            self.rule(base).and_then(|r| r.credentials_path.as_deref()),
        ) else {
            return false;
        };

        match get_path_mut(payload, path) {
            Some(Value::Object(target)) => {
                if target.contains_key("user") || target.contains_key("password") {
                    return false;
                }
                target.insert("user".into(), Value::String(creds.user.clone()));
                target.insert("password".into(), Value::String(creds.password.clone()));
                true
            }
            Some(_) => false,
            None => match payload {
                Value::Object(root) => {
                    let prefix = if path.is_empty() {
                        String::new()
                    } else {
                        format!("{path}.")
                    };
                    set_path(root, &format!("{prefix}user"), Value::String(creds.user.clone()));
                    set_path(
                        root,
                        &format!("{prefix}password"),
                        Value::String(creds.password.clone()),
                    );
                    true
                }
                _ => false,
            },
        }
    }

    /// Back-fills if applicable, selects the concrete schema and validates.
    pub async fn validate(
        &self,
        service: &dyn SchemaService,
        base: &str,
        method: &str,
        payload: &mut Value,
    ) -> (String, ValidationOutcome) {
        if self.backfill(base, method, payload) {
            tracing::debug!(base, "default credentials back-filled");
        }
        let schema = self.select(service, base, method, payload);
        let outcome = service.validate(&schema, payload).await;
        (schema, outcome)
    }
}
