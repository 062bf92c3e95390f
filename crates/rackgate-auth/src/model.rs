use serde::{Deserialize, Serialize};

/// Identity established by an authentication strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub username: String,
    /// Strategy that produced the identity (`basic`, `jwt`, `redfish`).
    pub strategy: String,
    /// Roles assigned directly to the user, before hierarchy expansion.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Credential material extracted from an inbound request.
#[derive(Clone, Debug, Default)]
pub struct AuthnInput {
    /// Raw `Authorization` header.
    pub authorization: Option<String>,
    /// `auth_token` query parameter.
    pub query_token: Option<String>,
    /// `X-Auth-Token` header (Redfish sessions).
    pub session_token: Option<String>,
}

impl AuthnInput {
    /// Token after an `Authorization: <scheme> <token>` prefix, matched case-insensitively.
    pub fn scheme_token(&self, scheme: &str) -> Option<&str> {
        let header = self.authorization.as_deref()?.trim();
        let (found, rest) = header.split_once(' ')?;
        if found.eq_ignore_ascii_case(scheme) {
            let token = rest.trim();
            (!token.is_empty()).then_some(token)
        } else {
            None
        }
    }
}

/// A configured local account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalUser {
    pub username: String,
    pub salt: String,
    /// base64(SHA-256(salt || password)).
    pub password_hash: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// The roles an operation declares for one (path, method) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGrant {
    pub path: String,
    pub method: String,
    pub roles: Vec<String>,
}
