use super::local::LocalUserStore;
use super::Authenticator;
use crate::errors::{self, AuthError};
use crate::model::{AuthnInput, Caller};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: i64,
    /// Absent when tokens never expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Issues and verifies HS256 bearer tokens.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl TokenIssuer {
    /// `ttl_secs == 0` issues tokens without expiry.
    pub fn new(secret: impl AsRef<[u8]>, ttl_secs: u64) -> Self {
        let secret = secret.as_ref();
        let mut validation = Validation::new(Algorithm::HS256);
        if ttl_secs == 0 {
            validation.validate_exp = false;
            validation.required_spec_claims = HashSet::new();
        }
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        }
    }

    pub fn issue(&self, username: &str) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let claims = TokenClaims {
            sub: username.to_string(),
            iat: now,
            exp: (self.ttl_secs > 0).then(|| now + self.ttl_secs as i64),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| errors::internal(&format!("sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                errors::unauthenticated(&format!("invalid token: {e}"))
            })
    }
}

/// Token from `Authorization: JWT|Bearer <token>` or the `auth_token` query parameter.
pub fn bearer_token(input: &AuthnInput) -> Option<&str> {
    input
        .scheme_token("JWT")
        .or_else(|| input.scheme_token("Bearer"))
        .or(input.query_token.as_deref().filter(|t| !t.is_empty()))
}

pub struct JwtAuthenticator {
    issuer: Arc<TokenIssuer>,
    users: Arc<LocalUserStore>,
}

impl JwtAuthenticator {
    pub fn new(issuer: Arc<TokenIssuer>, users: Arc<LocalUserStore>) -> Self {
        Self { issuer, users }
    }
}

#[async_trait::async_trait]
impl Authenticator for JwtAuthenticator {
    fn strategy(&self) -> &'static str {
        "jwt"
    }

    async fn authenticate(&self, input: &AuthnInput) -> Result<Caller, AuthError> {
        let token =
            bearer_token(input).ok_or_else(|| errors::unauthenticated("missing bearer token"))?;
        let claims = self.issuer.verify(token)?;
        let user = self
            .users
            .get(&claims.sub)
            .ok_or_else(|| errors::unauthenticated("token subject no longer exists"))?;
        Ok(self.users.caller(user, self.strategy()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authn::local::hash_password;
    use crate::model::LocalUser;

    fn users() -> Arc<LocalUserStore> {
        Arc::new(LocalUserStore::new([LocalUser {
            username: "ops".into(),
            salt: "s".into(),
            password_hash: hash_password("s", "pw"),
            roles: vec!["Operator".into()],
        }]))
    }

    #[test]
    fn issued_token_verifies() {
        let issuer = TokenIssuer::new("secret", 60);
        let token = issuer.issue("ops").unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "ops");
        assert!(claims.exp.is_some());
    }

    #[test]
    fn zero_ttl_tokens_have_no_expiry() {
        let issuer = TokenIssuer::new("secret", 0);
        let token = issuer.issue("ops").unwrap();
        assert_eq!(issuer.verify(&token).unwrap().exp, None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = TokenIssuer::new("secret", 60);
        let now = chrono::Utc::now().timestamp();
        let stale = TokenClaims {
            sub: "ops".into(),
            iat: now - 7200,
            exp: Some(now - 3600),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &stale,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn expiring_issuer_requires_exp_claim() {
        let forever = TokenIssuer::new("secret", 0).issue("ops").unwrap();
        assert!(TokenIssuer::new("secret", 60).verify(&forever).is_err());
    }

    #[test]
    fn foreign_algorithm_is_rejected() {
        let claims = TokenClaims {
            sub: "ops".into(),
            iat: 0,
            exp: None,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(TokenIssuer::new("secret", 0).verify(&token).is_err());
    }

    #[test]
    fn tampered_or_foreign_tokens_fail() {
        let issuer = TokenIssuer::new("secret", 60);
        let other = TokenIssuer::new("other", 60);
        let token = other.issue("ops").unwrap();
        assert!(issuer.verify(&token).is_err());
        assert!(issuer.verify("a.b").is_err());
        assert!(issuer.verify("a.b.c.d").is_err());
    }

    #[tokio::test]
    async fn query_parameter_token_authenticates() {
        let issuer = Arc::new(TokenIssuer::new("secret", 60));
        let token = issuer.issue("ops").unwrap();
        let auth = JwtAuthenticator::new(issuer, users());
        let caller = auth
            .authenticate(&AuthnInput {
                query_token: Some(token),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(caller.username, "ops");
        assert_eq!(caller.roles, vec!["Operator".to_string()]);
    }

    #[tokio::test]
    async fn unknown_subject_is_rejected() {
        let issuer = Arc::new(TokenIssuer::new("secret", 60));
        let token = issuer.issue("ghost").unwrap();
        let auth = JwtAuthenticator::new(issuer, users());
        let err = auth
            .authenticate(&AuthnInput {
                authorization: Some(format!("JWT {token}")),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.into_inner().http_status, 401);
    }
}
