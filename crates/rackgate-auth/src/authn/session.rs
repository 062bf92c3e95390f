use super::local::{basic_credentials, LocalUserStore};
use super::Authenticator;
use crate::errors::{self, AuthError};
use crate::model::{AuthnInput, Caller};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone, Debug, Serialize)]
pub struct Session {
    pub id: String,
    pub token: String,
    pub username: String,
    pub created_at_ms: i64,
}

/// Live Redfish sessions keyed by `X-Auth-Token`.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Session>,
    /// Lifetime in seconds; 0 keeps sessions until revoked.
    ttl_secs: u64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn create(&self, username: &str) -> Session {
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            token: uuid::Uuid::new_v4().simple().to_string(),
            username: username.to_string(),
            created_at_ms: chrono::Utc::now().timestamp_millis(),
        };
        self.sessions
            .insert(session.token.clone(), session.clone());
        tracing::debug!(session = %session.id, user = %username, "session created");
        session
    }

    /// Live session for `token`; an expired one is dropped on the way.
    pub fn lookup(&self, token: &str) -> Option<Session> {
        let session = self.sessions.get(token).map(|entry| entry.value().clone())?;
        if self.is_expired(&session) {
            self.sessions.remove(token);
            tracing::debug!(session = %session.id, "session expired");
            return None;
        }
        Some(session)
    }

    fn is_expired(&self, session: &Session) -> bool {
        if self.ttl_secs == 0 {
            return false;
        }
        let age_ms = chrono::Utc::now().timestamp_millis() - session.created_at_ms;
        age_ms >= (self.ttl_secs as i64).saturating_mul(1000)
    }

    /// Removes the session with the given id; returns whether one existed.
    pub fn revoke(&self, session_id: &str) -> bool {
        let token = self
            .sessions
            .iter()
            .find(|entry| entry.value().id == session_id)
            .map(|entry| entry.key().clone());
        match token {
            Some(token) => self.sessions.remove(&token).is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Basic credentials or an `X-Auth-Token` session.
pub struct RedfishAuthenticator {
    users: Arc<LocalUserStore>,
    sessions: Arc<SessionRegistry>,
}

impl RedfishAuthenticator {
    pub fn new(users: Arc<LocalUserStore>, sessions: Arc<SessionRegistry>) -> Self {
        Self { users, sessions }
    }
}

#[async_trait::async_trait]
impl Authenticator for RedfishAuthenticator {
    fn strategy(&self) -> &'static str {
        "redfish"
    }

    async fn authenticate(&self, input: &AuthnInput) -> Result<Caller, AuthError> {
        if let Some(token) = input.session_token.as_deref() {
            let session = self
                .sessions
                .lookup(token)
                .ok_or_else(|| errors::unauthenticated("unknown or expired session"))?;
            let user = self
                .users
                .get(&session.username)
                .ok_or_else(|| errors::unauthenticated("session user no longer exists"))?;
            return Ok(self.users.caller(user, self.strategy()));
        }

        let (username, password) = basic_credentials(input)
            .ok_or_else(|| errors::unauthenticated("missing credentials"))?;
        let user = self
            .users
            .verify(&username, &password)
            .ok_or_else(|| errors::unauthenticated("invalid username or password"))?;
        Ok(self.users.caller(user, self.strategy()))
    }
}
