use super::Authenticator;
use crate::errors::{self, AuthError};
use crate::model::{AuthnInput, Caller, LocalUser};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub const DEFAULT_HASH_ITERATIONS: u32 = 10_000;
const HASH_BYTES: usize = 64;

/// base64(PBKDF2-HMAC-SHA256(password, salt)) with the default iteration count.
pub fn hash_password(salt: &str, password: &str) -> String {
    hash_password_with(salt, password, DEFAULT_HASH_ITERATIONS)
}

pub fn hash_password_with(salt: &str, password: &str, iterations: u32) -> String {
    let mut out = [0u8; HASH_BYTES];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations.max(1), &mut out);
    STANDARD.encode(out)
}

/// 64 hex characters.
pub fn generate_salt() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

/// Configured local accounts, read-only after startup.
#[derive(Clone, Debug)]
pub struct LocalUserStore {
    users: HashMap<String, LocalUser>,
    iterations: u32,
}

impl Default for LocalUserStore {
    fn default() -> Self {
        Self::new([])
    }
}

impl LocalUserStore {
    pub fn new(users: impl IntoIterator<Item = LocalUser>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|u| (u.username.clone(), u))
                .collect(),
            iterations: DEFAULT_HASH_ITERATIONS,
        }
    }

    /// Iteration count the stored hashes were produced with.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn get(&self, username: &str) -> Option<&LocalUser> {
        self.users.get(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn verify(&self, username: &str, password: &str) -> Option<&LocalUser> {
        let user = self.users.get(username)?;
        let computed = hash_password_with(&user.salt, password, self.iterations);
        let matches: bool = computed
            .as_bytes()
            .ct_eq(user.password_hash.as_bytes())
            .into();
        matches.then_some(user)
    }

    pub fn caller(&self, user: &LocalUser, strategy: &str) -> Caller {
        Caller {
            username: user.username.clone(),
            strategy: strategy.to_string(),
            roles: user.roles.clone(),
        }
    }
}

/// Decodes `Authorization: Basic base64(user:password)`.
pub fn basic_credentials(input: &AuthnInput) -> Option<(String, String)> {
    let encoded = input.scheme_token("Basic")?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, password) = text.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

pub struct BasicAuthenticator {
    users: Arc<LocalUserStore>,
}

impl BasicAuthenticator {
    pub fn new(users: Arc<LocalUserStore>) -> Self {
        Self { users }
    }
}

#[async_trait::async_trait]
impl Authenticator for BasicAuthenticator {
    fn strategy(&self) -> &'static str {
        "basic"
    }

    async fn authenticate(&self, input: &AuthnInput) -> Result<Caller, AuthError> {
        let (username, password) = basic_credentials(input)
            .ok_or_else(|| errors::unauthenticated("missing basic credentials"))?;
        let user = self
            .users
            .verify(&username, &password)
            .ok_or_else(|| errors::unauthenticated("invalid username or password"))?;
        Ok(self.users.caller(user, self.strategy()))
    }
}
