use crate::errors::{self, AuthError};
use crate::model::{Caller, ResourceGrant};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};

pub mod roles;
pub mod store;

pub use roles::{has_role, RoleHierarchy};
pub use store::PolicyStore;

/// Authorization collaborator consulted by the pipeline.
#[async_trait]
pub trait AuthorizationService: Send + Sync {
    async fn is_allowed(&self, role: &str, path: &str, method: &str) -> bool;
    /// Whether any role was declared for the pair; undeclared pairs are open.
    async fn is_restricted(&self, path: &str, method: &str) -> bool;
    async fn expand_roles(&self, assigned: &[String]) -> BTreeSet<String>;
    async fn register_rule(&self, role: &str, path: &str, method: &str);
    /// Roles configured for a username, used when the identity carries none.
    async fn roles_of(&self, username: &str) -> Vec<String>;
}

/// Decides whether `caller` may invoke `method` on the path template `path`.
///
/// Returns the caller's expanded role set on success.
pub async fn authorize(
    service: &dyn AuthorizationService,
    caller: &Caller,
    path: &str,
    method: &str,
) -> Result<BTreeSet<String>, AuthError> {
    let assigned = if caller.roles.is_empty() {
        service.roles_of(&caller.username).await
    } else {
        caller.roles.clone()
    };
    let expanded = service.expand_roles(&assigned).await;

    if !service.is_restricted(path, method).await {
        return Ok(expanded);
    }
    for role in &expanded {
        if service.is_allowed(role, path, method).await {
            return Ok(expanded);
        }
    }
    tracing::warn!(
        user = %caller.username,
        %path,
        %method,
        roles = ?expanded,
        "authorization denied"
    );
    Err(errors::forbidden(&format!(
        "{} may not {} {}",
        caller.username, method, path
    )))
}

/// In-process ACL: policy store, role hierarchy and user role assignments.
pub struct AclService {
    store: PolicyStore,
    roles: RoleHierarchy,
    assignments: HashMap<String, Vec<String>>,
}

impl AclService {
    pub fn new(roles: RoleHierarchy) -> Self {
        Self {
            store: PolicyStore::new(),
            roles,
            assignments: HashMap::new(),
        }
    }

    pub fn with_assignments(mut self, assignments: HashMap<String, Vec<String>>) -> Self {
        self.assignments = assignments;
        self
    }

    pub fn load<'a>(&self, grants: impl IntoIterator<Item = &'a ResourceGrant>) -> usize {
        self.store.load(grants)
    }

    pub fn store(&self) -> &PolicyStore {
        &self.store
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.roles
    }
}

#[async_trait]
impl AuthorizationService for AclService {
    async fn is_allowed(&self, role: &str, path: &str, method: &str) -> bool {
        self.store.is_allowed(role, path, method)
    }

    async fn is_restricted(&self, path: &str, method: &str) -> bool {
        self.store.is_restricted(path, method)
    }

    async fn expand_roles(&self, assigned: &[String]) -> BTreeSet<String> {
        self.roles.expand_roles(assigned)
    }

    async fn register_rule(&self, role: &str, path: &str, method: &str) {
        self.store.register_rule(role, path, method);
    }

    async fn roles_of(&self, username: &str) -> Vec<String> {
        self.assignments.get(username).cloned().unwrap_or_default()
    }
}
