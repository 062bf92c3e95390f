use crate::model::ResourceGrant;
use arc_swap::ArcSwap;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct AclKey {
    role: String,
    path: String,
    method: String,
}

impl AclKey {
    fn new(role: &str, path: &str, method: &str) -> Self {
        Self {
            role: role.to_string(),
            path: path.to_string(),
            method: method.to_ascii_uppercase(),
        }
    }
}

#[derive(Clone, Debug, Default)]
struct AclTable {
    allowed: HashSet<AclKey>,
    /// (path, METHOD) pairs with at least one declared role.
    restricted: HashSet<(String, String)>,
}

impl AclTable {
    fn insert(&mut self, role: &str, path: &str, method: &str) -> bool {
        self.restricted
            .insert((path.to_string(), method.to_ascii_uppercase()));
        self.allowed.insert(AclKey::new(role, path, method))
    }
}

/// Allow-list of (role, path, method) triples.
///
/// Readers load an immutable table without locking; writers publish a new
/// table. Entries are only ever added.
pub struct PolicyStore {
    table: ArcSwap<AclTable>,
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStore {
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(AclTable::default()),
        }
    }

    /// Records an allow entry for every declared role of every grant.
    ///
    /// Grants with an empty role list add nothing, leaving the pair open.
    pub fn load<'a>(&self, grants: impl IntoIterator<Item = &'a ResourceGrant>) -> usize {
        let grants: Vec<&ResourceGrant> = grants.into_iter().collect();
        let mut added = 0;
        self.table.rcu(|current| {
            let mut next = AclTable::clone(current);
            added = 0;
            for grant in &grants {
                for role in &grant.roles {
                    if next.insert(role, &grant.path, &grant.method) {
                        added += 1;
                    }
                }
            }
            Arc::new(next)
        });
        tracing::info!(rules = added, "acl rules loaded");
        added
    }

    pub fn register_rule(&self, role: &str, path: &str, method: &str) {
        if self.is_allowed(role, path, method) {
            return;
        }
        self.table.rcu(|current| {
            let mut next = AclTable::clone(current);
            next.insert(role, path, method);
            Arc::new(next)
        });
    }

    pub fn is_allowed(&self, role: &str, path: &str, method: &str) -> bool {
        self.table
            .load()
            .allowed
            .contains(&AclKey::new(role, path, method))
    }

    pub fn is_restricted(&self, path: &str, method: &str) -> bool {
        self.table
            .load()
            .restricted
            .contains(&(path.to_string(), method.to_ascii_uppercase()))
    }

    pub fn len(&self) -> usize {
        self.table.load().allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(path: &str, method: &str, roles: &[&str]) -> ResourceGrant {
        ResourceGrant {
            path: path.into(),
            method: method.into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn unregistered_triples_are_denied() {
        let store = PolicyStore::new();
        store.load(&[grant("/obms", "PUT", &["Administrator"])]);
        assert!(store.is_allowed("Administrator", "/obms", "put"));
        assert!(!store.is_allowed("Operator", "/obms", "PUT"));
        assert!(!store.is_allowed("Administrator", "/obms", "GET"));
        assert!(!store.is_allowed("Administrator", "/nodes", "PUT"));
    }

    #[test]
    fn empty_role_list_leaves_pair_unrestricted() {
        let store = PolicyStore::new();
        store.load(&[grant("/nodes", "GET", &[])]);
        assert!(!store.is_restricted("/nodes", "GET"));
        assert!(store.is_empty());
    }

    #[test]
    fn loading_twice_is_idempotent() {
        let store = PolicyStore::new();
        let grants = vec![grant("/obms", "PUT", &["Administrator", "Write"])];
        assert_eq!(store.load(&grants), 2);
        assert_eq!(store.load(&grants), 0);
        store.register_rule("Write", "/obms", "PUT");
        assert_eq!(store.len(), 2);
        assert!(store.is_restricted("/obms", "put"));
    }
}
