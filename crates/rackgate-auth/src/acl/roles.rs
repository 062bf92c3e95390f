use arc_swap::ArcSwap;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

type ParentMap = HashMap<String, BTreeSet<String>>;

pub fn builtin_role_parents() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        (
            "Administrator",
            vec![
                "Read",
                "Write",
                "Login",
                "ConfigureManager",
                "ConfigureUsers",
                "ConfigureComponents",
                "ConfigureSelf",
            ],
        ),
        ("ReadOnly", vec!["Read", "Login", "ConfigureSelf"]),
        (
            "Operator",
            vec!["Login", "ConfigureComponents", "ConfigureSelf"],
        ),
    ]
}

/// Role → parent roles. A role implies every role reachable through its parents.
pub struct RoleHierarchy {
    parents: ArcSwap<ParentMap>,
}

impl Default for RoleHierarchy {
    fn default() -> Self {
        Self::empty()
    }
}

impl RoleHierarchy {
    pub fn empty() -> Self {
        Self {
            parents: ArcSwap::from_pointee(ParentMap::new()),
        }
    }

    pub fn with_builtin() -> Self {
        let hierarchy = Self::empty();
        for (role, parents) in builtin_role_parents() {
            hierarchy.add_role_parents(role, parents);
        }
        hierarchy
    }

    /// Adds parents to a role, keeping any it already has.
    pub fn add_role_parents<I, S>(&self, role: &str, parents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parents: Vec<String> = parents.into_iter().map(Into::into).collect();
        self.parents.rcu(|current| {
            let mut next = ParentMap::clone(current);
            next.entry(role.to_string())
                .or_default()
                .extend(parents.iter().cloned());
            Arc::new(next)
        });
    }

    pub fn parents_of(&self, role: &str) -> BTreeSet<String> {
        self.parents
            .load()
            .get(role)
            .cloned()
            .unwrap_or_default()
    }

    /// Every assigned role plus all transitive parents. Cycles terminate.
    pub fn expand_roles<S: AsRef<str>>(&self, assigned: &[S]) -> BTreeSet<String> {
        let parents = self.parents.load();
        let mut out = BTreeSet::new();
        let mut pending: Vec<String> = assigned.iter().map(|r| r.as_ref().to_string()).collect();
        while let Some(role) = pending.pop() {
            if !out.insert(role.clone()) {
                continue;
            }
            if let Some(direct) = parents.get(&role) {
                pending.extend(direct.iter().filter(|p| !out.contains(*p)).cloned());
            }
        }
        out
    }
}

pub fn has_role(expanded: &BTreeSet<String>, role: &str) -> bool {
    expanded.contains(role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_is_reflexive_and_transitive() {
        let roles = RoleHierarchy::empty();
        roles.add_role_parents("A", ["B"]);
        roles.add_role_parents("B", ["C"]);
        let expanded = roles.expand_roles(&["A"]);
        assert_eq!(
            expanded.into_iter().collect::<Vec<_>>(),
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
        assert!(has_role(&roles.expand_roles(&["Unknown"]), "Unknown"));
    }

    #[test]
    fn cycles_terminate() {
        let roles = RoleHierarchy::empty();
        roles.add_role_parents("A", ["B"]);
        roles.add_role_parents("B", ["A"]);
        assert_eq!(roles.expand_roles(&["A"]).len(), 2);
    }

    #[test]
    fn builtin_operator_is_not_administrator() {
        let roles = RoleHierarchy::with_builtin();
        let operator = roles.expand_roles(&["Operator"]);
        assert!(has_role(&operator, "ConfigureComponents"));
        assert!(!has_role(&operator, "Administrator"));
        let admin = roles.expand_roles(&["Administrator"]);
        assert!(has_role(&admin, "ConfigureUsers"));
        assert_eq!(admin.len(), 8);
    }

    #[test]
    fn configured_parents_add_to_builtin() {
        let roles = RoleHierarchy::with_builtin();
        roles.add_role_parents("Operator", ["Auditor"]);
        let operator = roles.parents_of("Operator");
        assert!(operator.contains("Auditor"));
        assert!(operator.contains("Login"));
    }
}
