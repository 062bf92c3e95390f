//! Narrowest-first template/schema scopes.

mod directory;
mod resolver;

pub use directory::{InMemoryDirectory, ResourceDirectory, ENCLOSES};
pub use resolver::ScopeResolver;

use std::fmt;

pub const GLOBAL_SCOPE: &str = "global";

/// Scope identifiers, most specific first. The last entry is always the global scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeStack {
    entries: Vec<String>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self {
            entries: vec![GLOBAL_SCOPE.to_string()],
        }
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_front(&mut self, scope: impl Into<String>) {
        let scope = scope.into();
        if !scope.is_empty() {
            self.entries.insert(0, scope);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_global_only(&self) -> bool {
        self.entries.len() == 1
    }
}

impl fmt::Display for ScopeStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.entries.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_stays_last() {
        let mut stack = ScopeStack::new();
        assert!(stack.is_global_only());
        stack.push_front("sku-a");
        stack.push_front("");
        stack.push_front("sku-b");
        assert_eq!(stack.as_slice(), ["sku-b", "sku-a", "global"]);
        assert_eq!(stack.to_string(), "sku-b,sku-a,global");
    }
}
