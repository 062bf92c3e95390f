use crate::errors::InterceptError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Relation from a chassis to the nodes it holds.
pub const ENCLOSES: &str = "encloses";

/// Read access to the resource graph owned by the backend store.
#[async_trait]
pub trait ResourceDirectory: Send + Sync {
    /// Override key (sku) of a node. Errors when the node does not exist.
    async fn sku_of(&self, node_id: &str) -> Result<Option<String>, InterceptError>;
    /// Targets of `relation` from `node_id`.
    async fn related(&self, node_id: &str, relation: &str) -> Result<Vec<String>, InterceptError>;
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryDirectory {
    nodes: HashMap<String, Option<String>>,
    relations: HashMap<(String, String), Vec<String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, id: &str, sku: Option<&str>) -> Self {
        self.nodes.insert(id.to_string(), sku.map(str::to_string));
        self
    }

    pub fn with_relation(mut self, from: &str, relation: &str, targets: &[&str]) -> Self {
        self.relations.insert(
            (from.to_string(), relation.to_string()),
            targets.iter().map(|t| t.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl ResourceDirectory for InMemoryDirectory {
    async fn sku_of(&self, node_id: &str) -> Result<Option<String>, InterceptError> {
        self.nodes
            .get(node_id)
            .cloned()
            .ok_or_else(|| InterceptError::not_found(&format!("Node {node_id} not found")))
    }

    async fn related(&self, node_id: &str, relation: &str) -> Result<Vec<String>, InterceptError> {
        if !self.nodes.contains_key(node_id) {
            return Err(InterceptError::not_found(&format!("Node {node_id} not found")));
        }
        Ok(self
            .relations
            .get(&(node_id.to_string(), relation.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
