use super::directory::{ResourceDirectory, ENCLOSES};
use super::ScopeStack;
use crate::errors::InterceptError;
use crate::operation::{OperationDescriptor, ScopeHandler};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Derives the scope stack of a request from its tagged parameters.
///
/// Resolution never fails a request: a lookup error or an ambiguous result
/// simply contributes nothing.
#[derive(Clone)]
pub struct ScopeResolver {
    directory: Arc<dyn ResourceDirectory>,
    relation: String,
}

impl ScopeResolver {
    pub fn new(directory: Arc<dyn ResourceDirectory>) -> Self {
        Self {
            directory,
            relation: ENCLOSES.to_string(),
        }
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = relation.into();
        self
    }

    pub async fn resolve(
        &self,
        descriptor: &OperationDescriptor,
        params: &BTreeMap<String, String>,
        query: &BTreeMap<String, String>,
    ) -> ScopeStack {
        let mut stack = ScopeStack::new();
        for (param, handler) in descriptor.scoped_params() {
            let Some(value) = params.get(&param.name).or_else(|| query.get(&param.name)) else {
                continue;
            };
            match self.contribution(handler, value).await {
                Ok(Some(scope)) => {
                    tracing::debug!(param = %param.name, %handler, %scope, "scope resolved");
                    stack.push_front(scope);
                }
                Ok(None) => {
                    tracing::debug!(param = %param.name, %handler, "no scope contribution");
                }
                Err(err) => {
                    tracing::debug!(
                        param = %param.name,
                        %handler,
                        error = %err,
                        "scope lookup failed, falling back"
                    );
                }
            }
        }
        stack
    }

    async fn contribution(
        &self,
        handler: ScopeHandler,
        value: &str,
    ) -> Result<Option<String>, InterceptError> {
        match handler {
            ScopeHandler::DirectResource => self.directory.sku_of(value).await,
            ScopeHandler::ChassisAggregate => {
                let members = self.directory.related(value, &self.relation).await?;
                if members.is_empty() {
                    return Ok(None);
                }
                let mut shared: Option<String> = None;
                for member in &members {
                    let Some(sku) = self.directory.sku_of(member).await? else {
                        return Ok(None);
                    };
                    match &shared {
                        Some(existing) if *existing != sku => return Ok(None),
                        Some(_) => {}
                        None => shared = Some(sku),
                    }
                }
                Ok(shared)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::ParamDescriptor;
    use crate::scope::InMemoryDirectory;

    fn descriptor(handler: ScopeHandler) -> OperationDescriptor {
        let mut op = OperationDescriptor::new("GET", "/api/2.0/things/{id}");
        op.params.push(ParamDescriptor {
            name: "id".into(),
            location: "path".into(),
            scope_handler: Some(handler),
        });
        op
    }

    fn directory() -> Arc<dyn ResourceDirectory> {
        Arc::new(
            InMemoryDirectory::new()
                .with_node("n1", Some("sku-a"))
                .with_node("n2", Some("sku-a"))
                .with_node("n3", Some("sku-b"))
                .with_node("n4", None)
                .with_node("n5", Some("sku-c"))
                .with_node("c-same", None)
                .with_node("c-three", None)
                .with_node("c-tail", None)
                .with_node("c-trio", None)
                .with_node("c-mixed", None)
                .with_node("c-unset", None)
                .with_node("c-empty", None)
                .with_relation("c-same", ENCLOSES, &["n1", "n2"])
                .with_relation("c-mixed", ENCLOSES, &["n1", "n3"])
                .with_relation("c-unset", ENCLOSES, &["n1", "n4"])
                .with_relation("c-three", ENCLOSES, &["n1", "n2", "n1"])
                .with_relation("c-tail", ENCLOSES, &["n1", "n2", "n3"])
                .with_relation("c-trio", ENCLOSES, &["n1", "n3", "n5"]),
        )
    }

    async fn resolve(handler: ScopeHandler, id: &str) -> ScopeStack {
        let resolver = ScopeResolver::new(directory());
        let params = BTreeMap::from([("id".to_string(), id.to_string())]);
        resolver
            .resolve(&descriptor(handler), &params, &BTreeMap::new())
            .await
    }

    #[tokio::test]
    async fn direct_resource_pushes_its_sku() {
        let stack = resolve(ScopeHandler::DirectResource, "n1").await;
        assert_eq!(stack.as_slice(), ["sku-a", "global"]);
        assert!(resolve(ScopeHandler::DirectResource, "n4").await.is_global_only());
        assert!(resolve(ScopeHandler::DirectResource, "missing").await.is_global_only());
    }

    #[tokio::test]
    async fn chassis_needs_one_shared_sku() {
        let stack = resolve(ScopeHandler::ChassisAggregate, "c-same").await;
        assert_eq!(stack.as_slice(), ["sku-a", "global"]);
        let stack = resolve(ScopeHandler::ChassisAggregate, "c-three").await;
        assert_eq!(stack.as_slice(), ["sku-a", "global"]);
        for id in ["c-mixed", "c-unset", "c-empty", "missing"] {
            assert!(
                resolve(ScopeHandler::ChassisAggregate, id).await.is_global_only(),
                "{id}"
            );
        }
    }

    #[tokio::test]
    async fn chassis_with_three_members_rejects_any_mismatch() {
        // Last member differs after two agreeing ones.
        assert!(resolve(ScopeHandler::ChassisAggregate, "c-tail")
            .await
            .is_global_only());
        // Every member on its own SKU.
        assert!(resolve(ScopeHandler::ChassisAggregate, "c-trio")
            .await
            .is_global_only());
    }
}
