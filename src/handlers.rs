//! Business handlers keyed by `operationId`.
//!
//! Endpoint logic lives outside the gateway; the registry only maps an
//! operation to whatever serves it. Unmapped operations answer 501.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::BoxFuture;
use rackgate_interceptors::prelude::{HandlerCall, HandlerOutput, InterceptError};
use std::sync::Arc;

#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn handle(&self, call: HandlerCall) -> Result<HandlerOutput, InterceptError>;
}

pub type HandlerFuture = BoxFuture<'static, Result<HandlerOutput, InterceptError>>;

struct FnHandler<F>(F);

#[async_trait]
impl<F> OperationHandler for FnHandler<F>
where
    F: Fn(HandlerCall) -> HandlerFuture + Send + Sync,
{
    async fn handle(&self, call: HandlerCall) -> Result<HandlerOutput, InterceptError> {
        (self.0)(call).await
    }
}

/// Wraps a closure returning a boxed future.
pub fn handler_fn<F>(f: F) -> Arc<dyn OperationHandler>
where
    F: Fn(HandlerCall) -> HandlerFuture + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<DashMap<String, Arc<dyn OperationHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any handler already registered for `operation_id`.
    pub fn register(&self, operation_id: &str, handler: Arc<dyn OperationHandler>) {
        if self
            .handlers
            .insert(operation_id.to_string(), handler)
            .is_some()
        {
            tracing::debug!(operation = operation_id, "handler replaced");
        }
    }

    pub fn contains(&self, operation_id: &str) -> bool {
        self.handlers.contains_key(operation_id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub async fn dispatch(&self, call: HandlerCall) -> Result<HandlerOutput, InterceptError> {
        let handler = self
            .handlers
            .get(&call.operation_id)
            .map(|entry| entry.value().clone());
        match handler {
            Some(handler) => handler.handle(call).await,
            None => Err(InterceptError::not_implemented(&call.operation_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use rackgate_interceptors::prelude::ScopeStack;
    use serde_json::json;

    fn call(operation_id: &str) -> HandlerCall {
        HandlerCall {
            operation_id: operation_id.into(),
            method: "GET".into(),
            params: Default::default(),
            query: Default::default(),
            body: None,
            caller: None,
            roles: Default::default(),
            scope: ScopeStack::new(),
            correlation_id: "c".into(),
        }
    }

    #[tokio::test]
    async fn unregistered_operation_is_501() {
        let registry = HandlerRegistry::new();
        let err = registry.dispatch(call("nodesGetAll")).await.unwrap_err();
        assert_eq!(err.status(), 501);
    }

    #[tokio::test]
    async fn registered_closure_runs() {
        let registry = HandlerRegistry::new();
        registry.register(
            "nodesGetAll",
            handler_fn(|call| {
                async move { Ok(HandlerOutput::json(json!([call.operation_id]))) }.boxed()
            }),
        );
        assert!(registry.contains("nodesGetAll"));
        let out = registry.dispatch(call("nodesGetAll")).await.unwrap();
        assert_eq!(out.body, json!(["nodesGetAll"]));
    }
}
