use crate::context::{InterceptContext, ProtoRequest, ProtoResponse};
use crate::errors::InterceptError;
use crate::operation::OperationTable;
use crate::stages::{Stage, StageOutcome};
use async_trait::async_trait;
use std::sync::Arc;

/// Assigns the correlation id and matches the request to its operation.
pub struct ContextInitStage {
    pub table: Arc<OperationTable>,
}

impl ContextInitStage {
    pub fn new(table: Arc<OperationTable>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl Stage for ContextInitStage {
    async fn handle(
        &self,
        cx: &mut InterceptContext,
        req: &mut dyn ProtoRequest,
        _rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, InterceptError> {
        cx.correlation_id = req
            .header("X-Request-Id")
            .or_else(|| req.header("X-Correlation-Id"))
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        cx.query = req.query();

        let Some(route) = self.table.resolve(req.method(), req.path()) else {
            return Err(InterceptError::not_found(&format!(
                "No operation for {} {}",
                req.method(),
                req.path()
            )));
        };
        tracing::debug!(
            operation = %route.descriptor.operation_id,
            method = req.method(),
            path = req.path(),
            correlation_id = %cx.correlation_id,
            "operation matched"
        );
        cx.route = Some(route);
        Ok(StageOutcome::Continue)
    }
}
