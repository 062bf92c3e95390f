use crate::context::{InterceptContext, ProtoRequest, ProtoResponse};
use crate::errors::InterceptError;
use crate::schema::{SchemaSelector, SchemaService};
use crate::stages::{Stage, StageOutcome};
use async_trait::async_trait;
use std::sync::Arc;

const BODY_METHODS: [&str; 3] = ["POST", "PUT", "PATCH"];

/// Decodes the payload and validates it against the selected concrete schema.
pub struct SchemaGuardStage {
    pub service: Arc<dyn SchemaService>,
    pub selector: SchemaSelector,
}

impl SchemaGuardStage {
    pub fn new(service: Arc<dyn SchemaService>, selector: SchemaSelector) -> Self {
        Self { service, selector }
    }
}

#[async_trait]
impl Stage for SchemaGuardStage {
    async fn handle(
        &self,
        cx: &mut InterceptContext,
        req: &mut dyn ProtoRequest,
        _rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, InterceptError> {
        let Some(route) = cx.route.clone() else {
            return Ok(StageOutcome::Continue);
        };
        let method = route.descriptor.method.as_str();
        if !BODY_METHODS.contains(&method) {
            return Ok(StageOutcome::Continue);
        }

        let mut body = req.read_json().await?;
        if let Some(base) = route.descriptor.schema.as_deref() {
            let (schema, outcome) = self
                .selector
                .validate(self.service.as_ref(), base, method, &mut body)
                .await;
            if outcome.missing_schema {
                return Err(InterceptError::missing_schema(&schema));
            }
            if !outcome.valid {
                tracing::debug!(
                    schema = %schema,
                    errors = outcome.errors.len(),
                    correlation_id = %cx.correlation_id,
                    "payload rejected"
                );
                return Err(InterceptError::validation(&schema, outcome.groups));
            }
        }
        cx.body = Some(body);
        Ok(StageOutcome::Continue)
    }
}
