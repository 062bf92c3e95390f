use crate::context::{InterceptContext, ProtoRequest, ProtoResponse};
use crate::errors::InterceptError;
use crate::stages::{Stage, StageOutcome};
use async_trait::async_trait;
use rackgate_auth::prelude::{authorize, AuthorizationService};
use std::sync::Arc;

/// Checks the caller against the policy store and records the expanded roles.
///
/// Without an identity the request passes through unchecked; the decision is
/// left to the handler.
pub struct AuthzStage {
    pub service: Arc<dyn AuthorizationService>,
}

impl AuthzStage {
    pub fn new(service: Arc<dyn AuthorizationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Stage for AuthzStage {
    async fn handle(
        &self,
        cx: &mut InterceptContext,
        _req: &mut dyn ProtoRequest,
        _rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, InterceptError> {
        let (Some(caller), Some(route)) = (cx.caller.as_ref(), cx.route.as_ref()) else {
            tracing::debug!(operation = ?cx.operation_id(), "no caller identity, authorization deferred");
            return Ok(StageOutcome::Continue);
        };
        let descriptor = &route.descriptor;
        let roles = authorize(
            self.service.as_ref(),
            caller,
            &descriptor.path,
            &descriptor.method,
        )
        .await?;
        cx.roles = roles;
        Ok(StageOutcome::Continue)
    }
}
