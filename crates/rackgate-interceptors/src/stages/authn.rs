use crate::context::{InterceptContext, ProtoRequest, ProtoResponse};
use crate::errors::InterceptError;
use crate::stages::{Stage, StageOutcome};
use async_trait::async_trait;
use rackgate_auth::prelude::{AuthenticatorSet, AuthnInput};

pub const QUERY_TOKEN: &str = "auth_token";
pub const SESSION_HEADER: &str = "X-Auth-Token";

/// Runs the strategy the matched operation names.
///
/// A no-op when authentication is disabled or the operation names none.
pub struct AuthnStage {
    pub authenticators: AuthenticatorSet,
    pub enabled: bool,
}

impl AuthnStage {
    pub fn new(authenticators: AuthenticatorSet, enabled: bool) -> Self {
        Self {
            authenticators,
            enabled,
        }
    }
}

pub fn authn_input(cx: &InterceptContext, req: &dyn ProtoRequest) -> AuthnInput {
    AuthnInput {
        authorization: req.header("Authorization"),
        query_token: cx.query.get(QUERY_TOKEN).filter(|t| !t.is_empty()).cloned(),
        session_token: req.header(SESSION_HEADER),
    }
}

#[async_trait]
impl Stage for AuthnStage {
    async fn handle(
        &self,
        cx: &mut InterceptContext,
        req: &mut dyn ProtoRequest,
        _rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, InterceptError> {
        let strategy = cx
            .route
            .as_ref()
            .and_then(|r| r.descriptor.authentication.clone());
        let Some(strategy) = strategy.filter(|_| self.enabled) else {
            tracing::debug!(operation = ?cx.operation_id(), "authentication skipped");
            return Ok(StageOutcome::Continue);
        };

        let input = authn_input(cx, &*req);
        let caller = self.authenticators.authenticate(&strategy, &input).await?;
        tracing::debug!(
            user = %caller.username,
            strategy = %strategy,
            correlation_id = %cx.correlation_id,
            "caller authenticated"
        );
        cx.caller = Some(caller);
        Ok(StageOutcome::Continue)
    }
}
