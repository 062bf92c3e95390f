use crate::context::{InterceptContext, ProtoRequest, ProtoResponse};
use crate::errors::InterceptError;
use crate::scope::ScopeResolver;
use crate::stages::{Stage, StageOutcome};
use async_trait::async_trait;

pub struct ScopeStage {
    pub resolver: ScopeResolver,
}

impl ScopeStage {
    pub fn new(resolver: ScopeResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Stage for ScopeStage {
    async fn handle(
        &self,
        cx: &mut InterceptContext,
        _req: &mut dyn ProtoRequest,
        _rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, InterceptError> {
        if let Some(route) = cx.route.as_ref() {
            cx.scope = self
                .resolver
                .resolve(&route.descriptor, &route.params, &cx.query)
                .await;
        }
        Ok(StageOutcome::Continue)
    }
}
