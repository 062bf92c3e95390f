use crate::context::{InterceptContext, ProtoRequest, ProtoResponse};
use crate::errors::InterceptError;
use crate::render::{RenderedResponse, ResponseRenderer};
use crate::stages::error_norm::ErrorNormalizer;
use crate::stages::resilience::run_with_timeout;
use async_trait::async_trait;
use rackgate_auth::model::Caller;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::time::Duration;

pub mod authn;
pub mod authz;
pub mod context_init;
pub mod error_norm;
pub mod resilience;
pub mod response_stamp;
pub mod schema_guard;
pub mod scope;

#[async_trait]
pub trait Stage: Send + Sync {
    async fn handle(
        &self,
        cx: &mut InterceptContext,
        req: &mut dyn ProtoRequest,
        rsp: &mut dyn ProtoResponse,
    ) -> Result<StageOutcome, InterceptError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    Continue,
    /// The stage already wrote the response.
    ShortCircuit,
}

/// Everything the business handler may read about the request.
#[derive(Clone, Debug)]
pub struct HandlerCall {
    pub operation_id: String,
    pub method: String,
    pub params: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub caller: Option<Caller>,
    pub roles: BTreeSet<String>,
    pub scope: crate::scope::ScopeStack,
    pub correlation_id: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HandlerOutput {
    pub body: Value,
    /// Overrides the operation's declared success status.
    pub status: Option<u16>,
}

impl HandlerOutput {
    pub fn json(body: Value) -> Self {
        Self { body, status: None }
    }

    pub fn empty() -> Self {
        Self::json(Value::Null)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

pub struct InterceptorChain {
    stages: Vec<Box<dyn Stage>>,
    renderer: ResponseRenderer,
    normalizer: ErrorNormalizer,
    handler_timeout: Duration,
}

impl InterceptorChain {
    pub fn new(
        stages: Vec<Box<dyn Stage>>,
        renderer: ResponseRenderer,
        normalizer: ErrorNormalizer,
    ) -> Self {
        Self {
            stages,
            renderer,
            normalizer,
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
        }
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// Runs every stage, the handler and the renderer in order. Any failure
    /// goes to the error normalizer; the response is always written.
    /// Returns the status sent, or `None` when a stage answered on its own.
    pub async fn run_with_handler<F, Fut>(
        &self,
        mut cx: InterceptContext,
        req: &mut dyn ProtoRequest,
        rsp: &mut dyn ProtoResponse,
        handler: F,
    ) -> Option<u16>
    where
        F: FnOnce(HandlerCall) -> Fut + Send,
        Fut: Future<Output = Result<HandlerOutput, InterceptError>> + Send,
    {
        let outcome = self.drive(&mut cx, req, rsp, handler).await;
        response_stamp::stamp(&cx, rsp);
        match outcome {
            Ok(Some(rendered)) => {
                rsp.set_status(rendered.status);
                if let Some(body) = &rendered.body {
                    if let Err(err) = rsp.write_json(body).await {
                        tracing::error!(
                            correlation_id = %cx.correlation_id,
                            error = %err,
                            "failed to write response"
                        );
                    }
                }
                Some(rendered.status)
            }
            Ok(None) => None,
            Err(err) => Some(self.normalizer.normalize(&cx, err, rsp).await),
        }
    }

    async fn drive<F, Fut>(
        &self,
        cx: &mut InterceptContext,
        req: &mut dyn ProtoRequest,
        rsp: &mut dyn ProtoResponse,
        handler: F,
    ) -> Result<Option<RenderedResponse>, InterceptError>
    where
        F: FnOnce(HandlerCall) -> Fut + Send,
        Fut: Future<Output = Result<HandlerOutput, InterceptError>> + Send,
    {
        for stage in &self.stages {
            match stage.handle(cx, req, rsp).await? {
                StageOutcome::Continue => {}
                StageOutcome::ShortCircuit => return Ok(None),
            }
        }

        let route = cx
            .route
            .clone()
            .ok_or_else(|| InterceptError::internal("no operation resolved for request"))?;
        let descriptor = route.descriptor;
        let call = HandlerCall {
            operation_id: descriptor.operation_id.clone(),
            method: descriptor.method.clone(),
            params: route.params,
            query: cx.query.clone(),
            body: cx.body.clone(),
            caller: cx.caller.clone(),
            roles: cx.roles.clone(),
            scope: cx.scope.clone(),
            correlation_id: cx.correlation_id.clone(),
        };
        let output = run_with_timeout(
            &descriptor.operation_id,
            self.handler_timeout,
            handler(call),
        )
        .await?;

        let rendered = self
            .renderer
            .render(&descriptor, &cx.scope, output.body, output.status)
            .await?;
        tracing::debug!(
            operation = %descriptor.operation_id,
            status = rendered.status,
            correlation_id = %cx.correlation_id,
            "request handled"
        );
        Ok(Some(rendered))
    }
}
