use crate::context::{InterceptContext, ProtoResponse};
use crate::errors::InterceptError;
use crate::render::ResponseRenderer;
use crate::stages::StageOutcome;
use rackgate_errors::prelude::ErrorEnvelope;

/// Single point where failures become wire responses.
///
/// Terminal for every error: the envelope is always written, never re-raised.
pub struct ErrorNormalizer {
    renderer: ResponseRenderer,
    include_stack: bool,
}

impl ErrorNormalizer {
    pub fn new(renderer: ResponseRenderer, include_stack: bool) -> Self {
        Self {
            renderer,
            include_stack,
        }
    }

    /// Stack traces are disclosed only at `debug` or finer.
    pub fn for_log_level(renderer: ResponseRenderer, level: &str) -> Self {
        let verbose = matches!(level.trim().to_ascii_lowercase().as_str(), "debug" | "trace");
        Self::new(renderer, verbose)
    }

    pub fn includes_stack(&self) -> bool {
        self.include_stack
    }

    pub fn envelope(&self, cx: &InterceptContext, err: &InterceptError) -> ErrorEnvelope {
        let obj = err.inner().clone().with_correlation(cx.correlation_id.clone());
        obj.to_envelope(self.include_stack)
    }

    /// Passes non-error outcomes through; writes an envelope for errors.
    pub async fn intercept(
        &self,
        cx: &InterceptContext,
        result: Result<StageOutcome, InterceptError>,
        rsp: &mut dyn ProtoResponse,
    ) -> StageOutcome {
        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                self.normalize(cx, err, rsp).await;
                StageOutcome::ShortCircuit
            }
        }
    }

    /// Writes the error envelope and returns the status sent.
    pub async fn normalize(
        &self,
        cx: &InterceptContext,
        err: InterceptError,
        rsp: &mut dyn ProtoResponse,
    ) -> u16 {
        let envelope = self.envelope(cx, &err);
        let status = envelope.status;
        let obj = err.inner();
        if status >= 500 {
            tracing::error!(
                code = %obj.code,
                status,
                operation = ?cx.operation_id(),
                correlation_id = %cx.correlation_id,
                detail = obj.message_dev.as_deref().unwrap_or(""),
                "request failed"
            );
        } else {
            tracing::warn!(
                code = %obj.code,
                status,
                operation = ?cx.operation_id(),
                correlation_id = %cx.correlation_id,
                "request rejected"
            );
        }

        let raw = match serde_json::to_value(&envelope) {
            Ok(value) => value,
            Err(e) => serde_json::json!({
                "message": envelope.message,
                "status": status,
                "correlationId": envelope.correlation_id,
                "errors": [e.to_string()],
            }),
        };
        let body = self.renderer.render_error(&cx.scope, raw).await;
        rsp.set_status(status);
        if let Err(write_err) = rsp.write_json(&body).await {
            tracing::error!(
                correlation_id = %cx.correlation_id,
                error = %write_err,
                "failed to write error envelope"
            );
        }
        status
    }
}
