use crate::context::{InterceptContext, ProtoResponse};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";
pub const TEMPLATE_SCOPE_HEADER: &str = "X-Template-Scope";

/// Headers carried by every response, success or failure.
pub fn stamp(cx: &InterceptContext, rsp: &mut dyn ProtoResponse) {
    if !cx.correlation_id.is_empty() {
        rsp.insert_header(REQUEST_ID_HEADER, &cx.correlation_id);
    }
    if !cx.scope.is_global_only() {
        rsp.insert_header(TEMPLATE_SCOPE_HEADER, &cx.scope.to_string());
    }
}
