use crate::context::{parse_query, InterceptContext, ProtoRequest, ProtoResponse};
use crate::errors::InterceptError;
use crate::stages::{HandlerCall, HandlerOutput, InterceptorChain};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use std::collections::BTreeMap;
use std::future::Future;
use std::str::FromStr;

/// Largest request payload accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 1_048_576;

pub struct AxumReq<'a> {
    pub req: &'a mut Request<Body>,
    pub cached_json: Option<serde_json::Value>,
}

pub struct AxumRes {
    pub headers: http::HeaderMap,
    pub status: StatusCode,
    pub body: Option<serde_json::Value>,
}

impl Default for AxumRes {
    fn default() -> Self {
        Self {
            headers: http::HeaderMap::new(),
            status: StatusCode::OK,
            body: None,
        }
    }
}

#[async_trait]
impl ProtoRequest for AxumReq<'_> {
    fn method(&self) -> &str {
        self.req.method().as_str()
    }

    fn path(&self) -> &str {
        self.req.uri().path()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.req
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    }

    fn query(&self) -> BTreeMap<String, String> {
        parse_query(self.req.uri().query())
    }

    async fn read_json(&mut self) -> Result<serde_json::Value, InterceptError> {
        if let Some(value) = self.cached_json.clone() {
            return Ok(value);
        }

        let body = std::mem::take(self.req.body_mut());
        let bytes = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| InterceptError::bad_request(&format!("read body: {e}")))?;
        let value = if bytes.is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| InterceptError::bad_request(&format!("json parse: {e}")))?
        };
        *self.req.body_mut() = Body::from(bytes);
        self.cached_json = Some(value.clone());
        Ok(value)
    }
}

#[async_trait]
impl ProtoResponse for AxumRes {
    fn set_status(&mut self, code: u16) {
        self.status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    }

    fn insert_header(&mut self, name: &str, value: &str) {
        if let (Ok(header_name), Ok(header_value)) =
            (HeaderName::from_str(name), HeaderValue::from_str(value))
        {
            self.headers.insert(header_name, header_value);
        }
    }

    async fn write_json(&mut self, body: &serde_json::Value) -> Result<(), InterceptError> {
        self.body = Some(body.clone());
        Ok(())
    }
}

impl AxumRes {
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        if let Some(body) = self.body {
            let bytes = serde_json::to_vec(&body).unwrap_or_default();
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            *response.body_mut() = Body::from(bytes);
        }
        response
    }
}

/// Drives one axum request through the chain and the business handler.
pub async fn handle_with_chain<F, Fut>(
    mut req: Request<Body>,
    chain: &InterceptorChain,
    handler: F,
) -> Response
where
    F: FnOnce(HandlerCall) -> Fut + Send,
    Fut: Future<Output = Result<HandlerOutput, InterceptError>> + Send,
{
    let mut preq = AxumReq {
        req: &mut req,
        cached_json: None,
    };
    let mut pres = AxumRes::default();
    chain
        .run_with_handler(InterceptContext::default(), &mut preq, &mut pres, handler)
        .await;
    pres.into_response()
}
