use crate::errors::InterceptError;
use crate::operation::OperationDescriptor;
use crate::schema::SchemaService;
use crate::scope::ScopeStack;
use serde_json::Value;
use std::sync::Arc;

/// Template used for every error envelope.
pub const ERROR_TEMPLATE: &str = "error.2.0";

/// Status plus body; `None` means no body is written.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedResponse {
    pub status: u16,
    pub body: Option<Value>,
}

/// `null`, `{}`, `[]` and `""` count as empty.
pub fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Explicit handler status, else the declared success status, else 200.
/// An empty body on a 204-flagged operation is always 204.
pub fn status_for(descriptor: &OperationDescriptor, body: &Value, explicit: Option<u16>) -> u16 {
    if descriptor.send_204_on_empty && is_empty_body(body) {
        return 204;
    }
    explicit.or(descriptor.success_status).unwrap_or(200)
}

#[derive(Clone)]
pub struct ResponseRenderer {
    service: Arc<dyn SchemaService>,
}

impl ResponseRenderer {
    pub fn new(service: Arc<dyn SchemaService>) -> Self {
        Self { service }
    }

    pub async fn render(
        &self,
        descriptor: &OperationDescriptor,
        scope: &ScopeStack,
        body: Value,
        explicit: Option<u16>,
    ) -> Result<RenderedResponse, InterceptError> {
        let status = status_for(descriptor, &body, explicit);
        if status == 204 {
            return Ok(RenderedResponse { status, body: None });
        }
        let body = match descriptor.template.as_deref() {
            Some(template) => self.service.render(template, scope, &body).await?,
            None => body,
        };
        Ok(RenderedResponse {
            status,
            body: Some(body),
        })
    }

    /// Renders an error envelope through [`ERROR_TEMPLATE`]; the raw envelope
    /// is returned when the template is unavailable.
    pub async fn render_error(&self, scope: &ScopeStack, envelope: Value) -> Value {
        match self.service.render(ERROR_TEMPLATE, scope, &envelope).await {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::trace!(error = %err, "error template unavailable, sending raw envelope");
                envelope
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{JsonSchemaRegistry, ScopedTemplateStore, StaticSchemaService};
    use crate::scope::GLOBAL_SCOPE;
    use serde_json::json;

    fn renderer() -> ResponseRenderer {
        let mut templates = ScopedTemplateStore::new();
        templates.insert(GLOBAL_SCOPE, "node.2.0", json!({"id": "{{id}}", "kind": "node"}));
        templates.insert("sku-a", "node.2.0", json!({"id": "{{id}}", "kind": "sku-a node"}));
        ResponseRenderer::new(Arc::new(StaticSchemaService::new(
            JsonSchemaRegistry::new(),
            templates,
        )))
    }

    fn op(success: Option<u16>, send_204: bool) -> OperationDescriptor {
        let mut op = OperationDescriptor::new("POST", "/api/2.0/things");
        op.success_status = success;
        op.send_204_on_empty = send_204;
        op
    }

    #[test]
    fn status_priority() {
        assert_eq!(status_for(&op(None, false), &json!({"a": 1}), None), 200);
        assert_eq!(status_for(&op(Some(201), false), &json!({"a": 1}), None), 201);
        assert_eq!(status_for(&op(Some(201), false), &json!({"a": 1}), Some(202)), 202);
        // declared 201 without the 204 flag keeps 201 for an empty body
        assert_eq!(status_for(&op(Some(201), false), &json!({}), None), 201);
        assert_eq!(status_for(&op(Some(200), true), &json!([]), None), 204);
        assert_eq!(status_for(&op(Some(200), true), &json!(""), Some(200)), 204);
        assert_eq!(status_for(&op(Some(200), true), &json!(0), None), 200);
    }

    #[tokio::test]
    async fn templates_follow_scope_and_pass_through_without_one() {
        let renderer = renderer();
        let mut with_template = OperationDescriptor::new("GET", "/api/2.0/nodes/{id}");
        with_template.template = Some("node.2.0".into());

        let mut scope = ScopeStack::new();
        let out = renderer
            .render(&with_template, &scope, json!({"id": "n1", "extra": true}), None)
            .await
            .unwrap();
        assert_eq!(out.body, Some(json!({"id": "n1", "kind": "node"})));

        scope.push_front("sku-a");
        let out = renderer
            .render(&with_template, &scope, json!({"id": "n1"}), None)
            .await
            .unwrap();
        assert_eq!(out.body.unwrap()["kind"], "sku-a node");

        let raw = renderer
            .render(&op(None, false), &scope, json!({"x": 1}), None)
            .await
            .unwrap();
        assert_eq!(raw, RenderedResponse { status: 200, body: Some(json!({"x": 1})) });
    }

    #[tokio::test]
    async fn missing_template_is_an_error_and_error_template_falls_back() {
        let renderer = renderer();
        let mut op = OperationDescriptor::new("GET", "/api/2.0/x");
        op.template = Some("absent".into());
        let err = renderer
            .render(&op, &ScopeStack::new(), json!({"a": 1}), None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), 500);

        let envelope = json!({"message": "Bad Request", "status": 400, "correlationId": "c"});
        assert_eq!(
            renderer.render_error(&ScopeStack::new(), envelope.clone()).await,
            envelope
        );
    }
}
