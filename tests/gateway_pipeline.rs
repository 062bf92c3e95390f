use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::FutureExt;
use rackgate::config::GatewayConfig;
use rackgate::handlers::{handler_fn, HandlerRegistry};
use rackgate::server::{build_router, AppState};
use rackgate_auth::prelude::{hash_password, LocalUser};
use rackgate_interceptors::prelude::{HandlerOutput, InMemoryDirectory, OperationTable};
use serde_json::{json, Value};
use serial_test::serial;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn user(name: &str, password: &str, roles: &[&str]) -> LocalUser {
    let salt = format!("{name}-salt");
    LocalUser {
        username: name.into(),
        password_hash: hash_password(&salt, password),
        salt,
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

fn basic(name: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{name}:{password}")))
}

fn api_spec() -> Value {
    json!({
        "basePath": "/api/2.0",
        "paths": {
            "/obms": {
                "put": {
                    "operationId": "obmsPut",
                    "requiresAuthentication": "basic",
                    "authorizedRoles": ["Administrator"],
                    "responseSchema": "obm",
                    "successStatus": 201
                }
            },
            "/nodes": {
                "get": {"operationId": "nodesGetAll", "requiresAuthentication": "basic"}
            },
            "/nodes/{identifier}": {
                "delete": {
                    "operationId": "nodesDelById",
                    "x-authentication-type": "basic",
                    "x-send-204": true
                }
            }
        }
    })
}

struct Gateway {
    router: Router,
    _schemas: TempDir,
}

fn gateway() -> Gateway {
    gateway_with_log_level(None)
}

fn gateway_with_log_level(log_level: Option<&str>) -> Gateway {
    let schemas = tempfile::tempdir().unwrap();
    std::fs::write(
        schemas.path().join("obm.json"),
        r#"{"type": "object", "required": ["service", "config"]}"#,
    )
    .unwrap();

    let mut config = GatewayConfig::default();
    config.auth.users = vec![
        user("admin", "secret", &["Administrator"]),
        user("oper", "secret", &["Operator"]),
    ];
    config.auth.token_secret = Some("pipeline-test".into());
    config.schemas.dir = Some(schemas.path().to_path_buf());
    config.apply_log_level(log_level);

    let handlers = HandlerRegistry::new();
    handlers.register(
        "obmsPut",
        handler_fn(|call| {
            async move { Ok(HandlerOutput::json(call.body.unwrap_or(Value::Null))) }.boxed()
        }),
    );
    handlers.register(
        "nodesDelById",
        handler_fn(|_| async { Ok(HandlerOutput::empty()) }.boxed()),
    );

    let table = OperationTable::from_value(api_spec()).unwrap();
    let state = AppState::build(&config, table, handlers, Arc::new(InMemoryDirectory::new())).unwrap();
    Gateway {
        router: build_router(state),
        _schemas: schemas,
    }
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

fn put_obm(auth: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/api/2.0/obms")
        .header("Authorization", auth)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ready() {
    let gw = gateway();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _, body) = send(&gw.router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], json!(true));
    assert_eq!(body["operations"], json!(3));
    assert_eq!(body["handlers"], json!(2));
}

#[tokio::test]
async fn operator_cannot_put_admin_only_operation() {
    let gw = gateway();
    let payload = json!({"service": "ipmi-obm-service", "config": {}});
    let (status, _, body) = send(&gw.router, put_obm(&basic("oper", "secret"), payload)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], json!(403));
    assert!(body["correlationId"].as_str().is_some());
}

#[tokio::test]
async fn administrator_put_reaches_handler() {
    let gw = gateway();
    let payload = json!({"service": "ipmi-obm-service", "config": {"host": "10.0.0.1"}});
    let (status, _, body) = send(&gw.router, put_obm(&basic("admin", "secret"), payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, payload);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let gw = gateway();
    let payload = json!({"service": "ipmi-obm-service", "config": {}});
    let (status, _, _) = send(&gw.router, put_obm(&basic("admin", "nope"), payload)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_payload_is_bad_request() {
    let gw = gateway();
    let (status, _, body) = send(
        &gw.router,
        put_obm(&basic("admin", "secret"), json!({"service": "ipmi-obm-service"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!(400));
}

#[tokio::test]
async fn unregistered_operation_is_not_implemented() {
    let gw = gateway();
    let req = Request::builder()
        .uri("/api/2.0/nodes")
        .header("Authorization", basic("oper", "secret"))
        .header("X-Request-Id", "req-42")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&gw.router, req).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(headers.get("X-Request-Id").unwrap(), "req-42");
    assert_eq!(body["correlationId"], json!("req-42"));
}

#[tokio::test]
async fn empty_delete_result_is_no_content() {
    let gw = gateway();
    let req = Request::builder()
        .method("DELETE")
        .uri("/api/2.0/nodes/n1")
        .header("Authorization", basic("oper", "secret"))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&gw.router, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let gw = gateway();
    let req = Request::builder()
        .uri("/api/2.0/racks")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&gw.router, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(headers.contains_key("X-Request-Id"));
    assert_eq!(body["status"], json!(404));
    assert!(body.get("stack").is_none());
}

#[tokio::test]
async fn log_level_override_discloses_stack() {
    let gw = gateway_with_log_level(Some("debug"));
    let req = Request::builder()
        .uri("/api/2.0/racks")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&gw.router, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let stack = body["stack"].as_array().expect("stack lines");
    assert!(!stack.is_empty());
}

#[tokio::test]
#[serial]
async fn layered_config_applies_env_and_overrides() {
    let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    std::fs::write(
        file.path(),
        "server:\n  bind: 127.0.0.1:9000\nlogging:\n  level: warn\nhandler:\n  timeout_ms: 500\n",
    )
    .unwrap();
    std::env::set_var("RACKGATE__LOGGING__LEVEL", "debug");
    let result = rackgate::config::load(Some(file.path()), &["auth.enabled=false".to_string()]).await;
    std::env::remove_var("RACKGATE__LOGGING__LEVEL");

    let (config, _) = result.unwrap();
    assert_eq!(config.server.bind, "127.0.0.1:9000");
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.handler.timeout_ms, 500);
    assert!(!config.auth.enabled);
    assert_eq!(config.server.base_path, "/api/2.0");
}

#[tokio::test]
#[serial]
async fn shipped_configuration_assembles() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let (mut config, _) = rackgate::config::load(Some(&root.join("config/rackgate.yaml")), &[])
        .await
        .unwrap();
    config.schemas.dir = Some(root.join("config/schemas"));
    config.templates.dir = Some(root.join("config/templates"));

    let table = rackgate::policy::load_operation_table(
        &root.join("config/api-spec.json"),
        &config.server.base_path,
    )
    .await
    .unwrap();
    let summary = rackgate::policy::summarize(&table);
    assert_eq!(summary.operations, 8);
    assert!(summary
        .entries
        .iter()
        .any(|e| e.operation_id == "chassisGetById"
            && e.authentication.as_deref() == Some("basic")
            && e.scope_params == vec!["identifier:chassis-aggregate".to_string()]));

    let state = AppState::build(
        &config,
        table,
        HandlerRegistry::new(),
        Arc::new(InMemoryDirectory::new()),
    )
    .unwrap();
    assert!(state.health.is_ready());
}
