use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rackgate_interceptors::adapters::http::handle_with_chain;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::state::AppState;

/// `/health` plus a fallback that sends everything else through the pipeline.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.health.is_ready();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = json!({
        "status": if ready { "ok" } else { "unavailable" },
        "live": state.health.is_live(),
        "ready": ready,
        "last_error": state.health.last_error(),
        "operations": state.table.len(),
        "handlers": state.handlers.len(),
        "instance_id": state.instance_id.to_string(),
        "started_at": state.started_at.to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    });
    (status, Json(body))
}

async fn dispatch(State(state): State<AppState>, req: Request<Body>) -> Response {
    let handlers = state.handlers.clone();
    handle_with_chain(req, &state.chain, move |call| async move {
        handlers.dispatch(call).await
    })
    .await
}
