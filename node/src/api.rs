//! # HTTP API
//!
//! Builds the axum router clients talk to.
//!
//! | Method | Path           | Description                              |
//! |--------|----------------|------------------------------------------|
//! | GET    | `/health`      | Liveness probe                           |
//! | POST   | `/nodes/:name` | JSON-RPC 2.0, signed or forwarded to `name` |
//!
//! Callers authenticate with the `X-API-KEY` header. A missing or unknown
//! key is answered with 401 before the body is read; a node the caller's
//! tenant may not use is indistinguishable from an unknown node (404).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use custos_gateway::auth::UserInfo;
use custos_gateway::error::codes;
use custos_gateway::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use custos_gateway::session::HttpSession;
use custos_gateway::NodeInterceptor;

use crate::config::NodeRoute;
use crate::metrics::{Outcome, SharedMetrics};

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Methods served by the gateway itself, used as metric labels.
const INTERCEPTED_METHODS: [&str; 5] = [
    "eth_accounts",
    "eth_sign",
    "eth_signTransaction",
    "eth_sendTransaction",
    "eea_sendTransaction",
];

/// Shared state of the request handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub interceptor: Arc<NodeInterceptor>,
    pub nodes: Arc<HashMap<String, NodeRoute>>,
    /// API key to caller identity.
    pub users: Arc<HashMap<String, UserInfo>>,
    pub client: reqwest::Client,
    pub metrics: SharedMetrics,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/nodes/:name", post(rpc_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /health`. Does not probe the downstream nodes.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

fn rejection(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn method_label(method: &str) -> (&str, bool) {
    match INTERCEPTED_METHODS.iter().find(|m| **m == method) {
        Some(m) => (m, true),
        None if method.starts_with("personal_") => ("personal", false),
        None => ("proxy", false),
    }
}

/// `POST /nodes/:name`.
async fn rpc_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(user) = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|key| state.users.get(key))
    else {
        return rejection(StatusCode::UNAUTHORIZED, "missing or invalid API key");
    };

    let Some(route) = state
        .nodes
        .get(&name)
        .filter(|route| user.can_access_tenant(&route.allowed_tenants))
    else {
        tracing::debug!(node = %name, tenant = %user.tenant, "unknown node");
        return rejection(StatusCode::NOT_FOUND, "node not found");
    };

    let request = match JsonRpcRequest::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            state.metrics.observe("invalid", false, Outcome::Error, 0.0);
            return Json(JsonRpcResponse::failure(Value::Null, err.into())).into_response();
        }
    };

    let (label, intercepted) = method_label(&request.method);
    let label = label.to_string();
    let session = HttpSession::new(state.client.clone(), Arc::clone(&route.endpoint));
    let started = Instant::now();
    let response = state.interceptor.serve_rpc(user, &session, request).await;

    let outcome = match &response.error {
        None => Outcome::Ok,
        Some(e) if e.code == codes::BLOCKCHAIN_NODE_ERROR => Outcome::NodeError,
        Some(_) => Outcome::Error,
    };
    state
        .metrics
        .observe(&label, intercepted, outcome, started.elapsed().as_secs_f64());

    Json(response).into_response()
}
