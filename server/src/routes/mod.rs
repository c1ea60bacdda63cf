//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the mock API endpoints under a single Axum router. The
//! client either reaches it through a same-origin `/api` proxy or directly by
//! absolute origin, so CORS stays permissive.
//!
//! ERROR HANDLING
//! ==============
//! Every failure body is `{"error": "..."}`. Unknown paths and wrong methods
//! on known paths both answer 404.

pub mod auth;
pub mod nodes;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

const API_NAME: &str = "Decoration Mind Map";
const ROUTE_NOT_FOUND: &str = "路由不存在";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

/// Full mock API router with CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        .route("/api/", get(info))
        .route("/api/nodes", get(nodes::list_nodes))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /api/` — service name.
async fn info() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "name": API_NAME }))
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, ROUTE_NOT_FOUND)
}
