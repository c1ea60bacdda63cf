//! Decoration task tree route.

use axum::extract::State;
use axum::response::Json;

use crate::state::{AppState, NodeRecord};

#[cfg(test)]
#[path = "nodes_test.rs"]
mod tests;

/// `GET /api/nodes` — every node, ordered by `sort_order`.
pub async fn list_nodes(State(state): State<AppState>) -> Json<Vec<NodeRecord>> {
    Json(state.nodes.to_vec())
}
