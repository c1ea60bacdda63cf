//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is built once in `main` and injected into Axum handlers via
//! the `State` extractor. It holds the fixed decoration task tree and the
//! mock account list. Nothing is persisted: a restart reseeds both.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

// =============================================================================
// NODE RECORD
// =============================================================================

/// One decoration task in the planning tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: i64,
    pub node_id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub sort_order: i32,
}

fn node(id: i64, name: &str, parent_id: Option<i64>, sort_order: i32) -> NodeRecord {
    NodeRecord { id, node_id: id, name: name.to_owned(), parent_id, sort_order }
}

/// The fixed task tree: preparation with four trade stages beneath it.
#[must_use]
pub fn seed_nodes() -> Vec<NodeRecord> {
    vec![
        node(1, "装修准备", None, 0),
        node(2, "水电改造", Some(1), 1),
        node(3, "木工工程", Some(1), 2),
        node(4, "瓦工工程", Some(1), 3),
        node(5, "油漆工程", Some(1), 4),
    ]
}

// =============================================================================
// MOCK USER
// =============================================================================

/// Account in the mock user list. The password is kept and compared as
/// plain text; this service is a stand-in, not an auth backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockUser {
    pub id: i64,
    pub username: String,
    pub password: String,
}

/// Accounts present at startup.
#[must_use]
pub fn seed_users() -> Vec<MockUser> {
    vec![MockUser { id: 1, username: "demo".into(), password: "demo".into() }]
}

// =============================================================================
// APP STATE
// =============================================================================

/// Clone is required by Axum; inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub nodes: Arc<[NodeRecord]>,
    pub users: Arc<RwLock<Vec<MockUser>>>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(seed_nodes(), seed_users())
    }

    #[must_use]
    pub fn with_seed(mut nodes: Vec<NodeRecord>, users: Vec<MockUser>) -> Self {
        nodes.sort_by_key(|n| n.sort_order);
        Self { nodes: nodes.into(), users: Arc::new(RwLock::new(users)) }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
