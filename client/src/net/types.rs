//! Wire DTOs for the mock decoration API.
//!
//! These mirror the server's JSON payloads field for field.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// `GET /api/` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiInfo {
    pub name: String,
}

/// One decoration task in the planning tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: i64,
    pub node_id: i64,
    pub name: String,
    /// `None` for the root task.
    pub parent_id: Option<i64>,
    pub sort_order: i32,
}

/// Username/password body for the mock auth endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// `POST /api/auth/register` success body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registered {
    pub id: i64,
}

/// `POST /api/auth/login` success body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginToken {
    pub token: String,
}

/// Error body returned by every failing mock API route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Children of `parent` (or the roots when `None`), ordered by `sort_order`.
#[must_use]
pub fn children_of(nodes: &[NodeRecord], parent: Option<i64>) -> Vec<&NodeRecord> {
    let mut children = nodes
        .iter()
        .filter(|n| n.parent_id == parent)
        .collect::<Vec<_>>();
    children.sort_by_key(|n| n.sort_order);
    children
}
