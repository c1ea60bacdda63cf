//! Networking for the mock decoration API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` issues REST calls with environment-driven base URL selection and
//! `types` defines the wire schema shared with the server.

pub mod api;
pub mod types;
