//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the mock account rules so route handlers can stay
//! focused on protocol translation and status mapping.

pub mod accounts;
