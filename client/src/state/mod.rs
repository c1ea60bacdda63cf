//! Client-side state.
//!
//! SYSTEM CONTEXT
//! ==============
//! `auth` defines the entitlement snapshot and how it is derived from a user,
//! `store` serializes updates to it, `entitlements` is the context object
//! front ends hold, and `auth_form` backs the sign-in screen.

pub mod auth;
pub mod auth_form;
pub mod entitlements;
pub mod store;

pub use auth::EntitlementState;
pub use entitlements::{AuthSubscription, Entitlements};
