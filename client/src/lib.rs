//! Decoration planner client library.
//!
//! SYSTEM CONTEXT
//! ==============
//! Front ends (the `decor` CLI, future UIs) build one [`Entitlements`]
//! context at startup and read the signed-in user's entitlement from it.
//! Identity is delegated to a hosted auth service behind [`IdentityProvider`];
//! premium-only user data lives in a [`LocalCache`].
//!
//! [`Entitlements`]: state::entitlements::Entitlements
//! [`IdentityProvider`]: identity::IdentityProvider
//! [`LocalCache`]: cache::LocalCache

pub mod cache;
pub mod config;
pub mod identity;
pub mod net;
pub mod notify;
pub mod payment;
pub mod state;

#[cfg(test)]
pub(crate) mod test_helpers;
