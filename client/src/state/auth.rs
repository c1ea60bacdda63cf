//! Entitlement snapshot for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Read by premium gates and user-aware views. Produced only by the
//! [`store`](super::store) writer; everything else holds copies.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::identity::User;

/// Authentication + premium status tracked per front-end instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntitlementState {
    pub is_authenticated: bool,
    /// Never true while `is_authenticated` is false.
    pub is_premium: bool,
    pub username: String,
    /// True until initialization has settled once.
    pub loading: bool,
    /// Last cached premium flag, restored when the provider was unreachable.
    /// Display-only; never grants access.
    pub premium_hint: bool,
    /// Bumped by every applied update.
    pub version: u64,
}

impl Default for EntitlementState {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            is_premium: false,
            username: String::new(),
            loading: true,
            premium_hint: false,
            version: 0,
        }
    }
}

impl EntitlementState {
    /// Premium-only features are available.
    #[must_use]
    pub fn is_entitled(&self) -> bool {
        self.is_authenticated && self.is_premium
    }
}

/// Premium flag from user metadata; unset means not premium.
#[must_use]
pub fn premium_of(user: &User) -> bool {
    user.metadata.is_premium.unwrap_or(false)
}

/// Display name: metadata username, else email local part, else user id.
#[must_use]
pub fn username_of(user: &User) -> String {
    user.metadata
        .username
        .as_deref()
        .filter(|name| !name.is_empty())
        .or_else(|| user.email_local_part())
        .unwrap_or(user.id.as_str())
        .to_owned()
}
