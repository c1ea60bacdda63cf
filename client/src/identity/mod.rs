//! Identity provider seam.
//!
//! ARCHITECTURE
//! ============
//! Authentication is delegated to a hosted service. [`IdentityProvider`]
//! is the narrow surface the rest of the crate needs: current-user lookup,
//! password sign-up/sign-in, sign-out, metadata updates, and a broadcast of
//! [`AuthEvent`]s whenever the session changes. [`supabase::SupabaseAuth`]
//! implements it over the GoTrue REST API; tests use an in-process fake.

pub mod supabase;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::broadcast;

// =============================================================================
// USER / SESSION
// =============================================================================

/// Metadata is user-writable; a value of the wrong JSON type reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Free-form profile data the provider stores alongside the account.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    /// RFC 3339 timestamp.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub premium_expires_at: Option<String>,
    /// Keys this crate does not interpret, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Account as reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "user_metadata")]
    pub metadata: UserMetadata,
}

impl User {
    /// Part of the email address before `@`, if there is a non-empty one.
    #[must_use]
    pub fn email_local_part(&self) -> Option<&str> {
        let email = self.email.as_deref()?;
        let local = email.split('@').next()?;
        (!local.is_empty()).then_some(local)
    }
}

/// Provider-issued proof of authentication.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: User,
}

/// Result of a sign-up: a session when the provider auto-confirms accounts,
/// only the user when email confirmation is pending.
#[derive(Clone, Debug, PartialEq)]
pub struct SignUp {
    pub user: Option<User>,
    pub session: Option<Session>,
}

// =============================================================================
// EVENTS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// Session change notification. `session` is `None` after sign-out.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthEvent {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("auth session missing")]
    MissingSession,
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("auth request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected auth response: {0}")]
    Decode(String),
    #[error("session storage failed: {0}")]
    Storage(#[from] crate::cache::CacheError),
}

impl IdentityError {
    /// True when the provider rejected the credentials or token.
    #[must_use]
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, Self::Upstream { status: 400 | 401 | 403, .. })
    }
}

// =============================================================================
// PROVIDER TRAIT
// =============================================================================

/// Hosted identity service used for sign-in and entitlement metadata.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetch the user for the current session.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingSession`] when nobody is signed in, or
    /// an upstream/transport error when the provider cannot be reached.
    async fn get_user(&self) -> Result<User, IdentityError>;

    /// Create an account; `metadata` is stored as the user's profile data.
    ///
    /// # Errors
    ///
    /// Returns an upstream error when the provider rejects the sign-up.
    async fn sign_up(&self, email: &str, password: &str, metadata: UserMetadata) -> Result<SignUp, IdentityError>;

    /// Exchange email/password for a session and emit [`AuthEventKind::SignedIn`].
    ///
    /// # Errors
    ///
    /// Returns an upstream error on bad credentials.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// End the current session and emit [`AuthEventKind::SignedOut`].
    ///
    /// # Errors
    ///
    /// Returns an error if the provider could not revoke the session. The
    /// local session is dropped either way.
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Merge `data` into the user's metadata and emit [`AuthEventKind::UserUpdated`].
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingSession`] when nobody is signed in.
    async fn update_user(&self, data: serde_json::Value) -> Result<User, IdentityError>;

    /// Subscribe to session changes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
