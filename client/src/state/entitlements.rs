//! Entitlement context: the one object a front end holds to know who is
//! signed in and what they may use.
//!
//! ARCHITECTURE
//! ============
//! `Entitlements` owns the identity provider handle, the local cache, the
//! payment validator, the notifier and the single-writer store. It is built
//! once by the application root and passed to whatever needs it; there is no
//! global instance.
//!
//! State only changes through the store: auth-change events from the
//! provider (forwarded by the listener started in [`Entitlements::initialize`]),
//! startup hydration, and the upgrade result. `logout` deliberately does not
//! touch state itself; the resulting `SignedOut` event does.
//!
//! ERROR HANDLING
//! ==============
//! Actions never return errors. Failures become an error [`Notice`] plus a
//! `false`/`None` return where the action has a result.
//!
//! [`Notice`]: crate::notify::Notice

#[cfg(test)]
#[path = "entitlements_test.rs"]
mod entitlements_test;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use super::auth::EntitlementState;
use super::store::{EntitlementStore, StateUpdate};
use crate::cache::{self, LocalCache, user_data_key};
use crate::identity::{AuthEvent, IdentityError, IdentityProvider};
use crate::notify::Notifier;
use crate::payment::{PaymentError, PaymentValidator};

/// Data kind used when the caller does not name one.
pub const DEFAULT_DATA_KIND: &str = "mindmap";
/// Length of a premium membership bought through the upgrade flow.
pub const PREMIUM_TERM_DAYS: i64 = 365;

#[derive(Debug, thiserror::Error)]
enum UpgradeError {
    #[error("{0}")]
    Payment(#[from] PaymentError),
    #[error("{0}")]
    Identity(#[from] IdentityError),
    #[error("could not format expiry: {0}")]
    Expiry(#[from] time::error::Format),
}

/// Expiry timestamp (RFC 3339) for a membership starting at `now`.
pub(crate) fn premium_expiry(now: OffsetDateTime) -> Result<String, time::error::Format> {
    (now + time::Duration::days(PREMIUM_TERM_DAYS)).format(&Rfc3339)
}

/// Keeps the auth-change listener alive. Dropping it unsubscribes.
pub struct AuthSubscription {
    listener: JoinHandle<()>,
}

impl AuthSubscription {
    pub fn unsubscribe(self) {
        self.listener.abort();
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

pub struct Entitlements {
    identity: Arc<dyn IdentityProvider>,
    cache: Arc<dyn LocalCache>,
    payments: Arc<dyn PaymentValidator>,
    store: EntitlementStore,
    notices: Notifier,
    payment_prompt: watch::Sender<bool>,
}

impl Entitlements {
    /// Build the context and start its state writer. Must be called inside a
    /// tokio runtime. State stays `loading` until [`Self::initialize`] runs.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        cache: Arc<dyn LocalCache>,
        payments: Arc<dyn PaymentValidator>,
    ) -> Self {
        let (store, _writer) = EntitlementStore::spawn(cache.clone());
        let (payment_prompt, _) = watch::channel(false);
        Self { identity, cache, payments, store, notices: Notifier::new(), payment_prompt }
    }

    #[must_use]
    pub fn state(&self) -> EntitlementState {
        self.store.current()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EntitlementState> {
        self.store.subscribe()
    }

    #[must_use]
    pub fn notices(&self) -> &Notifier {
        &self.notices
    }

    /// Whether the payment prompt should be showing.
    #[must_use]
    pub fn payment_prompt(&self) -> watch::Receiver<bool> {
        self.payment_prompt.subscribe()
    }

    /// Start following auth-change events, then hydrate from the provider
    /// (or from the cache when the provider fails) and settle `loading`.
    pub async fn initialize(&self) -> AuthSubscription {
        let events = self.identity.subscribe();
        let listener = tokio::spawn(forward_auth_events(events, self.store.clone()));

        match self.identity.get_user().await {
            Ok(user) => {
                self.store.apply(StateUpdate::User(Some(user))).await;
            }
            Err(e) if e.is_credential_failure() => {
                tracing::info!(error = %e, "stored session rejected; restoring cached entitlement");
                self.store.apply(StateUpdate::RestoreFromCache).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load current user; restoring cached entitlement");
                self.store.apply(StateUpdate::RestoreFromCache).await;
            }
        }
        self.store.apply(StateUpdate::Settle).await;

        AuthSubscription { listener }
    }

    /// Recompute state from an auth-change event.
    pub async fn on_auth_change(&self, event: &AuthEvent) -> EntitlementState {
        apply_auth_event(&self.store, event).await
    }

    /// Kept for callers that signal a finished sign-in; state already follows
    /// the provider's `SignedIn` event.
    pub fn login(&self) {
        tracing::debug!("login called; entitlement follows auth-change events");
    }

    /// Sign out through the provider. State is cleared by the resulting
    /// auth-change event.
    pub async fn logout(&self) {
        match self.identity.sign_out().await {
            Ok(()) => self.notices.info("You have signed out"),
            Err(e) => self.notices.error(format!("Sign-out failed: {e}")),
        }
    }

    /// Open the payment prompt. Does not grant anything by itself.
    pub fn upgrade_to_premium(&self) {
        self.payment_prompt.send_replace(true);
    }

    pub fn close_payment_prompt(&self) {
        self.payment_prompt.send_replace(false);
    }

    /// Verify payment, mark the account premium for one year, and refresh
    /// state from the provider's response. Returns whether the upgrade took.
    pub async fn complete_upgrade_to_premium(&self) -> bool {
        match self.try_complete_upgrade().await {
            Ok(true) => {
                self.close_payment_prompt();
                self.notices.success("Congratulations! Your account is now premium");
                true
            }
            Ok(false) => {
                self.notices.error("Payment verification failed, please check the payment status");
                false
            }
            Err(e) => {
                self.notices.error(format!("Premium upgrade failed: {e}"));
                false
            }
        }
    }

    async fn try_complete_upgrade(&self) -> Result<bool, UpgradeError> {
        if !self.payments.validate().await? {
            return Ok(false);
        }
        let expires_at = premium_expiry(OffsetDateTime::now_utc())?;
        let user = self
            .identity
            .update_user(serde_json::json!({
                "is_premium": true,
                "premium_expires_at": expires_at,
            }))
            .await?;
        tracing::info!(user_id = %user.id, %expires_at, "premium upgrade recorded");
        self.store.apply(StateUpdate::User(Some(user))).await;
        Ok(true)
    }

    /// Store `data` under `kind` for premium users. Returns false, without
    /// writing, when the user is not signed in or not premium.
    pub fn save_user_data<T: Serialize + ?Sized>(&self, data: &T, kind: &str) -> bool {
        let state = self.state();
        if !state.is_authenticated {
            self.notices.error("Please sign in first");
            return false;
        }
        if !state.is_premium {
            self.notices.error("This feature is only available to premium members");
            return false;
        }
        match cache::save_json(self.cache.as_ref(), &user_data_key(kind), data) {
            Ok(()) => {
                tracing::debug!(kind, "user data saved");
                self.notices.success("Data saved");
                true
            }
            Err(e) => {
                tracing::error!(kind, error = %e, "saving user data failed");
                self.notices.error("Save failed, please try again later");
                false
            }
        }
    }

    /// Saved data of `kind`, for premium users only.
    pub fn get_user_data<T: DeserializeOwned>(&self, kind: &str) -> Option<T> {
        if !self.state().is_entitled() {
            return None;
        }
        cache::load_json(self.cache.as_ref(), &user_data_key(kind))
    }
}

async fn apply_auth_event(store: &EntitlementStore, event: &AuthEvent) -> EntitlementState {
    tracing::info!(kind = ?event.kind, signed_in = event.session.is_some(), "auth state changed");
    store.apply(StateUpdate::User(event.user().cloned())).await
}

async fn forward_auth_events(mut events: broadcast::Receiver<AuthEvent>, store: EntitlementStore) {
    loop {
        match events.recv().await {
            Ok(event) => {
                apply_auth_event(&store, &event).await;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "auth events dropped; waiting for the next one");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
