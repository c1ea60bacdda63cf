//! Single-writer entitlement store.
//!
//! DESIGN
//! ======
//! Every mutation (auth-change events, startup hydration, upgrade results)
//! is queued on one mpsc channel and applied in order by a dedicated writer
//! task, which is also the only code that touches the `username` /
//! `isPremium` cache keys. Two auth events arriving back to back therefore
//! cannot interleave their state write and cache write. Readers observe the
//! result through a `watch` channel.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::auth::{EntitlementState, premium_of, username_of};
use crate::cache::{LocalCache, PREMIUM_KEY, USERNAME_KEY};
use crate::identity::User;

const UPDATE_QUEUE_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub enum StateUpdate {
    /// Derive from a signed-in user, or clear when `None`.
    User(Option<User>),
    /// The provider could not be reached at startup: show cached values,
    /// signed out.
    RestoreFromCache,
    /// Initialization has finished.
    Settle,
}

struct Command {
    update: StateUpdate,
    ack: oneshot::Sender<EntitlementState>,
}

#[derive(Clone)]
pub struct EntitlementStore {
    tx: mpsc::Sender<Command>,
    state: watch::Receiver<EntitlementState>,
}

impl EntitlementStore {
    /// Spawn the writer task. Must be called inside a tokio runtime.
    ///
    /// The writer exits once every store handle is dropped.
    pub fn spawn(cache: Arc<dyn LocalCache>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(UPDATE_QUEUE_CAPACITY);
        let (state_tx, state) = watch::channel(EntitlementState::default());
        let handle = tokio::spawn(run_writer(rx, state_tx, cache));
        (Self { tx, state }, handle)
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> EntitlementState {
        self.state.borrow().clone()
    }

    /// Receiver that wakes on every applied update.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EntitlementState> {
        self.state.clone()
    }

    /// Queue `update` and wait until the writer has applied it.
    ///
    /// Returns the state right after this update. If the writer is gone the
    /// last published state is returned unchanged.
    pub async fn apply(&self, update: StateUpdate) -> EntitlementState {
        let (ack_tx, ack_rx) = oneshot::channel();
        let command = Command { update, ack: ack_tx };
        if self.tx.send(command).await.is_err() {
            tracing::warn!("entitlement writer stopped; update dropped");
            return self.current();
        }
        ack_rx.await.unwrap_or_else(|_| self.current())
    }
}

async fn run_writer(
    mut rx: mpsc::Receiver<Command>,
    state_tx: watch::Sender<EntitlementState>,
    cache: Arc<dyn LocalCache>,
) {
    while let Some(Command { update, ack }) = rx.recv().await {
        let next = next_state(&state_tx.borrow(), update, cache.as_ref());
        tracing::debug!(
            version = next.version,
            authenticated = next.is_authenticated,
            premium = next.is_premium,
            "entitlement state updated"
        );
        state_tx.send_replace(next.clone());
        // The caller may have stopped waiting.
        let _ = ack.send(next);
    }
}

/// Compute the state after `update` and mirror it into `cache`.
pub(crate) fn next_state(current: &EntitlementState, update: StateUpdate, cache: &dyn LocalCache) -> EntitlementState {
    let mut next = match update {
        StateUpdate::User(Some(user)) => {
            let username = username_of(&user);
            let is_premium = premium_of(&user);
            mirror(cache, &username, is_premium);
            EntitlementState {
                is_authenticated: true,
                is_premium,
                username,
                premium_hint: is_premium,
                ..current.clone()
            }
        }
        StateUpdate::User(None) => {
            forget(cache);
            EntitlementState {
                is_authenticated: false,
                is_premium: false,
                username: String::new(),
                premium_hint: false,
                ..current.clone()
            }
        }
        StateUpdate::RestoreFromCache => EntitlementState {
            is_authenticated: false,
            is_premium: false,
            username: cache.get(USERNAME_KEY).unwrap_or_default(),
            premium_hint: cache.get(PREMIUM_KEY).as_deref() == Some("true"),
            ..current.clone()
        },
        StateUpdate::Settle => EntitlementState { loading: false, ..current.clone() },
    };
    next.version = current.version + 1;
    next
}

fn mirror(cache: &dyn LocalCache, username: &str, is_premium: bool) {
    let premium = if is_premium { "true" } else { "false" };
    if let Err(e) = cache
        .set(PREMIUM_KEY, premium)
        .and_then(|()| cache.set(USERNAME_KEY, username))
    {
        tracing::warn!(error = %e, "failed to cache entitlement");
    }
}

fn forget(cache: &dyn LocalCache) {
    if let Err(e) = cache
        .remove(PREMIUM_KEY)
        .and_then(|()| cache.remove(USERNAME_KEY))
    {
        tracing::warn!(error = %e, "failed to clear cached entitlement");
    }
}
