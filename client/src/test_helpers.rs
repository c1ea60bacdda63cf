//! In-process fakes shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

use crate::identity::{
    AuthEvent, AuthEventKind, IdentityError, IdentityProvider, Session, SignUp, User, UserMetadata,
};

pub(crate) fn user(id: &str, email: &str, username: Option<&str>, is_premium: Option<bool>) -> User {
    User {
        id: id.to_owned(),
        email: Some(email.to_owned()),
        metadata: UserMetadata { username: username.map(str::to_owned), is_premium, ..UserMetadata::default() },
    }
}

fn session_for(user: &User) -> Session {
    Session {
        access_token: format!("access-{}", user.id),
        refresh_token: Some(format!("refresh-{}", user.id)),
        expires_in: Some(3600),
        user: user.clone(),
    }
}

/// Identity provider that keeps accounts in memory and behaves like the
/// hosted service for the calls the crate makes.
pub(crate) struct FakeIdentity {
    current: Mutex<Option<User>>,
    accounts: Mutex<HashMap<String, (String, User)>>,
    pub(crate) unreachable: AtomicBool,
    pub(crate) fail_update: AtomicBool,
    pub(crate) fail_sign_out: AtomicBool,
    pub(crate) update_calls: Mutex<Vec<serde_json::Value>>,
    events: broadcast::Sender<AuthEvent>,
}

impl FakeIdentity {
    pub(crate) fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            current: Mutex::new(None),
            accounts: Mutex::new(HashMap::new()),
            unreachable: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
            update_calls: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Provider with `user` already signed in.
    pub(crate) fn signed_in(user: User) -> Self {
        let fake = Self::new();
        fake.add_account(&user, "secret123");
        *fake.current.lock().unwrap() = Some(user);
        fake
    }

    pub(crate) fn add_account(&self, user: &User, password: &str) {
        let email = user.email.clone().unwrap_or_default();
        self.accounts
            .lock()
            .unwrap()
            .insert(email, (password.to_owned(), user.clone()));
    }

    pub(crate) fn current(&self) -> Option<User> {
        self.current.lock().unwrap().clone()
    }

    fn emit(&self, kind: AuthEventKind) {
        let session = self.current().as_ref().map(session_for);
        let _ = self.events.send(AuthEvent { kind, session });
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FakeIdentity {
    async fn get_user(&self) -> Result<User, IdentityError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(IdentityError::Upstream { status: 503, message: "service unavailable".into() });
        }
        self.current().ok_or(IdentityError::MissingSession)
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: UserMetadata) -> Result<SignUp, IdentityError> {
        if self.accounts.lock().unwrap().contains_key(email) {
            return Err(IdentityError::Upstream { status: 422, message: "User already registered".into() });
        }
        let id = format!("user-{}", self.accounts.lock().unwrap().len() + 1);
        let user = User { id, email: Some(email.to_owned()), metadata };
        self.add_account(&user, password);
        Ok(SignUp { user: Some(user), session: None })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let account = self.accounts.lock().unwrap().get(email).cloned();
        match account {
            Some((expected, user)) if expected == password => {
                *self.current.lock().unwrap() = Some(user.clone());
                self.emit(AuthEventKind::SignedIn);
                Ok(session_for(&user))
            }
            _ => Err(IdentityError::Upstream { status: 400, message: "Invalid login credentials".into() }),
        }
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        *self.current.lock().unwrap() = None;
        self.emit(AuthEventKind::SignedOut);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(IdentityError::Upstream { status: 500, message: "revoke failed".into() });
        }
        Ok(())
    }

    async fn update_user(&self, data: serde_json::Value) -> Result<User, IdentityError> {
        self.update_calls.lock().unwrap().push(data.clone());
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(IdentityError::Upstream { status: 500, message: "update rejected".into() });
        }
        let mut user = self.current().ok_or(IdentityError::MissingSession)?;
        let mut merged = serde_json::to_value(&user.metadata).unwrap();
        if let (Some(target), Some(patch)) = (merged.as_object_mut(), data.as_object()) {
            for (k, v) in patch {
                target.insert(k.clone(), v.clone());
            }
        }
        user.metadata = serde_json::from_value(merged).unwrap();
        *self.current.lock().unwrap() = Some(user.clone());
        self.emit(AuthEventKind::UserUpdated);
        Ok(user)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
