//! Supabase (GoTrue) identity provider over REST.
//!
//! The session is persisted in the [`LocalCache`] under [`SESSION_KEY`] so a
//! restarted front end resumes where it left off, the same way the hosted JS
//! client keeps its session in browser storage.
//!
//! TRADE-OFFS
//! ==========
//! An expired access token is refreshed once inside `get_user`; every other
//! call surfaces the provider's 401 so the user re-authenticates.

#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;

use std::sync::{Arc, Mutex};

use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

use super::{AuthEvent, AuthEventKind, IdentityError, IdentityProvider, Session, SignUp, User, UserMetadata};
use crate::cache::{self, LocalCache, SESSION_KEY};
use crate::config::SupabaseConfig;

const EVENT_CAPACITY: usize = 32;

/// Best human-readable message from a GoTrue error body.
pub(crate) fn upstream_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(text) = value.get(key).and_then(serde_json::Value::as_str) {
                return text.to_owned();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() { format!("auth request failed with status {status}") } else { trimmed.to_owned() }
}

/// Sign-up returns a full session when accounts are auto-confirmed and a bare
/// user object otherwise.
pub(crate) fn parse_sign_up(body: &str) -> Result<SignUp, IdentityError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| IdentityError::Decode(e.to_string()))?;
    if value.get("access_token").is_some() {
        let session: Session = decode_value(value)?;
        return Ok(SignUp { user: Some(session.user.clone()), session: Some(session) });
    }
    if value.get("id").is_some() {
        let user: User = decode_value(value)?;
        return Ok(SignUp { user: Some(user), session: None });
    }
    Ok(SignUp { user: None, session: None })
}

fn decode_value<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, IdentityError> {
    serde_json::from_value(value).map_err(|e| IdentityError::Decode(e.to_string()))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, IdentityError> {
    serde_json::from_str(body).map_err(|e| IdentityError::Decode(format!("{e}: {body}")))
}

pub struct SupabaseAuth {
    http: reqwest::Client,
    url: String,
    anon_key: String,
    cache: Arc<dyn LocalCache>,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseAuth {
    /// Build a provider client and restore any session persisted in `cache`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &SupabaseConfig, cache: Arc<dyn LocalCache>) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        let session = cache::load_json::<Session>(cache.as_ref(), SESSION_KEY);
        if let Some(s) = &session {
            tracing::debug!(user_id = %s.user.id, "restored persisted auth session");
        }
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            http,
            url: config.url.trim_end_matches('/').to_owned(),
            anon_key: config.anon_key.clone(),
            cache,
            session: Mutex::new(session),
            events,
        })
    }

    /// Snapshot of the current session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{path}", self.url)
    }

    fn access_token(&self) -> Result<String, IdentityError> {
        self.session()
            .map(|s| s.access_token)
            .ok_or(IdentityError::MissingSession)
    }

    fn store_session(&self, session: Option<Session>) -> Result<(), IdentityError> {
        match &session {
            Some(s) => cache::save_json(self.cache.as_ref(), SESSION_KEY, s)?,
            None => self.cache.remove(SESSION_KEY)?,
        }
        *self
            .session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = session;
        Ok(())
    }

    fn emit(&self, kind: AuthEventKind) {
        let event = AuthEvent { kind, session: self.session() };
        tracing::debug!(?kind, "auth state change");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, IdentityError> {
        let resp = request.header("apikey", &self.anon_key).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(IdentityError::Upstream { status: status.as_u16(), message: upstream_message(status, &body) });
        }
        Ok(body)
    }

    async fn fetch_user(&self, access_token: &str) -> Result<User, IdentityError> {
        let body = self
            .send(
                self.http
                    .get(self.auth_url("/user"))
                    .header(AUTHORIZATION, format!("Bearer {access_token}")),
            )
            .await?;
        decode(&body)
    }

    /// Trade the refresh token for a new session and emit
    /// [`AuthEventKind::TokenRefreshed`].
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingSession`] when there is no refresh
    /// token, or the provider's error when it rejects the token.
    pub async fn refresh_session(&self) -> Result<Session, IdentityError> {
        let refresh_token = self
            .session()
            .and_then(|s| s.refresh_token)
            .ok_or(IdentityError::MissingSession)?;
        let body = self
            .send(
                self.http
                    .post(self.auth_url("/token?grant_type=refresh_token"))
                    .json(&serde_json::json!({ "refresh_token": refresh_token })),
            )
            .await?;
        let session: Session = decode(&body)?;
        self.store_session(Some(session.clone()))?;
        self.emit(AuthEventKind::TokenRefreshed);
        Ok(session)
    }

    fn replace_session_user(&self, user: &User) -> Result<(), IdentityError> {
        if let Some(mut session) = self.session() {
            session.user = user.clone();
            self.store_session(Some(session))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn get_user(&self) -> Result<User, IdentityError> {
        let token = self.access_token()?;
        let user = match self.fetch_user(&token).await {
            Err(IdentityError::Upstream { status: 401, .. }) if self.session().is_some_and(|s| s.refresh_token.is_some()) => {
                let session = self.refresh_session().await?;
                self.fetch_user(&session.access_token).await?
            }
            other => other?,
        };
        self.replace_session_user(&user)?;
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: UserMetadata) -> Result<SignUp, IdentityError> {
        let body = self
            .send(self.http.post(self.auth_url("/signup")).json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": metadata,
            })))
            .await?;
        let sign_up = parse_sign_up(&body)?;
        if let Some(session) = &sign_up.session {
            self.store_session(Some(session.clone()))?;
            self.emit(AuthEventKind::SignedIn);
        }
        Ok(sign_up)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let body = self
            .send(
                self.http
                    .post(self.auth_url("/token?grant_type=password"))
                    .json(&serde_json::json!({ "email": email, "password": password })),
            )
            .await?;
        let session: Session = decode(&body)?;
        self.store_session(Some(session.clone()))?;
        self.emit(AuthEventKind::SignedIn);
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let revoked = match self.access_token() {
            Ok(token) => self
                .send(
                    self.http
                        .post(self.auth_url("/logout"))
                        .header(AUTHORIZATION, format!("Bearer {token}")),
                )
                .await
                .map(|_| ()),
            Err(_) => Ok(()),
        };
        if let Err(e) = &revoked {
            tracing::warn!(error = %e, "session revoke failed; dropping local session anyway");
        }
        self.store_session(None)?;
        self.emit(AuthEventKind::SignedOut);
        revoked
    }

    async fn update_user(&self, data: serde_json::Value) -> Result<User, IdentityError> {
        let token = self.access_token()?;
        let body = self
            .send(
                self.http
                    .put(self.auth_url("/user"))
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .json(&serde_json::json!({ "data": data })),
            )
            .await?;
        let user: User = decode(&body)?;
        self.replace_session_user(&user)?;
        self.emit(AuthEventKind::UserUpdated);
        Ok(user)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
