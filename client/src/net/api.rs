//! REST client for the mock decoration API.
//!
//! The base URL depends on where the front end runs: a local build talks to
//! the relative `/api` path (served by the dev server or the mock service),
//! a deployed build talks to a fixed external origin.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is logged here once (status failures with the server's
//! `{error}` message, transport failures with the reqwest error) and then
//! returned to the caller as an [`ApiError`].

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::RwLock;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{ApiInfo, Credentials, ErrorBody, LoginToken, NodeRecord, Registered};

/// Backend origin used by deployed builds.
pub const DEPLOYED_API_ORIGIN: &str = "https://your-backend-api.example.com";
/// Path used by local builds, relative to the serving origin.
pub const RELATIVE_API_PATH: &str = "/api";
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiBase {
    /// `/api` on the local origin.
    Relative,
    /// [`DEPLOYED_API_ORIGIN`].
    External,
}

impl ApiBase {
    #[must_use]
    pub fn select(deployed: bool) -> Self {
        if deployed { Self::External } else { Self::Relative }
    }

    /// Absolute base URL; `origin` only matters for [`ApiBase::Relative`].
    #[must_use]
    pub fn resolve(self, origin: &str) -> String {
        match self {
            Self::Relative => format!("{}{RELATIVE_API_PATH}", origin.trim_end_matches('/')),
            Self::External => DEPLOYED_API_ORIGIN.to_owned(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("api error {status}: {message}")]
    Status { status: u16, message: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Pull the `{error}` message out of a failing response body, falling back to
/// the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_owned())
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Build a client rooted at `base_url` (see [`ApiBase::resolve`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_API_TIMEOUT)
            .build()?;
        Ok(Self { http, base_url: base_url.into().trim_end_matches('/').to_owned(), token: RwLock::new(None) })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attach (`Some`) or drop (`None`) the bearer token sent with every request.
    pub fn set_auth_token(&self, token: Option<&str>) {
        *self
            .token
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = token.map(str::to_owned);
    }

    /// Current `Authorization` header value, if a token is set.
    #[must_use]
    pub fn authorization(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .as_deref()
            .map(bearer)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `GET /` — service banner.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or bad body.
    pub async fn info(&self) -> Result<ApiInfo, ApiError> {
        self.get("/").await
    }

    /// `GET /nodes` — the decoration task tree.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or bad body.
    pub async fn nodes(&self) -> Result<Vec<NodeRecord>, ApiError> {
        self.get("/nodes").await
    }

    /// `POST /auth/register`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 409 when the username is taken.
    pub async fn register(&self, credentials: &Credentials) -> Result<Registered, ApiError> {
        self.post("/auth/register", credentials).await
    }

    /// `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 401 on bad credentials.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginToken, ApiError> {
        self.post("/auth/login", credentials).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.http.get(self.endpoint(path));
        self.send(request).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = self.http.post(self.endpoint(path)).json(body);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, mut request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        request = request
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");
        if let Some(auth) = self.authorization() {
            request = request.header(AUTHORIZATION, auth);
        }

        let resp = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "network error");
            ApiError::Network(e)
        })?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            let message = error_message(&body);
            tracing::error!(status = status.as_u16(), %message, "api error");
            return Err(ApiError::Status { status: status.as_u16(), message });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(format!("{e}: {body}")))
    }
}
