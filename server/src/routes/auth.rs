//! Mock auth routes: register and login against the in-memory account list.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use super::error_response;
use crate::services::accounts::{self, AccountError};
use crate::state::AppState;

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisteredResponse {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
}

pub(crate) fn account_error_to_status(err: &AccountError) -> StatusCode {
    match err {
        AccountError::UsernameTaken => StatusCode::CONFLICT,
        AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AccountError::MissingField => StatusCode::BAD_REQUEST,
    }
}

fn account_error(err: &AccountError) -> Response {
    error_response(account_error_to_status(err), err.to_string())
}

fn rejection(err: &JsonRejection) -> Response {
    tracing::debug!(error = %err, "rejected auth body");
    error_response(StatusCode::BAD_REQUEST, err.body_text())
}

/// `POST /api/auth/register` — 201 `{id}`, 409 on a taken name.
pub async fn register(State(state): State<AppState>, body: Result<Json<CredentialsBody>, JsonRejection>) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(err) => return rejection(&err),
    };

    match accounts::register(&state.users, &body.username, &body.password).await {
        Ok(id) => (StatusCode::CREATED, Json(RegisteredResponse { id })).into_response(),
        Err(err) => account_error(&err),
    }
}

/// `POST /api/auth/login` — 200 `{token}`, 401 on bad credentials.
pub async fn login(State(state): State<AppState>, body: Result<Json<CredentialsBody>, JsonRejection>) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(err) => return rejection(&err),
    };

    match accounts::login(&state.users, &body.username, &body.password).await {
        Ok(token) => Json(LoginResponse { token }).into_response(),
        Err(err) => {
            tracing::info!(username = %body.username, "mock login rejected");
            account_error(&err)
        }
    }
}
