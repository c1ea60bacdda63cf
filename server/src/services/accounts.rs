//! Mock account service: registration and login against the in-memory list.
//!
//! DESIGN
//! ======
//! Registration performs the uniqueness check and the insert under a single
//! write lock, so two concurrent registrations of the same name cannot both
//! succeed. Tokens are opaque strings derived from the user id; nothing
//! verifies them afterwards.

use tokio::sync::RwLock;

use crate::state::MockUser;

#[cfg(test)]
#[path = "accounts_test.rs"]
mod tests;

const TOKEN_PREFIX: &str = "mock_jwt_token_";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("用户名已存在")]
    UsernameTaken,
    #[error("无效凭证")]
    InvalidCredentials,
    #[error("username and password are required")]
    MissingField,
}

fn require(username: &str, password: &str) -> Result<(), AccountError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(AccountError::MissingField);
    }
    Ok(())
}

#[must_use]
pub fn token_for(id: i64) -> String {
    format!("{TOKEN_PREFIX}{id}")
}

/// Add a user and return its id (current count + 1).
///
/// # Errors
///
/// `UsernameTaken` if the name exists, `MissingField` for empty input.
pub async fn register(users: &RwLock<Vec<MockUser>>, username: &str, password: &str) -> Result<i64, AccountError> {
    require(username, password)?;

    let mut users = users.write().await;
    if users.iter().any(|u| u.username == username) {
        return Err(AccountError::UsernameTaken);
    }

    let id = i64::try_from(users.len()).unwrap_or(i64::MAX - 1) + 1;
    users.push(MockUser { id, username: username.to_owned(), password: password.to_owned() });
    tracing::info!(%id, %username, "mock user registered");
    Ok(id)
}

/// Check credentials and return a mock bearer token.
///
/// # Errors
///
/// `InvalidCredentials` when no user matches both fields.
pub async fn login(users: &RwLock<Vec<MockUser>>, username: &str, password: &str) -> Result<String, AccountError> {
    require(username, password)?;

    let users = users.read().await;
    let user = users
        .iter()
        .find(|u| u.username == username && u.password == password)
        .ok_or(AccountError::InvalidCredentials)?;
    Ok(token_for(user.id))
}
