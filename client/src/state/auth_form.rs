//! Headless register/login form.
//!
//! Holds what a sign-in screen renders (mode, field values, busy flag, error
//! text) and performs the submit against the identity provider. Rendering is
//! left to the front end.

#[cfg(test)]
#[path = "auth_form_test.rs"]
mod auth_form_test;

use super::entitlements::Entitlements;
use crate::identity::{IdentityProvider, User, UserMetadata};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
}

#[derive(Clone, Debug, Default)]
pub struct AuthForm {
    pub mode: AuthMode,
    /// Register mode only.
    pub username: String,
    pub email: String,
    pub password: String,
    pub loading: bool,
    /// Last failure, shown verbatim.
    pub error: Option<String>,
}

impl AuthForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.error = None;
    }

    /// Check the fields the current mode shows.
    ///
    /// # Errors
    ///
    /// Returns the first missing field, or a too-short register password.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.mode == AuthMode::Register && self.username.trim().is_empty() {
            return Err(FormError::Missing("username"));
        }
        if self.email.trim().is_empty() {
            return Err(FormError::Missing("email"));
        }
        if self.password.is_empty() {
            return Err(FormError::Missing("password"));
        }
        if self.mode == AuthMode::Register && self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormError::PasswordTooShort);
        }
        Ok(())
    }

    /// Submit the form in its current mode.
    ///
    /// On success `on_success` receives the user and the user is returned.
    /// A successful registration switches the form back to login mode; a
    /// successful login notifies `entitlements`. Failures land in `error`.
    pub async fn submit<F>(
        &mut self,
        identity: &dyn IdentityProvider,
        entitlements: &Entitlements,
        on_success: F,
    ) -> Option<User>
    where
        F: FnOnce(&User),
    {
        if self.loading {
            return None;
        }
        if let Err(e) = self.validate() {
            self.error = Some(e.to_string());
            return None;
        }

        self.loading = true;
        self.error = None;
        let email = self.email.trim().to_owned();

        let outcome = match self.mode {
            AuthMode::Register => {
                let metadata = UserMetadata { username: Some(self.username.trim().to_owned()), ..UserMetadata::default() };
                identity
                    .sign_up(&email, &self.password, metadata)
                    .await
                    .map(|sign_up| sign_up.user)
            }
            AuthMode::Login => identity
                .sign_in_with_password(&email, &self.password)
                .await
                .map(|session| Some(session.user)),
        };
        self.loading = false;

        match outcome {
            Ok(Some(user)) => {
                tracing::info!(user_id = %user.id, mode = ?self.mode, "auth form succeeded");
                if self.mode == AuthMode::Login {
                    entitlements.login();
                }
                on_success(&user);
                if self.mode == AuthMode::Register {
                    self.mode = AuthMode::Login;
                }
                Some(user)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(mode = ?self.mode, error = %e, "auth form failed");
                self.error = Some(e.to_string());
                None
            }
        }
    }
}
