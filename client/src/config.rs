//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::PathBuf;
use std::time::Duration;

use crate::net::api::ApiBase;

pub const DEFAULT_API_ORIGIN: &str = "http://127.0.0.1:8787";
pub const DEFAULT_CACHE_PATH: &str = ".decor-cache.json";
pub const DEFAULT_PAYMENT_VALIDATION_DELAY_MS: u64 = 1000;
pub const DEFAULT_AUTH_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_AUTH_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Parse a boolean flag: `1/true/yes/on` or `0/false/no/off`, case-insensitive.
#[must_use]
pub fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Hosted identity-provider project settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl SupabaseConfig {
    /// Load from `PUBLIC_SUPABASE_URL` and `PUBLIC_SUPABASE_ANON_KEY`.
    ///
    /// Optional: `AUTH_REQUEST_TIMEOUT_SECS` (default 10),
    /// `AUTH_CONNECT_TIMEOUT_SECS` (default 5).
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("PUBLIC_SUPABASE_URL").map_err(|_| ConfigError::Missing("PUBLIC_SUPABASE_URL"))?;
        let anon_key =
            std::env::var("PUBLIC_SUPABASE_ANON_KEY").map_err(|_| ConfigError::Missing("PUBLIC_SUPABASE_ANON_KEY"))?;
        Ok(Self {
            url: url.trim_end_matches('/').to_owned(),
            anon_key,
            request_timeout: Duration::from_secs(env_parse("AUTH_REQUEST_TIMEOUT_SECS", DEFAULT_AUTH_REQUEST_TIMEOUT_SECS)),
            connect_timeout: Duration::from_secs(env_parse("AUTH_CONNECT_TIMEOUT_SECS", DEFAULT_AUTH_CONNECT_TIMEOUT_SECS)),
        })
    }
}

/// Everything else a front end needs besides the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base: ApiBase,
    /// Origin that a relative [`ApiBase`] is resolved against.
    pub api_origin: String,
    pub cache_path: PathBuf,
    pub payment_delay: Duration,
}

impl ClientConfig {
    /// Load from `CLOUDFLARE_DEPLOYED`, `DECOR_API_ORIGIN`, `DECOR_CACHE_PATH`,
    /// `PAYMENT_VALIDATION_DELAY_MS`. Every variable has a default.
    #[must_use]
    pub fn from_env() -> Self {
        let deployed = env_bool("CLOUDFLARE_DEPLOYED").unwrap_or(false);
        Self {
            api_base: ApiBase::select(deployed),
            api_origin: std::env::var("DECOR_API_ORIGIN")
                .unwrap_or_else(|_| DEFAULT_API_ORIGIN.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            cache_path: std::env::var("DECOR_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_PATH)),
            payment_delay: Duration::from_millis(env_parse(
                "PAYMENT_VALIDATION_DELAY_MS",
                DEFAULT_PAYMENT_VALIDATION_DELAY_MS,
            )),
        }
    }

    /// Resolved base URL for mock API requests.
    #[must_use]
    pub fn api_base_url(&self) -> String {
        self.api_base.resolve(&self.api_origin)
    }
}
