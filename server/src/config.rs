//! Server settings parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

const DEFAULT_PORT: u16 = 8787;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl ServerConfig {
    /// Load from `BIND_ADDR` (default `0.0.0.0`) and `PORT` (default 8787).
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned()),
            port: env_parse("PORT", DEFAULT_PORT),
        }
    }

    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}
