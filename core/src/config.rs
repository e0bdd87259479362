//! Client configuration.
//!
//! The default API key is injected when the client is constructed instead of
//! living in process-wide state. `from_env` is a convenience for binaries.

use std::env;

pub const DEFAULT_BASE_URL: &str = "https://home.sensibo.com/api/v2";

pub const API_KEY_ENV: &str = "SENSIBO_API_KEY";
pub const BASE_URL_ENV: &str = "SENSIBO_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl ClientConfig {
    /// Configuration for the public service with a default API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Read `SENSIBO_API_KEY` and `SENSIBO_BASE_URL`. Unset or empty
    /// variables fall back to the defaults.
    pub fn from_env() -> Self {
        let base_url = env::var(BASE_URL_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = env::var(API_KEY_ENV).ok().filter(|v| !v.is_empty());
        Self { base_url, api_key }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_public_service_without_key() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://home.sensibo.com/api/v2");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn new_sets_key_and_keeps_default_url() {
        let config = ClientConfig::new("abc").with_base_url("http://127.0.0.1:3000");
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
    }
}
