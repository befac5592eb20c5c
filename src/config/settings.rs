// src/config/settings.rs

use std::env;
use std::time::Duration;

use url::Url;

use super::consts::{DEFAULT_SERVER_URL, DEFAULT_TIMEOUT_SECS, SERVER_ENV, TOKEN_ENV};
use crate::error::Error;

/// Connection settings for one KoboToolbox server.
/// Validation happens up front, before any fetch is attempted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub token: String,
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            token: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    /// Defaults, then environment overrides. CLI flags are applied on top.
    pub fn from_env() -> Self {
        let mut s = Self::default();
        if let Ok(v) = env::var(SERVER_ENV) {
            if !v.trim().is_empty() {
                s.server_url = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var(TOKEN_ENV) {
            s.token = v.trim().to_string();
        }
        s
    }

    /// Reject missing/unusable settings with a specific message.
    /// Returns the parsed base URL (trailing slash stripped) on success.
    pub fn validate(&self) -> Result<Url, Error> {
        if self.token.trim().is_empty() {
            return Err(Error::Config(format!(
                "missing API token (pass --token or set {TOKEN_ENV})"
            )));
        }
        let trimmed = self.server_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Error::Config(format!(
                "missing server URL (pass --server or set {SERVER_ENV})"
            )));
        }
        let url = Url::parse(trimmed)
            .map_err(|e| Error::Config(format!("invalid server URL {trimmed:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "server URL must be http(s), got {:?}",
                url.scheme()
            )));
        }
        Ok(url)
    }
}
