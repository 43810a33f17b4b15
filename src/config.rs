//! Process-wide configuration, resolved once at startup and read-only afterwards.

use std::env;
use std::time::Duration;

/// Environment variable holding the backend base URL.
pub const API_URL_ENV: &str = "MINIRAG_API_URL";
/// Environment variable holding the whole-request timeout in seconds.
pub const TIMEOUT_ENV: &str = "MINIRAG_TIMEOUT_SECS";
/// Environment variable holding the connect timeout in seconds.
pub const CONNECT_TIMEOUT_ENV: &str = "MINIRAG_CONNECT_TIMEOUT_SECS";

/// Local development backend.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Number of chunks requested from the retriever for every query.
pub const TOP_K: u32 = 10;

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    api_url: String,
    timeout: Duration,
    connect_timeout: Duration,
}

impl Config {
    /// Reads the configuration from the environment, falling back to local defaults.
    ///
    /// Unparseable timeout values are ignored in favour of the defaults.
    pub fn from_env() -> Self {
        let api_url = env::var(API_URL_ENV)
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            api_url: trim_trailing_slash(api_url),
            timeout: secs_from_env(TIMEOUT_ENV, DEFAULT_TIMEOUT_SECS),
            connect_timeout: secs_from_env(CONNECT_TIMEOUT_ENV, DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    /// Replaces the backend URL (used for the `--api-url` flag).
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = trim_trailing_slash(url.into());
        self
    }

    /// Returns the backend base URL without a trailing slash.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Returns the whole-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the fixed retrieval depth sent with every query.
    pub fn top_k(&self) -> u32 {
        TOP_K
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

fn secs_from_env(name: &str, default: u64) -> Duration {
    let secs = env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

fn trim_trailing_slash(url: String) -> String {
    match url.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => url,
    }
}
