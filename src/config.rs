//! Client configuration.

use crate::error::{Error, Result};
use std::time::Duration;

/// Default connect timeout: 30 seconds.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default size of each read from a streaming response body.
pub const DEFAULT_CHUNK_SIZE: usize = 65_536;

/// Environment variable holding the store URL.
pub const URL_ENV: &str = "RENGU_URL";

/// Configuration for connecting to a Rengu store over HTTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the store's object endpoint.
    pub base_url: String,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// Overall request timeout. `None` lets long result streams run.
    pub timeout: Option<Duration>,
    /// User-Agent header to send with requests.
    pub user_agent: String,
    /// Maximum bytes read from the response body per chunk.
    pub chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: None,
            user_agent: Self::default_user_agent(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for `base_url` with defaults elsewhere.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    fn default_user_agent() -> String {
        format!("rengu-store/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the overall request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the User-Agent header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the response chunk size.
    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Returns the effective connect timeout, using the default if zero.
    #[must_use]
    pub fn effective_connect_timeout(&self) -> Duration {
        if self.connect_timeout.is_zero() {
            DEFAULT_CONNECT_TIMEOUT
        } else {
            self.connect_timeout
        }
    }

    /// Returns the effective user agent, using the default if empty.
    #[must_use]
    pub fn effective_user_agent(&self) -> String {
        if self.user_agent.is_empty() {
            Self::default_user_agent()
        } else {
            self.user_agent.clone()
        }
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Checks that the configuration can be used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty or non-HTTP URL or a zero
    /// chunk size.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config {
                message: format!("store URL is required (set --url or {URL_ENV})"),
            });
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config {
                message: format!("store URL must be http(s): {}", self.base_url),
            });
        }
        if self.chunk_size == 0 {
            return Err(Error::Config {
                message: "chunk size must be > 0".to_string(),
            });
        }
        Ok(())
    }
}
