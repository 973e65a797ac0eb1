//! Client configuration.
//!
//! Built once through `ClientConfig::builder()` or `ClientConfig::from_env()`
//! and never mutated afterwards; the client shares it between concurrent
//! calls.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{DaimsError, Result};
use crate::http::Transport;

pub const DEFAULT_BASE_URL: &str = "https://api.daims.ai";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

pub const ENV_API_KEY: &str = "DAIMS_API_KEY";
pub const ENV_BASE_URL: &str = "DAIMS_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "DAIMS_TIMEOUT_MS";

#[derive(Clone)]
pub struct ClientConfig {
    api_key: Option<String>,
    base_url: String,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Reads `DAIMS_API_KEY`, `DAIMS_BASE_URL` and `DAIMS_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        ClientConfigBuilder::from_env()?.build()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Caller override; the executor falls back to `DEFAULT_TIMEOUT`.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn transport(&self) -> Option<&Arc<dyn Transport>> {
        self.transport.as_ref()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            transport: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("transport", &self.transport.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

#[derive(Default)]
pub struct ClientConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
    require_api_key: bool,
}

impl ClientConfigBuilder {
    /// Builder seeded from the `DAIMS_*` environment variables, so callers
    /// can layer their own overrides on top.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::default();
        if let Some(key) = lookup(ENV_API_KEY) {
            builder = builder.api_key(key);
        }
        if let Some(url) = lookup(ENV_BASE_URL) {
            builder = builder.base_url(url);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                DaimsError::config(format!(
                    "{ENV_TIMEOUT_MS} must be a whole number of milliseconds, got {raw:?}"
                ))
            })?;
            builder = builder.timeout_ms(ms);
        }
        Ok(builder)
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout_ms(self, ms: u64) -> Self {
        self.timeout(Duration::from_millis(ms))
    }

    /// Replace the default transport, e.g. with an in-process fake.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Make a missing or blank API key a `CONFIG_ERROR` at `build()`.
    pub fn require_api_key(mut self, required: bool) -> Self {
        self.require_api_key = required;
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let api_key = self.api_key.filter(|k| !k.trim().is_empty());
        if self.require_api_key && api_key.is_none() {
            return Err(DaimsError::config("apiKey is required to initialize DaimsClient."));
        }

        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(DaimsError::config("timeout must be greater than zero"));
        }

        let base_url = match self.base_url {
            Some(url) => {
                let url = url.trim().trim_end_matches('/');
                if url.is_empty() {
                    return Err(DaimsError::config("base URL must not be empty"));
                }
                url.to_string()
            }
            None => DEFAULT_BASE_URL.to_string(),
        };

        Ok(ClientConfig {
            api_key,
            base_url,
            timeout: self.timeout,
            transport: self.transport,
        })
    }
}
