//! Client configuration
//!
//! Loaded from TOML; every field has a default so an absent file means a
//! local service on port 9200 and the `recipes` index.

use crate::error::SiftError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SiftConfig {
    /// Base URL of the search service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Index targeted by searches and admin calls
    #[serde(default = "default_index")]
    pub index: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_endpoint() -> String {
    "http://localhost:9200".to_string()
}

fn default_index() -> String {
    "recipes".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            index: default_index(),
            request_timeout_ms: default_request_timeout_ms(),
            auth: None,
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum AuthConfig {
    Basic { username: String, password: String },
    /// Sent as `Authorization: ApiKey <key>`
    ApiKey { key: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset
    #[serde(default = "default_level")]
    pub level: String,
    /// "pretty" or "json"; LOG_FORMAT overrides
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

impl SiftConfig {
    /// Read `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| SiftError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
            .map_err(|e| SiftError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SiftError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SiftError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.index.trim().is_empty() {
            return Err(SiftError::Config("index must not be empty".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(SiftError::Config(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        self.endpoint_url()?;
        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| SiftError::Config(format!("invalid endpoint '{}': {}", self.endpoint, e)))?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(SiftError::Config(format!(
                    "endpoint scheme must be http or https, got '{}'",
                    other
                )))
            }
        }
        if url.cannot_be_a_base() {
            return Err(SiftError::Config(format!(
                "endpoint '{}' cannot be used as a base URL",
                self.endpoint
            )));
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}
