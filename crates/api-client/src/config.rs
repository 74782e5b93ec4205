//! Configuration for the extractor API client
//!
//! Supports environment-based configuration with sensible defaults.

use crate::error::{ApiError, ApiResult};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Local worker started with its default port
const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Path of the road preview endpoint
const PREVIEW_PATH: &str = "preview";

/// Path of the streaming extraction endpoint
const EXTRACT_WS_PATH: &str = "ws/extract";

/// Environment types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (worker on localhost)
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

impl Environment {
    /// Parse from environment variable
    pub fn from_env() -> Self {
        Self::parse(&env::var("OSM_EXTRACTOR_ENV").unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "staging" | "stage" => Self::Staging,
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the extraction worker (`http://` or `https://`)
    pub base_url: String,
    /// Timeout for the preview request
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Current environment
    pub environment: Environment,
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            environment: Environment::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `OSM_EXTRACTOR_API_URL`: Base URL of the worker (required outside development)
    /// - `OSM_EXTRACTOR_ENV`: Environment (development/staging/production)
    /// - `OSM_EXTRACTOR_TIMEOUT_SECS`: Preview request timeout in seconds
    pub fn from_env() -> ApiResult<Self> {
        let environment = Environment::from_env();

        let base_url = match env::var("OSM_EXTRACTOR_API_URL") {
            Ok(url) => url,
            Err(_) if environment == Environment::Development => DEFAULT_API_URL.to_string(),
            Err(_) => return Err(ApiError::missing_env("OSM_EXTRACTOR_API_URL")),
        };

        let timeout = env::var("OSM_EXTRACTOR_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map_or(Duration::from_secs(30), Duration::from_secs);

        Ok(Self {
            base_url,
            timeout,
            environment,
        })
    }

    /// Builder-style method to set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set the environment
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// URL of the road preview endpoint
    #[must_use]
    pub fn preview_url(&self) -> String {
        format!("{}/{PREVIEW_PATH}", self.base_url.trim_end_matches('/'))
    }

    /// URL of the streaming extraction endpoint
    ///
    /// The `http` scheme prefix becomes `ws`, so `https` maps to `wss`.
    pub fn extract_ws_url(&self) -> ApiResult<String> {
        let base = self.base_url.trim_end_matches('/');
        let ws_base = base
            .strip_prefix("http")
            .map(|rest| format!("ws{rest}"))
            .ok_or_else(|| ApiError::InvalidUrl(base.to_string()))?;
        Ok(format!("{ws_base}/{EXTRACT_WS_PATH}"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::config("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::config("base_url must start with http:// or https://"));
        }

        Url::parse(&self.base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.base_url)))?;

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        Ok(())
    }
}
