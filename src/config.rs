//! Client configuration
//!
//! Settings shared by the fetch gateway and the sessions built on it,
//! loaded from a YAML (or JSON) file and overridden by command-line flags.
//!
//! ```yaml
//! base_url: https://jsonplaceholder.typicode.com
//! page_size: 10
//! timeout_secs: 30
//! rate_limit:
//!   requests_per_second: 5
//!   burst_size: 2
//! ```

use crate::error::{Error, Result};
use crate::http::{FetchGatewayConfig, RateLimiterConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Public REST test API the demo talks to
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Posts per page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: u32 = 10;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    30
}

/// Client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every resource path is resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Posts per page for paginated and infinite views
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Custom user agent
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Client-side rate limit, off when absent
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
            rate_limit: None,
        }
    }
}

impl ClientConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config(format!("Config file '{}' not found", path.display()))
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate a YAML document (JSON is accepted too)
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config("base_url cannot be empty"));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| Error::config(format!("Invalid base_url '{}': {}", self.base_url, e)))?;

        if self.page_size == 0 {
            return Err(Error::config("page_size must be greater than 0"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("timeout_secs must be greater than 0"));
        }
        if let Some(ref limit) = self.rate_limit {
            if limit.requests_per_second == 0 {
                return Err(Error::config(
                    "rate_limit.requests_per_second must be greater than 0",
                ));
            }
        }
        Ok(())
    }

    /// Gateway settings derived from this config
    pub fn gateway_config(&self) -> FetchGatewayConfig {
        let mut builder = FetchGatewayConfig::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.timeout_secs));

        if let Some(ref agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        builder = match self.rate_limit {
            Some(ref limit) => builder.rate_limit(limit.clone()),
            None => builder.no_rate_limit(),
        };
        builder.build()
    }
}
