//! Fetch gateway over reqwest
//!
//! Wraps a single outbound GET or POST against a configured base URL:
//! - Resource paths (with query strings) are joined onto the base URL
//! - Failure statuses are passed through with their parsed body
//! - The `x-total-count` header is extracted when present
//! - Optional client-side rate limiting

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use crate::types::Method;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Header carrying the size of the whole collection
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Configuration for the fetch gateway
#[derive(Debug, Clone)]
pub struct FetchGatewayConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for FetchGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            rate_limit: None,
            default_headers: HashMap::new(),
            user_agent: format!("postquery/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchGatewayConfig {
    /// Create a new config builder
    pub fn builder() -> FetchGatewayConfigBuilder {
        FetchGatewayConfigBuilder::default()
    }
}

/// Builder for fetch gateway config
#[derive(Default)]
pub struct FetchGatewayConfigBuilder {
    config: FetchGatewayConfig,
}

impl FetchGatewayConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> FetchGatewayConfig {
        self.config
    }
}

/// What came back from one call
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed JSON body, `Null` when empty; a non-JSON failure body is kept as a string
    pub body: Value,
    /// Value of the `x-total-count` header
    pub total_count: Option<u64>,
}

impl FetchResponse {
    /// True for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a failure status into `Error::HttpStatus`
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let body = match &self.body {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        Err(Error::http_status(self.status, body))
    }

    /// Deserialize the body into a typed value
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.body.clone()).map_err(Error::from)
    }
}

/// Stateless gateway for outbound calls
pub struct FetchGateway {
    client: Client,
    config: FetchGatewayConfig,
    rate_limiter: Option<RateLimiter>,
}

impl FetchGateway {
    /// Create a gateway with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(FetchGatewayConfig::default())
    }

    /// Create a gateway with custom configuration
    pub fn with_config(config: FetchGatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Gateway configuration
    pub fn config(&self) -> &FetchGatewayConfig {
        &self.config
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Make a GET request
    pub async fn get(&self, resource: &str) -> Result<FetchResponse> {
        self.fetch(resource, Method::GET, None).await
    }

    /// Make a POST request with a JSON body
    pub async fn post(&self, resource: &str, body: &Value) -> Result<FetchResponse> {
        self.fetch(resource, Method::POST, Some(body)).await
    }

    /// Issue one request and parse whatever came back
    pub async fn fetch(
        &self,
        resource: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<FetchResponse> {
        let url = self.build_url(resource)?;

        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self.client.request(method.into(), url.clone());

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if let Some(body) = body {
            req = req
                .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                .body(serde_json::to_vec(body)?);
        }

        debug!("{} {}", method, url);

        let response = req.send().await?;

        let status = response.status();
        let total_count = extract_total_count(response.headers());
        let bytes = response.bytes().await?;

        if !status.is_success() {
            warn!("{} {} returned {}", method, url, status.as_u16());
        }

        let body = parse_body(&bytes, status.is_success())?;

        Ok(FetchResponse {
            status: status.as_u16(),
            body,
            total_count,
        })
    }

    /// Build full URL from a resource path
    fn build_url(&self, resource: &str) -> Result<Url> {
        if resource.starts_with("http://") || resource.starts_with("https://") {
            return Ok(Url::parse(resource)?);
        }

        let full = match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let resource = resource.trim_start_matches('/');
                format!("{base}/{resource}")
            }
            None => resource.to_string(),
        };
        Ok(Url::parse(&full)?)
    }
}

impl std::fmt::Debug for FetchGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchGateway")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Parse a response body, tolerating garbage only on failure statuses
fn parse_body(bytes: &[u8], success: bool) -> Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Ok(value),
        Err(e) if success => Err(Error::parse(e.to_string())),
        Err(_) => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

/// Extract the total-count header value
fn extract_total_count(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(TOTAL_COUNT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
