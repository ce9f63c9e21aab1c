//! HTTP module
//!
//! Provides the fetch gateway: one outbound GET or POST per call, returning
//! the parsed JSON body and the total-count header.
//!
//! # Features
//!
//! - **Pass-through statuses**: failure responses still carry their body
//! - **Error classification**: network, HTTP status and parse failures
//! - **Rate Limiting**: Token bucket rate limiter using governor

mod client;
mod rate_limit;

pub use client::{
    FetchGateway, FetchGatewayConfig, FetchGatewayConfigBuilder, FetchResponse,
    TOTAL_COUNT_HEADER,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
