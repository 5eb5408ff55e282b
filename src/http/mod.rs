//! HTTP client module
//!
//! Provides the HTTP client with retry, rate limiting, and backoff, plus the
//! [`Fetcher`] seam that stream execution talks to.
//!
//! # Features
//!
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Authentication**: Integration with auth module

mod client;
mod rate_limit;

pub use client::{
    ApiResponse, Fetcher, HttpClient, HttpClientConfig, HttpClientConfigBuilder, DEFAULT_API_URL,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
