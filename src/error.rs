//! Error types for the Snapchat Ads tap
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the tap
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong
        message: String,
    },

    /// A required config field is absent or empty
    #[error("Missing required config field: {field}")]
    MissingConfigField {
        /// Field name
        field: String,
    },

    /// A config field has an unacceptable value
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue {
        /// Field name
        field: String,
        /// Why the value was rejected
        message: String,
    },

    /// JSON (de)serialization failure
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    /// No usable credentials
    #[error("Authentication failed: {message}")]
    Auth {
        /// What is wrong
        message: String,
    },

    /// The token endpoint rejected the refresh
    #[error("Token refresh failed: {message}")]
    TokenRefresh {
        /// Status and body returned by the token endpoint
        message: String,
    },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response status
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Response status code
        status: u16,
        /// Response body
        body: String,
    },

    /// 429 after all retries
    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited {
        /// Server-requested wait
        retry_after_seconds: u64,
    },

    /// Request exceeded the configured timeout
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout
        timeout_ms: u64,
    },

    /// Retries exhausted without a response
    #[error("Max retries ({max_retries}) exceeded")]
    MaxRetriesExceeded {
        /// Configured retry count
        max_retries: u32,
    },

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    /// Invalid JSONPath expression
    #[error("JSONPath error: {message}")]
    JsonPath {
        /// Parser message
        message: String,
    },

    /// Records could not be extracted from a response
    #[error("Failed to extract records from path '{path}': {message}")]
    RecordExtraction {
        /// Records path
        path: String,
        /// Underlying failure
        message: String,
    },

    /// Response body could not be decoded
    #[error("Failed to decode response: {message}")]
    Decode {
        /// Underlying failure
        message: String,
    },

    // ============================================================================
    // State Errors
    // ============================================================================
    /// State could not be read, parsed or written
    #[error("State error: {message}")]
    State {
        /// Underlying failure
        message: String,
    },

    // ============================================================================
    // Stream Errors
    // ============================================================================
    /// Selected stream is not in the catalog
    #[error("Stream '{stream}' not found in catalog")]
    StreamNotFound {
        /// Requested stream name
        stream: String,
    },

    /// Stream definitions do not form a valid graph
    #[error("Invalid stream graph: {message}")]
    Graph {
        /// The violated rule
        message: String,
    },

    // ============================================================================
    // Template Errors
    // ============================================================================
    /// Path template needs a value the context lacks
    #[error("Undefined placeholder in path template: {variable}")]
    UndefinedVariable {
        /// Placeholder name
        variable: String,
    },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input file does not exist
    #[error("File not found: {path}")]
    FileNotFound {
        /// Missing path
        path: String,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    /// Anything else, including errors wrapped with added context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an undefined placeholder error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a stream graph error
    pub fn graph(message: impl Into<String>) -> Self {
        Self::Graph {
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Check if this error is a configuration problem detected before any request
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
                | Error::Graph { .. }
                | Error::UndefinedVariable { .. }
        )
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for the tap
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
