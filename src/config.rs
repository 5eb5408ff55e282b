//! Tap configuration
//!
//! The JSON configuration accepted by the tap, with defaults and validation.
//! Invalid configuration is reported before any request is issued.

use crate::auth::{AuthConfig, DEFAULT_TOKEN_URL};
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig, DEFAULT_API_URL};
use crate::types::{BackoffType, JsonValue, OptionStringExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

/// Default replication start for streams without a bookmark
pub const DEFAULT_START_DATE: &str = "2022-01-01T00:00:00Z";

// ============================================================================
// Attribution Windows
// ============================================================================

/// Attribution window for swipe-up conversions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SwipeUpAttributionWindow {
    /// 1 day
    #[serde(rename = "1_DAY")]
    OneDay,
    /// 7 days
    #[serde(rename = "7_DAY")]
    SevenDays,
    /// 28 days
    #[default]
    #[serde(rename = "28_DAY")]
    TwentyEightDays,
}

impl SwipeUpAttributionWindow {
    /// All accepted values
    pub const ALLOWED: [&'static str; 3] = ["1_DAY", "7_DAY", "28_DAY"];

    /// API parameter value
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1_DAY",
            Self::SevenDays => "7_DAY",
            Self::TwentyEightDays => "28_DAY",
        }
    }
}

/// Attribution window for view conversions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewAttributionWindow {
    /// 1 hour
    #[serde(rename = "1_HOUR")]
    OneHour,
    /// 3 hours
    #[serde(rename = "3_HOUR")]
    ThreeHours,
    /// 6 hours
    #[serde(rename = "6_HOUR")]
    SixHours,
    /// 1 day
    #[default]
    #[serde(rename = "1_DAY")]
    OneDay,
    /// 7 days
    #[serde(rename = "7_DAY")]
    SevenDays,
    /// 28 days
    #[serde(rename = "28_DAY")]
    TwentyEightDays,
}

impl ViewAttributionWindow {
    /// All accepted values
    pub const ALLOWED: [&'static str; 6] = ["1_HOUR", "3_HOUR", "6_HOUR", "1_DAY", "7_DAY", "28_DAY"];

    /// API parameter value
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneHour => "1_HOUR",
            Self::ThreeHours => "3_HOUR",
            Self::SixHours => "6_HOUR",
            Self::OneDay => "1_DAY",
            Self::SevenDays => "7_DAY",
            Self::TwentyEightDays => "28_DAY",
        }
    }
}

// ============================================================================
// HTTP Settings
// ============================================================================

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Requests per second allowed by the rate limiter
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

fn default_timeout() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    5
}

fn default_requests_per_second() -> u32 {
    10
}

// ============================================================================
// Tap Config
// ============================================================================

/// Tap configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapConfig {
    /// OAuth client ID
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret
    #[serde(default)]
    pub client_secret: String,

    /// OAuth refresh token
    #[serde(default)]
    pub refresh_token: String,

    /// Swipe-up attribution window for stats streams
    #[serde(default)]
    pub swipe_up_attribution_window: SwipeUpAttributionWindow,

    /// View attribution window for stats streams
    #[serde(default)]
    pub view_attribution_window: ViewAttributionWindow,

    /// Replication start for streams without a bookmark
    #[serde(default = "default_start_date")]
    pub start_date: String,

    /// Country codes iterated by geo fan-out streams
    #[serde(default)]
    pub targeting_country_codes: Vec<String>,

    /// User-Agent header override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// API base URL override
    #[serde(default)]
    pub api_url: Option<String>,

    /// OAuth token endpoint override
    #[serde(default)]
    pub token_url: Option<String>,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpSettings,
}

fn default_start_date() -> String {
    DEFAULT_START_DATE.to_string()
}

impl TapConfig {
    /// Create a config with the required secrets and all defaults
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            swipe_up_attribution_window: SwipeUpAttributionWindow::default(),
            view_attribution_window: ViewAttributionWindow::default(),
            start_date: default_start_date(),
            targeting_country_codes: Vec::new(),
            user_agent: None,
            api_url: None,
            token_url: None,
            http: HttpSettings::default(),
        }
    }

    /// Parse and validate a config from a JSON value
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let config: Self = serde_json::from_value(value)
            .map_err(|e| Error::config(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a config from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Config is not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check required fields and value formats
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", &self.refresh_token),
        ] {
            if value.trim().is_empty() {
                return Err(Error::missing_field(field));
            }
        }

        self.start_date()?;

        if let Some(code) = self
            .targeting_country_codes
            .iter()
            .find(|c| c.trim().is_empty())
        {
            return Err(Error::invalid_value(
                "targeting_country_codes",
                format!("empty country code '{code}'"),
            ));
        }

        for (field, value) in [("api_url", &self.api_url), ("token_url", &self.token_url)] {
            if let Some(url) = value.clone().none_if_empty() {
                url::Url::parse(&url).map_err(|e| Error::invalid_value(field, e.to_string()))?;
            }
        }

        Ok(())
    }

    /// The configured start date as an instant
    pub fn start_date(&self) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.start_date.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                Error::invalid_value("start_date", format!("'{}': {e}", self.start_date))
            })
    }

    /// API base URL
    pub fn api_url(&self) -> String {
        self.api_url
            .clone()
            .none_if_empty()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Auth configuration for the refresh-token flow
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::Oauth2Refresh {
            token_url: self
                .token_url
                .clone()
                .none_if_empty()
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }

    /// HTTP client configuration
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(self.api_url())
            .timeout(Duration::from_secs(self.http.timeout_seconds))
            .max_retries(self.http.max_retries)
            .backoff(
                BackoffType::Exponential,
                Duration::from_millis(500),
                Duration::from_secs(60),
            )
            .rate_limit(RateLimiterConfig::new(
                self.http.requests_per_second,
                self.http.requests_per_second,
            ));
        if let Some(agent) = self.user_agent.clone().none_if_empty() {
            builder = builder.user_agent(agent);
        }
        builder.build()
    }

    /// JSON Schema describing this configuration
    pub fn json_schema() -> JsonValue {
        json!({
            "type": "object",
            "required": ["client_id", "client_secret", "refresh_token"],
            "properties": {
                "client_id": {"type": "string", "secret": true},
                "client_secret": {"type": "string", "secret": true},
                "refresh_token": {"type": "string", "secret": true},
                "swipe_up_attribution_window": {
                    "type": "string",
                    "enum": SwipeUpAttributionWindow::ALLOWED,
                    "default": SwipeUpAttributionWindow::default().as_str()
                },
                "view_attribution_window": {
                    "type": "string",
                    "enum": ViewAttributionWindow::ALLOWED,
                    "default": ViewAttributionWindow::default().as_str()
                },
                "start_date": {
                    "type": "string",
                    "format": "date-time",
                    "default": DEFAULT_START_DATE
                },
                "targeting_country_codes": {
                    "type": "array",
                    "items": {"type": "string"},
                    "default": []
                },
                "user_agent": {"type": "string"},
                "api_url": {"type": "string", "default": DEFAULT_API_URL},
                "token_url": {"type": "string", "default": DEFAULT_TOKEN_URL},
                "http": {
                    "type": "object",
                    "properties": {
                        "timeout_seconds": {"type": "integer", "default": default_timeout()},
                        "max_retries": {"type": "integer", "default": default_max_retries()},
                        "requests_per_second": {"type": "integer", "default": default_requests_per_second()}
                    }
                }
            }
        })
    }
}
