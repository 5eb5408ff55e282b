//! Auth configuration types
//!
//! These types represent the runtime auth configuration resolved from the
//! tap configuration.

use chrono::{DateTime, Utc};

/// Default Snapchat OAuth2 token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.snapchat.com/login/oauth2/access_token";

/// Authentication configuration
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// OAuth2 refresh token flow
    Oauth2Refresh {
        /// Token endpoint URL
        token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Long-lived refresh token
        refresh_token: String,
    },
}

impl AuthConfig {
    /// Whether this config obtains its token from a remote endpoint
    pub fn requires_refresh(&self) -> bool {
        matches!(self, Self::Oauth2Refresh { .. })
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false,
        }
    }
}
