//! Authentication module
//!
//! Supports: OAuth2 refresh token, sent as a Bearer header
//!
//! The `Authenticator` manages token caching for the refresh flow and is
//! shared by every request of a run.

mod authenticator;
mod types;

pub use authenticator::{Authenticator, TokenProvider};
pub use types::{AuthConfig, CachedToken, DEFAULT_TOKEN_URL};

#[cfg(test)]
mod tests;
