//! # tap-snapchat-ads
//!
//! Extracts Snapchat Marketing API resources as a stream of records with
//! resumable replication state.
//!
//! ## Features
//!
//! - **Stream Graph**: Organizations, ad accounts, campaigns, ads and their
//!   children are fetched per parent record
//! - **Pagination**: Next-link / `X-Next-Page` cursors and windowed
//!   time-series requests
//! - **Incremental Sync**: Per-stream, per-context bookmarks so re-runs only
//!   emit new data
//! - **Normalization**: Time-series stats are flattened into one record per
//!   bucket
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_snapchat_ads::config::TapConfig;
//! use tap_snapchat_ads::connector::SnapchatAdsConnector;
//! use tap_snapchat_ads::engine::JsonLinesSink;
//! use tap_snapchat_ads::state::StateManager;
//!
//! #[tokio::main]
//! async fn main() -> tap_snapchat_ads::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let connector = SnapchatAdsConnector::new(config)?;
//!
//!     let mut sink = JsonLinesSink::new(std::io::stdout());
//!     let state = StateManager::from_file("state.json")?;
//!     connector.read(None, state, &mut sink, None).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Connector                               │
//! │  spec()    check()    discover() → Catalog    read() → messages │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌───────────┬───────────┬──────┴──────┬────────────┬─────────────┐
//! │  Streams  │  Engine   │  Paginate   │ Partition  │  State      │
//! ├───────────┼───────────┼─────────────┼────────────┼─────────────┤
//! │ Catalog   │ Runner    │ Next link   │ Parent     │ Bookmarks   │
//! │ Graph     │ Sync loop │ X-Next-Page │ Fan-out    │ Atomic save │
//! │ Selection │ Sinks     │ Windows     │            │             │
//! └───────────┴───────────┴─────────────┴────────────┴─────────────┘
//!                                │
//! ┌──────────────────────────────┴──────────────────────────────────┐
//! │   HTTP (retry, backoff, rate limit)   ·   OAuth2 refresh token   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// OAuth2 refresh-token authentication
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Next-page resolution
pub mod pagination;

/// Windowed time-range requests
pub mod window;

/// Context propagation
pub mod partition;

/// Record extraction from response bodies
pub mod decode;

/// Record reshaping
pub mod normalize;

/// Replication state and bookmarks
pub mod state;

/// Stream definitions, catalog and graph
pub mod streams;

/// Main execution engine
pub mod engine;

/// Tap configuration
pub mod config;

/// Connector operations
pub mod connector;

/// Path template interpolation
pub mod template;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::TapConfig;
pub use connector::SnapchatAdsConnector;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
