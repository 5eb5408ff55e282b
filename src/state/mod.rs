//! State management module
//!
//! Handles replication bookmarks and their persistence between runs.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Per-stream and per-context bookmarks
//! - `Bookmark` - Monotonic replication watermark with the keys seen at it
//! - `StateManager` - File-based state persistence

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{compare_replication_values, Bookmark, PartitionState, State, StreamState};
