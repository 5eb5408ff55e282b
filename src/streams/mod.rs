//! Stream definitions and their dependency graph
//!
//! # Overview
//!
//! Each resource is a [`StreamDefinition`]: a path template, record
//! extraction path, keys, an optional parent and one [`StreamKind`].
//! [`StreamGraph`] validates the whole set before any request is made, and
//! [`all_streams`] builds the Snapchat Ads catalog from a [`TapConfig`].
//!
//! [`TapConfig`]: crate::config::TapConfig

mod catalog;
mod graph;
mod types;

pub use catalog::{all_streams, AD_ACCOUNT_STATS_FIELDS, ALL_STATS_FIELDS, COUNTRY_CODE};
pub use graph::{Selection, StreamGraph};
pub use types::{StreamDefinition, StreamKind};

#[cfg(test)]
mod tests;
