//! State types for tracking replication progress
//!
//! These types are serialized to JSON and persisted between runs.

use crate::partition::Context;
use crate::types::{value_to_string, JsonValue};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Complete state for the tap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream state
    #[serde(default)]
    pub streams: BTreeMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.streams.get(stream)
    }

    /// Get mutable state for a stream, creating if needed
    pub fn get_stream_mut(&mut self, stream: &str) -> &mut StreamState {
        self.streams.entry(stream.to_string()).or_default()
    }

    /// Bookmark for a stream and optional context partition
    pub fn bookmark(&self, stream: &str, context: Option<&Context>) -> Option<&Bookmark> {
        let stream_state = self.streams.get(stream)?;
        match context {
            Some(ctx) => stream_state
                .get_partition(&ctx.partition_key())?
                .bookmark
                .as_ref(),
            None => stream_state.bookmark.as_ref(),
        }
    }

    /// Advance a bookmark, never moving it backwards
    ///
    /// Returns `true` when the stored bookmark changed.
    pub fn advance_bookmark(
        &mut self,
        stream: &str,
        context: Option<&Context>,
        candidate: Bookmark,
    ) -> bool {
        let stream_state = self.get_stream_mut(stream);
        let slot = match context {
            Some(ctx) => &mut stream_state.get_partition_mut(ctx).bookmark,
            None => &mut stream_state.bookmark,
        };

        if let Some(current) = slot.as_mut() {
            return current.merge(candidate);
        }
        *slot = Some(candidate);
        true
    }
}

/// State for a single stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    /// Bookmark for root streams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<Bookmark>,

    /// Per-context state for child and fan-out streams, keyed by partition key
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub partitions: BTreeMap<String, PartitionState>,
}

impl StreamState {
    /// Create a new empty stream state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get partition state
    pub fn get_partition(&self, partition_key: &str) -> Option<&PartitionState> {
        self.partitions.get(partition_key)
    }

    /// Get mutable partition state, creating if needed
    pub fn get_partition_mut(&mut self, context: &Context) -> &mut PartitionState {
        self.partitions
            .entry(context.partition_key())
            .or_insert_with(|| PartitionState::new(context.clone()))
    }
}

/// State for a single context partition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionState {
    /// The context this partition belongs to
    pub context: Context,

    /// Replication bookmark within this partition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<Bookmark>,
}

impl PartitionState {
    /// Create an empty partition state for `context`
    pub fn new(context: Context) -> Self {
        Self {
            context,
            bookmark: None,
        }
    }
}

// ============================================================================
// Bookmark
// ============================================================================

/// Replication bookmark: the maximum observed replication value
///
/// `keys_at_value` holds the primary keys already replicated at exactly
/// `value`, so a re-run starting from the bookmark (inclusive) does not
/// re-emit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Replication key field name
    pub replication_key: String,
    /// Maximum observed value
    pub value: JsonValue,
    /// Primary keys seen at `value`
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub keys_at_value: BTreeSet<String>,
}

impl Bookmark {
    /// Create a bookmark with no recorded keys
    pub fn new(replication_key: impl Into<String>, value: JsonValue) -> Self {
        Self {
            replication_key: replication_key.into(),
            value,
            keys_at_value: BTreeSet::new(),
        }
    }

    /// Add a primary key recorded at the bookmark value
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.keys_at_value.insert(key.into());
        self
    }

    /// Whether a record with this replication value and key has not been seen
    pub fn is_new(&self, value: &JsonValue, key: &str) -> bool {
        match compare_replication_values(value, &self.value) {
            Ordering::Greater => true,
            Ordering::Equal => !self.keys_at_value.contains(key),
            Ordering::Less => false,
        }
    }

    /// Record an observed value, moving forward only
    pub fn observe(&mut self, value: &JsonValue, key: &str) {
        match compare_replication_values(value, &self.value) {
            Ordering::Greater => {
                self.value = value.clone();
                self.keys_at_value.clear();
                self.keys_at_value.insert(key.to_string());
            }
            Ordering::Equal => {
                self.keys_at_value.insert(key.to_string());
            }
            Ordering::Less => {}
        }
    }

    /// Merge a candidate into this bookmark; returns `true` if it changed
    pub fn merge(&mut self, candidate: Bookmark) -> bool {
        match compare_replication_values(&candidate.value, &self.value) {
            Ordering::Greater => {
                *self = candidate;
                true
            }
            Ordering::Equal => {
                let before = self.keys_at_value.len();
                self.keys_at_value.extend(candidate.keys_at_value);
                self.keys_at_value.len() != before
            }
            Ordering::Less => {
                tracing::warn!(
                    "Ignoring bookmark regression for '{}': {} < {}",
                    self.replication_key,
                    value_to_string(&candidate.value),
                    value_to_string(&self.value)
                );
                false
            }
        }
    }
}

/// Order two replication values
///
/// Timestamps are compared as instants, numbers numerically, and anything
/// else by its string form.
pub fn compare_replication_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    if let (Some(a), Some(b)) = (a.as_str(), b.as_str()) {
        if let (Ok(da), Ok(db)) = (
            DateTime::parse_from_rfc3339(a),
            DateTime::parse_from_rfc3339(b),
        ) {
            return da.cmp(&db);
        }
    }

    if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
        return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    }

    value_to_string(a).cmp(&value_to_string(b))
}
