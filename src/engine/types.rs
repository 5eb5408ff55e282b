//! Engine types
//!
//! Message types, sinks and configuration for the sync engine.

use crate::error::Result;
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// A message emitted during sync
///
/// Serializes to the Singer wire shape, e.g.
/// `{"type": "RECORD", "stream": "campaigns", "record": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Schema of a stream, emitted before its records
    Schema {
        /// Stream name
        stream: String,
        /// JSON Schema of the records
        schema: JsonValue,
        /// Primary key fields
        key_properties: Vec<String>,
        /// Replication key, if incremental
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// A single record
    Record {
        /// Stream name
        stream: String,
        /// The record
        record: JsonValue,
    },
    /// State checkpoint
    State {
        /// Full replication state
        value: JsonValue,
    },
}

impl Message {
    /// Create a schema message
    pub fn schema(
        stream: impl Into<String>,
        schema: JsonValue,
        key_properties: Vec<String>,
        bookmark_properties: Vec<String>,
    ) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties,
            bookmark_properties,
        }
    }

    /// Create a record message
    pub fn record(stream: impl Into<String>, record: JsonValue) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
        }
    }

    /// Create a state message
    pub fn state(value: JsonValue) -> Self {
        Self::State { value }
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Stream the message belongs to (`None` for state)
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    /// Serialize as a single JSON line (no trailing newline)
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Destination for emitted messages
pub trait MessageSink: Send {
    /// Accept one message
    fn send(&mut self, message: Message) -> Result<()>;
}

impl MessageSink for Vec<Message> {
    fn send(&mut self, message: Message) -> Result<()> {
        self.push(message);
        Ok(())
    }
}

/// Writes each message as one JSON line
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MessageSink for JsonLinesSink<W> {
    fn send(&mut self, message: Message) -> Result<()> {
        let line = message.to_json_line()?;
        writeln!(self.writer, "{line}")?;
        if message.is_state() {
            self.writer.flush()?;
        }
        Ok(())
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for sync operation
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Abort the run on the first failing context
    pub fail_fast: bool,
    /// Emit a state message whenever a context advances a bookmark
    pub emit_state_per_context: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fail_fast: true,
            emit_state_per_context: true,
        }
    }
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set fail fast mode
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Emit state after each context that advanced a bookmark
    #[must_use]
    pub fn with_state_per_context(mut self, emit: bool) -> Self {
        self.emit_state_per_context = emit;
        self
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Records emitted
    pub records_synced: usize,
    /// Records fetched but already replicated
    pub records_skipped: usize,
    /// Pages fetched
    pub pages_fetched: usize,
    /// Distinct selected streams that completed at least one context
    pub streams_synced: usize,
    /// (stream, context) invocations completed
    pub contexts_synced: usize,
    /// Contexts that failed
    pub errors: usize,
    /// Whether the run stopped on cancellation
    pub cancelled: bool,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add emitted records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add skipped records
    pub fn add_skipped(&mut self, count: usize) {
        self.records_skipped += count;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a completed context
    pub fn add_context(&mut self) {
        self.contexts_synced += 1;
    }

    /// Add an error
    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
