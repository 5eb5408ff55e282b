//! Partition router implementations
//!
//! Each router produces the contexts a stream is invoked with.

use super::types::{Context, ContextProjection, PartitionRouter};
use crate::error::Result;
use crate::types::JsonValue;
use std::collections::HashSet;
use tracing::warn;

// ============================================================================
// List Router
// ============================================================================

/// Fan-out router over a fixed list of values
///
/// Produces one context per value, each merged into an optional base context.
#[derive(Debug, Clone)]
pub struct ListRouter {
    /// Context key that receives each value
    key: String,
    /// Values to iterate
    values: Vec<String>,
    /// Context every produced context extends
    base: Context,
}

impl ListRouter {
    /// Create a new list router
    pub fn new(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            values,
            base: Context::new(),
        }
    }

    /// Extend a base context (e.g. one derived from a parent record)
    #[must_use]
    pub fn with_base(mut self, base: Context) -> Self {
        self.base = base;
        self
    }
}

impl PartitionRouter for ListRouter {
    fn contexts(&self) -> Result<Vec<Context>> {
        Ok(self
            .values
            .iter()
            .map(|v| {
                let mut context = self.base.clone();
                context.insert(self.key.clone(), v.clone());
                context
            })
            .collect())
    }
}

// ============================================================================
// Parent Router
// ============================================================================

/// Parent record-based router
///
/// Projects the records of one parent invocation into child contexts as they
/// arrive; only the distinct projections are kept. Unless the child ignores
/// the parent's replication key, only records that were new to the parent's
/// bookmark fan out.
#[derive(Debug, Clone)]
pub struct ParentRouter {
    /// Child stream name (for diagnostics)
    child: String,
    /// Parent record projection
    projection: ContextProjection,
    /// Whether every current parent record fans out
    ignore_parent_replication_key: bool,
    /// Distinct child contexts in first-seen order
    contexts: Vec<Context>,
    /// Partition keys already collected
    seen: HashSet<String>,
}

impl ParentRouter {
    /// Create a new parent router
    pub fn new(
        child: impl Into<String>,
        projection: ContextProjection,
        ignore_parent_replication_key: bool,
    ) -> Self {
        Self {
            child: child.into(),
            projection,
            ignore_parent_replication_key,
            contexts: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Offer a parent record; projected if the child's policy admits it
    pub fn add_record(&mut self, record: &JsonValue, is_new: bool) {
        if !(self.ignore_parent_replication_key || is_new) {
            return;
        }
        match self.projection.project(record) {
            Some(context) => {
                if self.seen.insert(context.partition_key()) {
                    self.contexts.push(context);
                }
            }
            None => warn!(
                stream = %self.child,
                "Parent record lacks a projected field, skipping child context"
            ),
        }
    }

    /// Number of distinct child contexts collected
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether no record will fan out
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl PartitionRouter for ParentRouter {
    fn contexts(&self) -> Result<Vec<Context>> {
        Ok(self.contexts.clone())
    }
}
