//! Context types and traits
//!
//! A [`Context`] binds path placeholders for one invocation of a stream.

use crate::error::Result;
use crate::types::{value_to_string, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder bindings for a single stream invocation
///
/// Keys are kept sorted so that the serialized form doubles as a stable
/// partition key for bookmarks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(BTreeMap<String, JsonValue>);

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value to the context
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert a value in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// Get a value rendered as a string
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.0.get(key).map(value_to_string)
    }

    /// Whether the context has no bindings
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over bindings in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.0.iter()
    }

    /// Merge another context into a copy of this one (other wins on conflicts)
    #[must_use]
    pub fn merged(&self, other: &Context) -> Self {
        let mut merged = self.clone();
        for (k, v) in other.iter() {
            merged.0.insert(k.clone(), v.clone());
        }
        merged
    }

    /// Stable key identifying this context's bookmark partition
    pub fn partition_key(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

/// Fixed projection of parent record fields into a child context
///
/// For example organizations project `{organization_id: record.id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextProjection {
    /// (context key, record field) pairs
    fields: Vec<(String, String)>,
}

impl ContextProjection {
    /// Create an empty projection
    pub fn new() -> Self {
        Self::default()
    }

    /// Project a single record field under a context key
    pub fn single(context_key: impl Into<String>, record_field: impl Into<String>) -> Self {
        Self::new().with_field(context_key, record_field)
    }

    /// Add a projected field
    #[must_use]
    pub fn with_field(
        mut self,
        context_key: impl Into<String>,
        record_field: impl Into<String>,
    ) -> Self {
        self.fields.push((context_key.into(), record_field.into()));
        self
    }

    /// Context keys this projection produces
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Whether the projection is empty
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Derive a context from a record; `None` when a projected field is absent
    pub fn project(&self, record: &JsonValue) -> Option<Context> {
        let mut context = Context::new();
        for (key, field) in &self.fields {
            let value = record.get(field).filter(|v| !v.is_null())?;
            context.insert(key.clone(), value.clone());
        }
        Some(context)
    }
}

/// Trait for partition routers
pub trait PartitionRouter: Send + Sync {
    /// Generate the contexts a stream should be invoked with
    fn contexts(&self) -> Result<Vec<Context>>;
}
