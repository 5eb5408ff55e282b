//! Stream definition types
//!
//! A stream is data: a path template, record extraction, keys, parent link,
//! and one of a closed set of behaviors.

use crate::normalize::RecordTransform;
use crate::pagination::DEFAULT_NEXT_LINK_PATH;
use crate::partition::ContextProjection;
use crate::types::{JsonValue, QueryParams};
use crate::window::Granularity;
use serde_json::{json, Map};

/// Stream behavior variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamKind {
    /// Cursor-paginated listing
    Paginated,
    /// Windowed time-series stats; each block expands into one record per bucket
    TimeSeries {
        /// Bucket size, which also fixes window step and ceiling
        granularity: Granularity,
        /// Metrics requested through `fields`
        metrics: Vec<String>,
    },
    /// Iterates a fixed list of values, one context per value
    FanOut {
        /// Context key receiving each value
        key: String,
        /// Values to iterate
        values: Vec<String>,
    },
}

/// Static definition of one stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDefinition {
    /// Unique stream name
    pub name: String,
    /// API path template with `{placeholder}` tokens
    pub path: String,
    /// JSONPath of raw record entries in a response
    pub records_path: String,
    /// Ordered primary key fields
    pub primary_keys: Vec<String>,
    /// Replication key (`None` = full refresh)
    pub replication_key: Option<String>,
    /// Parent stream name
    pub parent: Option<String>,
    /// Run for every current parent record, not only new ones
    pub ignore_parent_replication_key: bool,
    /// Context handed to each child, projected from this stream's records
    pub child_context: ContextProjection,
    /// Per-record transforms
    pub transforms: Vec<RecordTransform>,
    /// Behavior variant
    pub kind: StreamKind,
    /// Constant request parameters
    pub params: QueryParams,
    /// JSONPath of the next page link (`None` = header only)
    pub next_page_path: Option<String>,
    /// Whether the stream is synced when no explicit selection is made
    pub selected_by_default: bool,
}

impl StreamDefinition {
    /// Create a paginated root stream keyed by `id`
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        records_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            records_path: records_path.into(),
            primary_keys: vec!["id".to_string()],
            replication_key: None,
            parent: None,
            ignore_parent_replication_key: false,
            child_context: ContextProjection::new(),
            transforms: Vec::new(),
            kind: StreamKind::Paginated,
            params: QueryParams::new(),
            next_page_path: Some(DEFAULT_NEXT_LINK_PATH.to_string()),
            selected_by_default: true,
        }
    }

    /// Set the primary key fields
    #[must_use]
    pub fn primary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set the replication key
    #[must_use]
    pub fn replication_key(mut self, key: impl Into<String>) -> Self {
        self.replication_key = Some(key.into());
        self
    }

    /// Attach to a parent stream
    #[must_use]
    pub fn child_of(mut self, parent: impl Into<String>, ignore_parent_replication_key: bool) -> Self {
        self.parent = Some(parent.into());
        self.ignore_parent_replication_key = ignore_parent_replication_key;
        self
    }

    /// Declare the context this stream hands to its children
    #[must_use]
    pub fn child_context(mut self, projection: ContextProjection) -> Self {
        self.child_context = projection;
        self
    }

    /// Add a record transform
    #[must_use]
    pub fn transform(mut self, transform: RecordTransform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Set the behavior variant
    #[must_use]
    pub fn kind(mut self, kind: StreamKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add a constant request parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the next link JSONPath
    #[must_use]
    pub fn next_page_path(mut self, path: impl Into<String>) -> Self {
        self.next_page_path = Some(path.into());
        self
    }

    /// Resolve pages through the `X-Next-Page` header only
    #[must_use]
    pub fn header_pagination(mut self) -> Self {
        self.next_page_path = None;
        self
    }

    /// Exclude from the default selection
    #[must_use]
    pub fn not_selected_by_default(mut self) -> Self {
        self.selected_by_default = false;
        self
    }

    /// Whether records are replicated incrementally
    pub fn is_incremental(&self) -> bool {
        self.replication_key.is_some()
    }

    /// Constant parameters including those implied by the stream kind
    pub fn constant_params(&self) -> QueryParams {
        let mut params = self.params.clone();
        if let StreamKind::TimeSeries {
            granularity,
            metrics,
        } = &self.kind
        {
            params.insert("granularity".to_string(), granularity.as_str().to_string());
            params.insert("fields".to_string(), metrics.join(","));
        }
        params
    }

    /// Composite primary key of a record, as a stable string
    pub fn record_key(&self, record: &JsonValue) -> String {
        let values: Vec<JsonValue> = self
            .primary_keys
            .iter()
            .map(|k| record.get(k).cloned().unwrap_or(JsonValue::Null))
            .collect();
        JsonValue::Array(values).to_string()
    }

    /// Replication value of a record, if the stream and record have one
    pub fn replication_value<'a>(&self, record: &'a JsonValue) -> Option<&'a JsonValue> {
        let key = self.replication_key.as_deref()?;
        record.get(key).filter(|v| !v.is_null())
    }

    /// Minimal JSON Schema for the stream's records
    ///
    /// Declares key fields and, for stats streams, the requested metrics;
    /// other properties are allowed.
    pub fn schema(&self) -> JsonValue {
        let mut properties = Map::new();
        for key in &self.primary_keys {
            properties.insert(key.clone(), field_schema(key));
        }
        if let Some(key) = &self.replication_key {
            properties.insert(key.clone(), field_schema(key));
        }
        match &self.kind {
            StreamKind::TimeSeries { metrics, .. } => {
                for field in ["end_time", "granularity", "type", "finalized_data_end_time"] {
                    properties.insert(field.to_string(), field_schema(field));
                }
                for metric in metrics {
                    properties.insert(metric.clone(), json!({"type": ["null", "number"]}));
                }
            }
            StreamKind::FanOut { key, .. } => {
                properties.insert(key.clone(), json!({"type": ["null", "string"]}));
            }
            StreamKind::Paginated => {}
        }

        json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": true
        })
    }
}

fn field_schema(field: &str) -> JsonValue {
    if field.ends_with("_time") || field.ends_with("_at") {
        json!({"type": ["null", "string"], "format": "date-time"})
    } else {
        json!({"type": ["null", "string"]})
    }
}
