//! Record normalization
//!
//! Reshapes raw API entries into flat records:
//! - time-series blocks expand into one record per bucket
//! - per-stream transforms synthesize keys and inject context values
//!
//! A transform that cannot find its source field filters the record out.

use crate::partition::Context;
use crate::types::{JsonObject, JsonValue};
use tracing::{debug, warn};

/// Field holding the bucket list of a time-series block
pub const TIMESERIES_FIELD: &str = "timeseries";

// ============================================================================
// Time-Series Expansion
// ============================================================================

/// Expand one time-series block into one record per bucket
///
/// Each record carries the block's own fields (minus the bucket list), the
/// bucket's `start_time`/`end_time`, and the bucket's `stats` lifted to the
/// top level. Metrics absent from a bucket are simply not present.
pub fn flatten_timeseries(block: &JsonValue) -> Vec<JsonValue> {
    let Some(fields) = block.as_object() else {
        warn!("Skipping time-series block that is not an object");
        return Vec::new();
    };

    let Some(buckets) = fields.get(TIMESERIES_FIELD).and_then(JsonValue::as_array) else {
        debug!(
            "Time-series block {} has no buckets",
            fields.get("id").map(ToString::to_string).unwrap_or_default()
        );
        return Vec::new();
    };

    let mut base = fields.clone();
    base.remove(TIMESERIES_FIELD);

    buckets
        .iter()
        .map(|bucket| {
            let mut row = base.clone();
            for key in ["start_time", "end_time"] {
                if let Some(value) = bucket.get(key) {
                    row.insert(key.to_string(), value.clone());
                }
            }
            if let Some(stats) = bucket.get("stats").and_then(JsonValue::as_object) {
                for (name, value) in stats {
                    row.insert(name.clone(), value.clone());
                }
            }
            JsonValue::Object(row)
        })
        .collect()
}

// ============================================================================
// Record Transforms
// ============================================================================

/// Per-stream record transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordTransform {
    /// `id = record[object].id`
    CopyNestedId {
        /// Nested object field
        object: String,
    },
    /// `to = record[from]`
    CopyField {
        /// Source field
        from: String,
        /// Destination field
        to: String,
    },
    /// `key = context[key]`
    InjectContext {
        /// Context key, also the destination field
        key: String,
    },
}

impl RecordTransform {
    /// Copy a nested object's `id` to the top-level `id`
    pub fn nested_id(object: impl Into<String>) -> Self {
        Self::CopyNestedId {
            object: object.into(),
        }
    }

    /// Copy a field to another field
    pub fn copy(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::CopyField {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Inject a context value into the record
    pub fn inject(key: impl Into<String>) -> Self {
        Self::InjectContext { key: key.into() }
    }

    /// Apply to a record; `None` if the source value is missing
    fn apply(&self, record: &mut JsonObject, context: Option<&Context>) -> Option<()> {
        let (target, value) = match self {
            Self::CopyNestedId { object } => {
                let id = record.get(object)?.get("id")?;
                ("id", id.clone())
            }
            Self::CopyField { from, to } => (to.as_str(), record.get(from)?.clone()),
            Self::InjectContext { key } => (key.as_str(), context?.get(key)?.clone()),
        };
        if value.is_null() {
            return None;
        }
        record.insert(target.to_string(), value);
        Some(())
    }
}

/// Apply a stream's transforms to a raw entry
///
/// Returns `None` when the record is filtered out: it is not an object, or
/// a transform could not find its source value.
pub fn post_process(
    stream: &str,
    raw: JsonValue,
    transforms: &[RecordTransform],
    context: Option<&Context>,
) -> Option<JsonValue> {
    let JsonValue::Object(mut record) = raw else {
        warn!("Stream '{}': dropping non-object record", stream);
        return None;
    };

    for transform in transforms {
        if transform.apply(&mut record, context).is_none() {
            warn!(
                "Stream '{}': dropping record, {:?} found no source value",
                stream, transform
            );
            return None;
        }
    }

    Some(JsonValue::Object(record))
}
