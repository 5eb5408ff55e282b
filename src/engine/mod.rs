//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `StreamRunner` - Pull-based page iterator for one (stream, context)
//! - `SyncEngine` - Walks the stream graph parent-before-child with state management
//! - `SyncConfig` - Configuration for sync operations
//! - Message types and sinks for output (Schema, Record, State)

mod runner;
mod types;

pub use runner::{Page, PageRecord, StreamRunner};
pub use types::{JsonLinesSink, Message, MessageSink, SyncConfig, SyncStats};

use crate::error::Result;
use crate::http::Fetcher;
use crate::partition::{Context, ListRouter, ParentRouter, PartitionRouter};
use crate::state::StateManager;
use crate::streams::{Selection, StreamDefinition, StreamGraph, StreamKind};
use crate::types::JsonValue;
use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One pending (stream, context) invocation
#[derive(Debug, Clone)]
struct WorkItem {
    stream: String,
    context: Option<Context>,
}

/// Outcome of running one work item
enum Outcome {
    /// Every page was consumed
    Completed(Vec<WorkItem>),
    /// Cancellation was observed before a request
    Cancelled,
}

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// Page source
    fetcher: Arc<dyn Fetcher>,
    /// Validated streams
    graph: Arc<StreamGraph>,
    /// State manager
    state: StateManager,
    /// Sync configuration
    config: SyncConfig,
    /// Statistics
    stats: SyncStats,
    /// Bookmark floor for incremental streams without state
    start_date: Option<DateTime<Utc>>,
    /// Instant the run's window ceilings are frozen at
    run_started: NaiveDateTime,
    /// Stops the run before the next request
    cancel: CancellationToken,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(fetcher: Arc<dyn Fetcher>, graph: Arc<StreamGraph>, state: StateManager) -> Self {
        Self {
            fetcher,
            graph,
            state,
            config: SyncConfig::default(),
            stats: SyncStats::default(),
            start_date: None,
            run_started: Local::now().naive_local(),
            cancel: CancellationToken::new(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the replication floor for streams without a bookmark
    #[must_use]
    pub fn with_start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Freeze window ceilings at this instant instead of now
    #[must_use]
    pub fn with_run_started(mut self, run_started: NaiveDateTime) -> Self {
        self.run_started = run_started;
        self
    }

    /// Use an externally controlled cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this run
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Run every stream in `selection`, parent before child
    ///
    /// Emits a schema per selected stream, records of selected streams that
    /// are new to their bookmark, state after contexts that advanced a
    /// bookmark, and always a final state.
    pub async fn run(
        &mut self,
        selection: &Selection,
        sink: &mut dyn MessageSink,
    ) -> Result<SyncStats> {
        let started = Instant::now();
        self.stats = SyncStats::default();

        for stream in self.graph.streams().filter(|s| selection.is_selected(&s.name)) {
            let bookmark_properties = stream.replication_key.iter().cloned().collect();
            sink.send(Message::schema(
                stream.name.clone(),
                stream.schema(),
                stream.primary_keys.clone(),
                bookmark_properties,
            ))?;
        }

        let mut stack: Vec<WorkItem> = Vec::new();
        let roots: Vec<&StreamDefinition> = self
            .graph
            .roots()
            .filter(|s| selection.is_run(&s.name))
            .collect();
        for root in roots.into_iter().rev() {
            stack.extend(expand(root, None)?.into_iter().rev());
        }

        let mut synced_streams = BTreeSet::new();
        let result = loop {
            let Some(item) = stack.pop() else {
                break Ok(());
            };

            match self.run_item(&item, selection, sink).await {
                Ok(Outcome::Completed(children)) => {
                    self.stats.add_context();
                    if selection.is_selected(&item.stream) {
                        synced_streams.insert(item.stream.clone());
                    }
                    stack.extend(children.into_iter().rev());
                }
                Ok(Outcome::Cancelled) => {
                    warn!("Sync cancelled, {} pending contexts dropped", stack.len() + 1);
                    self.stats.cancelled = true;
                    break Ok(());
                }
                Err(e) => {
                    self.stats.add_error();
                    warn!(
                        stream = %item.stream,
                        context = %context_label(item.context.as_ref()),
                        "Context failed: {e}"
                    );
                    if self.config.fail_fast {
                        break Err(e);
                    }
                }
            }
        };

        self.stats.streams_synced = synced_streams.len();
        self.stats
            .set_duration(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));

        sink.send(Message::state(self.state_value().await?))?;
        result?;

        info!(
            "Sync complete: {} records from {} contexts ({} pages) in {}ms",
            self.stats.records_synced,
            self.stats.contexts_synced,
            self.stats.pages_fetched,
            self.stats.duration_ms
        );
        Ok(self.stats.clone())
    }

    /// Run one (stream, context) to completion and derive child work
    async fn run_item(
        &mut self,
        item: &WorkItem,
        selection: &Selection,
        sink: &mut dyn MessageSink,
    ) -> Result<Outcome> {
        let graph = Arc::clone(&self.graph);
        let stream = graph.require(&item.stream)?;
        let selected = selection.is_selected(&stream.name);

        let mut routers: Vec<(&StreamDefinition, ParentRouter)> = graph
            .children(&stream.name)
            .filter(|child| selection.is_run(&child.name))
            .map(|child| {
                let router = ParentRouter::new(
                    child.name.clone(),
                    stream.child_context.clone(),
                    child.ignore_parent_replication_key,
                );
                (child, router)
            })
            .collect();

        let stored = self.state.bookmark(&stream.name, item.context.as_ref()).await;
        let fetcher = Arc::clone(&self.fetcher);
        let mut runner =
            StreamRunner::new(stream, fetcher.as_ref(), item.context.clone(), self.run_started)?
                .with_bookmark(stored);
        if let Some(start_date) = self.start_date {
            runner = runner.with_start_floor(JsonValue::String(
                start_date.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }

        debug!(
            stream = %stream.name,
            context = %context_label(item.context.as_ref()),
            "Starting context"
        );

        loop {
            if self.cancel.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }
            let Some(page) = runner.next_page().await? else {
                break;
            };
            self.stats.add_page();

            for entry in &page.records {
                for (_, router) in &mut routers {
                    router.add_record(&entry.record, entry.is_new);
                }
                if !entry.is_new {
                    self.stats.add_skipped(1);
                } else if selected {
                    sink.send(Message::record(stream.name.clone(), entry.record.clone()))?;
                    self.stats.add_records(1);
                }
            }
        }

        let pages = runner.pages();
        let advanced = runner.finish();
        if let Some(bookmark) = advanced.filter(|_| selected) {
            let changed = self
                .state
                .advance_bookmark(&stream.name, item.context.as_ref(), bookmark)
                .await?;
            if changed && self.config.emit_state_per_context {
                sink.send(Message::state(self.state_value().await?))?;
            }
        }

        debug!(
            stream = %stream.name,
            context = %context_label(item.context.as_ref()),
            pages,
            "Finished context"
        );

        let mut children = Vec::new();
        for (child, router) in &routers {
            for context in router.contexts()? {
                children.extend(expand(child, Some(context))?);
            }
        }
        Ok(Outcome::Completed(children))
    }

    async fn state_value(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(self.state.snapshot().await)?)
    }
}

/// Work items for a stream invoked with `context`
///
/// Fan-out streams produce one item per configured value, each extending
/// the given context.
fn expand(stream: &StreamDefinition, context: Option<Context>) -> Result<Vec<WorkItem>> {
    match &stream.kind {
        StreamKind::FanOut { key, values } => {
            if values.is_empty() {
                debug!(stream = %stream.name, "No fan-out values configured");
            }
            let router =
                ListRouter::new(key.clone(), values.clone()).with_base(context.unwrap_or_default());
            Ok(router
                .contexts()?
                .into_iter()
                .map(|context| WorkItem {
                    stream: stream.name.clone(),
                    context: Some(context),
                })
                .collect())
        }
        StreamKind::Paginated | StreamKind::TimeSeries { .. } => Ok(vec![WorkItem {
            stream: stream.name.clone(),
            context,
        }]),
    }
}

fn context_label(context: Option<&Context>) -> String {
    context.map_or_else(|| "-".to_string(), Context::partition_key)
}
