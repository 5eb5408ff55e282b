//! Per-context stream runner
//!
//! A pull-based iterator over the pages of one (stream, context) pair.

use crate::decode::JsonDecoder;
use crate::error::{Error, Result};
use crate::http::{ApiResponse, Fetcher};
use crate::normalize::{flatten_timeseries, post_process};
use crate::pagination::{build_url_params, NextLinkPaginator, PageToken, Paginator};
use crate::partition::Context;
use crate::state::Bookmark;
use crate::streams::{StreamDefinition, StreamKind};
use crate::template;
use crate::types::{JsonValue, QueryParams};
use crate::window::{parse_start_time, WindowDriver};
use chrono::NaiveDateTime;
use tracing::{debug, warn};

/// A record and whether it is new relative to the starting bookmark
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    /// Normalized record
    pub record: JsonValue,
    /// Not yet replicated by a previous run
    pub is_new: bool,
}

/// One fetched page after normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Records in response order
    pub records: Vec<PageRecord>,
}

impl Page {
    /// Records that are new
    pub fn new_records(&self) -> impl Iterator<Item = &JsonValue> {
        self.records.iter().filter(|r| r.is_new).map(|r| &r.record)
    }
}

/// How the runner resolves its next request
enum Pager {
    /// Cursor pagination over next links / `X-Next-Page`
    Links(NextLinkPaginator),
    /// Windowed time-series requests
    Windows(WindowDriver),
}

impl Pager {
    fn paginator(&self) -> &dyn Paginator {
        match self {
            Self::Links(paginator) => paginator,
            Self::Windows(driver) => driver,
        }
    }
}

/// Position in the page sequence
#[derive(Debug, Clone, PartialEq)]
enum Cursor {
    Start,
    Next(PageToken),
    Done,
}

/// Iterates the pages of a stream for one context
///
/// ```rust,ignore
/// let mut runner = StreamRunner::new(&stream, &fetcher, Some(context), run_started)?
///     .with_bookmark(stored);
/// while let Some(page) = runner.next_page().await? {
///     for record in page.new_records() { /* emit */ }
/// }
/// let bookmark = runner.finish();
/// ```
pub struct StreamRunner<'a> {
    stream: &'a StreamDefinition,
    fetcher: &'a dyn Fetcher,
    context: Option<Context>,
    path: String,
    decoder: JsonDecoder,
    pager: Pager,
    cursor: Cursor,
    /// Bookmark records are judged against
    starting: Option<Bookmark>,
    /// Bookmark advanced by the records seen so far
    advanced: Option<Bookmark>,
    /// Start date used when no bookmark is stored
    floor: Option<JsonValue>,
    pages: usize,
}

impl<'a> StreamRunner<'a> {
    /// Create a runner; fails if the path needs a placeholder the context lacks
    pub fn new(
        stream: &'a StreamDefinition,
        fetcher: &'a dyn Fetcher,
        context: Option<Context>,
        run_started: NaiveDateTime,
    ) -> Result<Self> {
        let path = template::render(&stream.path, &context.clone().unwrap_or_default())?;

        let links = match &stream.next_page_path {
            Some(path) => NextLinkPaginator::new(path.clone()),
            None => NextLinkPaginator::header_only(),
        };
        let pager = match &stream.kind {
            StreamKind::TimeSeries { granularity, .. } => {
                Pager::Windows(WindowDriver::new(*granularity, run_started).with_paginator(links))
            }
            StreamKind::Paginated | StreamKind::FanOut { .. } => Pager::Links(links),
        };

        Ok(Self {
            stream,
            fetcher,
            context,
            path,
            decoder: JsonDecoder::with_path(stream.records_path.clone()),
            pager,
            cursor: Cursor::Start,
            starting: None,
            advanced: None,
            floor: None,
            pages: 0,
        })
    }

    /// Resume from a stored bookmark
    #[must_use]
    pub fn with_bookmark(mut self, bookmark: Option<Bookmark>) -> Self {
        self.advanced = bookmark.clone();
        self.starting = bookmark;
        self
    }

    /// Use `start` where no bookmark is stored
    ///
    /// For paginated streams records before `start` are not new. Time-series
    /// streams only open their first window at `start`; the window bounds
    /// their buckets in the account's wall time. The floor itself is never
    /// persisted unless a record reaches it.
    #[must_use]
    pub fn with_start_floor(mut self, start: JsonValue) -> Self {
        if self.starting.is_some() {
            return self;
        }
        if let (Some(key), false) = (
            &self.stream.replication_key,
            matches!(self.stream.kind, StreamKind::TimeSeries { .. }),
        ) {
            self.starting = Some(Bookmark::new(key.clone(), start.clone()));
        }
        self.floor = Some(start);
        self
    }

    /// Rendered request path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Context this runner was invoked with
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Pages fetched so far
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Fetch and normalize the next page; `None` once the sequence ends
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        let token = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Done => return Ok(None),
            Cursor::Next(token) => Some(token),
            Cursor::Start => match &self.pager {
                Pager::Links(_) => None,
                Pager::Windows(driver) => {
                    let start = self.window_start()?;
                    match driver.first_token(start) {
                        Some(window) => Some(PageToken::Window(window)),
                        None => return Ok(None),
                    }
                }
            },
        };

        let params = self.request_params(token.as_ref());
        debug!(
            stream = %self.stream.name,
            path = %self.path,
            page = self.pages + 1,
            "Fetching page"
        );
        let response = self.fetcher.fetch(&self.path, &params).await?;
        self.pages += 1;

        let page = self.parse_page(&response)?;

        self.cursor = match self.pager.paginator().next_token(&response, token.as_ref()) {
            Some(next) if token.as_ref() == Some(&next) => {
                warn!(
                    stream = %self.stream.name,
                    "Next page token repeats the current one, stopping pagination"
                );
                Cursor::Done
            }
            Some(next) => Cursor::Next(next),
            None => Cursor::Done,
        };

        Ok(Some(page))
    }

    /// Bookmark after every page seen, never behind the starting one
    pub fn finish(self) -> Option<Bookmark> {
        self.advanced
    }

    fn window_start(&self) -> Result<NaiveDateTime> {
        match self.starting.as_ref().map(|b| &b.value).or(self.floor.as_ref()) {
            Some(start) => parse_start_time(start),
            None => Err(Error::config(format!(
                "stream '{}' has no bookmark or start date to open its first window",
                self.stream.name
            ))),
        }
    }

    fn request_params(&self, token: Option<&PageToken>) -> QueryParams {
        let constant = self.stream.constant_params();
        match (&self.pager, token) {
            (Pager::Windows(driver), Some(PageToken::Window(window))) => {
                let mut params = constant;
                params.extend(driver.window_params(window));
                params
            }
            _ => build_url_params(&constant, token, self.stream.replication_key.as_deref()),
        }
    }

    fn parse_page(&mut self, response: &ApiResponse) -> Result<Page> {
        let entries = self.decoder.decode(&response.body)?;
        let entries: Vec<JsonValue> = match self.stream.kind {
            StreamKind::TimeSeries { .. } => entries.iter().flat_map(flatten_timeseries).collect(),
            StreamKind::Paginated | StreamKind::FanOut { .. } => entries,
        };

        let mut page = Page::default();
        for raw in entries {
            let Some(record) = post_process(
                &self.stream.name,
                raw,
                &self.stream.transforms,
                self.context.as_ref(),
            ) else {
                continue;
            };
            let is_new = self.observe(&record);
            page.records.push(PageRecord { record, is_new });
        }
        Ok(page)
    }

    /// Judge a record against the starting bookmark and advance ours
    fn observe(&mut self, record: &JsonValue) -> bool {
        let (Some(key), Some(value)) = (
            self.stream.replication_key.as_deref(),
            self.stream.replication_value(record),
        ) else {
            return true;
        };
        let record_key = self.stream.record_key(record);

        let is_new = self
            .starting
            .as_ref()
            .map_or(true, |b| b.is_new(value, &record_key));
        if !is_new {
            return false;
        }

        match self.advanced.as_mut() {
            Some(bookmark) => bookmark.observe(value, &record_key),
            None => {
                self.advanced = Some(Bookmark::new(key, value.clone()).with_key(record_key));
            }
        }
        true
    }
}
