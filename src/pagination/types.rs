//! Pagination types and traits
//!
//! Defines the page token model and request parameter construction shared by
//! all streams.

use crate::http::ApiResponse;
use crate::types::QueryParams;
use chrono::NaiveDateTime;

/// Sort direction forced on every request of an incremental stream
pub const SORT_ASCENDING: &str = "asc";

/// Opaque description of how to fetch the next page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    /// Query parameters parsed from a next link or `X-Next-Page` header
    ///
    /// An empty map is a valid token: continue with no extra parameters.
    Params(QueryParams),
    /// Position within a windowed time-series stream
    Window(WindowToken),
}

impl PageToken {
    /// Create a params token
    pub fn params(params: QueryParams) -> Self {
        Self::Params(params)
    }

    /// Create a params token with a single parameter
    pub fn with_param(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut params = QueryParams::new();
        params.insert(key.into(), value.into());
        Self::Params(params)
    }

    /// Query parameters carried by this token
    pub fn query_params(&self) -> QueryParams {
        match self {
            Self::Params(params) => params.clone(),
            Self::Window(window) => window.query_params(),
        }
    }
}

/// Token for windowed streams: `{start_time, cursor?, limit?}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowToken {
    /// Start of the window to request
    pub start_time: NaiveDateTime,
    /// Pagination cursor within the window
    pub cursor: Option<String>,
    /// Page size carried over from the next link
    pub limit: Option<String>,
}

impl WindowToken {
    /// Token that opens a new window at `start_time`
    pub fn starting_at(start_time: NaiveDateTime) -> Self {
        Self {
            start_time,
            cursor: None,
            limit: None,
        }
    }

    /// Whether this token continues a window rather than opening one
    pub fn is_continuation(&self) -> bool {
        self.cursor.is_some()
    }

    /// Cursor/limit parameters (window bounds are added by the driver)
    pub fn query_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some(cursor) = &self.cursor {
            params.insert("cursor".to_string(), cursor.clone());
        }
        if let Some(limit) = &self.limit {
            params.insert("limit".to_string(), limit.clone());
        }
        params
    }
}

/// Core trait for resolving the next page from a response
pub trait Paginator: Send + Sync {
    /// Return the next page's parameters, or `None` on the terminal page
    fn next_params(&self, response: &ApiResponse) -> Option<QueryParams>;

    /// Return the next page token given the token used for this response
    fn next_token(
        &self,
        response: &ApiResponse,
        _previous: Option<&PageToken>,
    ) -> Option<PageToken> {
        self.next_params(response).map(PageToken::Params)
    }
}

/// Build request parameters for a paginated stream
///
/// Constant parameters first, then the token's parameters. When the stream has
/// a replication key, ascending order by that key is forced on every request
/// so page boundaries never skip records that appear mid-run.
pub fn build_url_params(
    constant: &QueryParams,
    token: Option<&PageToken>,
    replication_key: Option<&str>,
) -> QueryParams {
    let mut params = constant.clone();
    if let Some(token) = token {
        params.extend(token.query_params());
    }
    if let Some(key) = replication_key {
        params.insert("sort".to_string(), SORT_ASCENDING.to_string());
        params.insert("order_by".to_string(), key.to_string());
    }
    params
}
