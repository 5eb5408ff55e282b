//! Pagination strategy implementations

use super::types::Paginator;
use crate::decode::first_match;
use crate::http::ApiResponse;
use crate::types::QueryParams;
use serde_json::Value;
use url::Url;

/// Default JSONPath of the next page link in Snapchat responses
pub const DEFAULT_NEXT_LINK_PATH: &str = "$.paging.next_link";

/// Header consulted when the body carries no next link
pub const NEXT_PAGE_HEADER: &str = "X-Next-Page";

// ============================================================================
// Next Link Pagination
// ============================================================================

/// Next link pagination
///
/// Extracts the next page link from the response body and turns its query
/// string into the next request's parameters. Falls back to the
/// `X-Next-Page` header when the body has no link.
/// Common pattern:
/// - `{ "paging": { "next_link": "https://.../campaigns?cursor=abc&limit=50" } }`
#[derive(Debug, Clone)]
pub struct NextLinkPaginator {
    /// JSONPath to extract the next link from the response
    pub path: Option<String>,
    /// Fallback header name
    pub header: String,
}

impl Default for NextLinkPaginator {
    fn default() -> Self {
        Self::new(DEFAULT_NEXT_LINK_PATH)
    }
}

impl NextLinkPaginator {
    /// Create a paginator reading the next link from `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            header: NEXT_PAGE_HEADER.to_string(),
        }
    }

    /// Create a paginator that only consults the `X-Next-Page` header
    pub fn header_only() -> Self {
        Self {
            path: None,
            header: NEXT_PAGE_HEADER.to_string(),
        }
    }

    fn link_from_body(&self, body: &Value) -> Option<String> {
        let path = self.path.as_deref()?;
        match first_match(body, path)? {
            Value::String(link) if !link.trim().is_empty() => Some(link),
            _ => None,
        }
    }

    fn link_from_header(&self, response: &ApiResponse) -> Option<String> {
        response
            .headers
            .get(self.header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
    }
}

impl Paginator for NextLinkPaginator {
    fn next_params(&self, response: &ApiResponse) -> Option<QueryParams> {
        if let Some(link) = self.link_from_body(&response.body) {
            return Some(parse_link_params(&link));
        }

        let header = self.link_from_header(response)?;
        if header.contains('=') || header.contains('?') {
            Some(parse_link_params(&header))
        } else {
            // Bare pointer value
            let mut params = QueryParams::new();
            params.insert("cursor".to_string(), header);
            Some(params)
        }
    }
}

/// Parse the query string of a link (absolute URL, relative URL, or bare query)
pub fn parse_link_params(link: &str) -> QueryParams {
    if let Ok(url) = Url::parse(link) {
        return url.query_pairs().into_owned().collect();
    }

    let query = link.split_once('?').map_or(link, |(_, q)| q);
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .filter(|(k, _)| !k.is_empty())
        .collect()
}
