//! Pagination module
//!
//! Supports: next link in the response body, `X-Next-Page` header fallback
//!
//! # Overview
//!
//! A stream page is requested with parameters derived from a [`PageToken`].
//! The [`Paginator`] resolves the next token from each response; `None`
//! marks the terminal page. Windowed time-series streams wrap the same
//! resolver (see the `window` module).

mod strategies;
mod types;

pub use strategies::{
    parse_link_params, NextLinkPaginator, DEFAULT_NEXT_LINK_PATH, NEXT_PAGE_HEADER,
};
pub use types::{build_url_params, PageToken, Paginator, WindowToken, SORT_ASCENDING};

#[cfg(test)]
mod tests;
