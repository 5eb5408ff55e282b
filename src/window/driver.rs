//! Window state machine

use super::types::{Granularity, WINDOW_TIME_FORMAT};
use crate::http::ApiResponse;
use crate::pagination::{NextLinkPaginator, PageToken, Paginator, WindowToken};
use crate::types::QueryParams;
use chrono::NaiveDateTime;
use tracing::debug;

/// Drives `[start_time, end_time)` windows up to a frozen ceiling
#[derive(Debug, Clone)]
pub struct WindowDriver {
    granularity: Granularity,
    ceiling: NaiveDateTime,
    paginator: NextLinkPaginator,
}

impl WindowDriver {
    /// Create a driver whose ceiling is `run_started` truncated to the bucket
    pub fn new(granularity: Granularity, run_started: NaiveDateTime) -> Self {
        Self {
            granularity,
            ceiling: granularity.truncate(run_started),
            paginator: NextLinkPaginator::default(),
        }
    }

    /// Use a custom in-window resolver
    #[must_use]
    pub fn with_paginator(mut self, paginator: NextLinkPaginator) -> Self {
        self.paginator = paginator;
        self
    }

    /// The frozen upper bound of every window
    pub fn ceiling(&self) -> NaiveDateTime {
        self.ceiling
    }

    /// Granularity driving step and ceiling
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Token for the first window, or `None` when there is nothing to request
    pub fn first_token(&self, start: NaiveDateTime) -> Option<WindowToken> {
        if start >= self.ceiling {
            debug!(
                "Window start {} is at or past ceiling {}, nothing to request",
                start, self.ceiling
            );
            return None;
        }
        Some(WindowToken::starting_at(start))
    }

    /// `[start, end)` for the window a token points into
    pub fn bounds(&self, token: &WindowToken) -> (NaiveDateTime, NaiveDateTime) {
        let end = std::cmp::min(token.start_time + self.granularity.step(), self.ceiling);
        (token.start_time, end)
    }

    /// Window bounds plus cursor/limit for a request
    pub fn window_params(&self, token: &WindowToken) -> QueryParams {
        let (start, end) = self.bounds(token);
        let mut params = token.query_params();
        params.insert(
            "start_time".to_string(),
            start.format(WINDOW_TIME_FORMAT).to_string(),
        );
        params.insert(
            "end_time".to_string(),
            end.format(WINDOW_TIME_FORMAT).to_string(),
        );
        params
    }

    /// Next token after `current`'s response
    ///
    /// A next link carrying a cursor continues the window; otherwise the
    /// driver advances to the next window until the ceiling is reached.
    pub fn next_window(&self, response: &ApiResponse, current: &WindowToken) -> Option<WindowToken> {
        if let Some(mut params) = self.paginator.next_params(response) {
            if let Some(cursor) = params.remove("cursor") {
                return Some(WindowToken {
                    start_time: current.start_time,
                    cursor: Some(cursor),
                    limit: params.remove("limit"),
                });
            }
        }

        let (_, end) = self.bounds(current);
        if end < self.ceiling {
            Some(WindowToken::starting_at(end))
        } else {
            None
        }
    }
}

impl Paginator for WindowDriver {
    fn next_params(&self, response: &ApiResponse) -> Option<QueryParams> {
        self.paginator.next_params(response)
    }

    fn next_token(&self, response: &ApiResponse, previous: Option<&PageToken>) -> Option<PageToken> {
        match previous {
            Some(PageToken::Window(current)) => {
                self.next_window(response, current).map(PageToken::Window)
            }
            _ => None,
        }
    }
}
