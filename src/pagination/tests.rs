//! Tests for pagination module

use super::*;
use crate::http::ApiResponse;
use crate::types::QueryParams;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;

fn params(pairs: &[(&str, &str)]) -> QueryParams {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn response_with_header(value: &str) -> ApiResponse {
    let mut headers = HeaderMap::new();
    headers.insert("x-next-page", HeaderValue::from_str(value).unwrap());
    ApiResponse::new(200, headers, json!({}))
}

// ============================================================================
// PageToken Tests
// ============================================================================

#[test]
fn test_page_token_with_param() {
    let token = PageToken::with_param("cursor", "abc");
    assert_eq!(token.query_params(), params(&[("cursor", "abc")]));
}

#[test]
fn test_empty_params_token_is_distinct_from_absent() {
    let empty = PageToken::params(QueryParams::new());
    assert!(empty.query_params().is_empty());

    let constant = params(&[("limit", "50")]);
    assert_eq!(build_url_params(&constant, Some(&empty), None), constant);
    assert_eq!(build_url_params(&constant, None, None), constant);
}

#[test]
fn test_window_token_params() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut token = WindowToken::starting_at(start);
    assert!(!token.is_continuation());
    assert!(token.query_params().is_empty());

    token.cursor = Some("c2".to_string());
    token.limit = Some("100".to_string());
    assert!(token.is_continuation());
    assert_eq!(
        PageToken::Window(token).query_params(),
        params(&[("cursor", "c2"), ("limit", "100")])
    );
}

// ============================================================================
// build_url_params Tests
// ============================================================================

#[test]
fn test_build_url_params_forces_ascending_order() {
    let token = PageToken::with_param("cursor", "abc");
    let built = build_url_params(&QueryParams::new(), Some(&token), Some("updated_at"));

    assert_eq!(
        built,
        params(&[("cursor", "abc"), ("order_by", "updated_at"), ("sort", "asc")])
    );
}

#[test]
fn test_build_url_params_sort_not_overridable_by_token() {
    let token = PageToken::params(params(&[("sort", "desc"), ("order_by", "name")]));
    let built = build_url_params(&QueryParams::new(), Some(&token), Some("updated_at"));

    assert_eq!(built.get("sort"), Some(&"asc".to_string()));
    assert_eq!(built.get("order_by"), Some(&"updated_at".to_string()));
}

#[test]
fn test_build_url_params_without_replication_key() {
    let built = build_url_params(&QueryParams::new(), None, None);
    assert!(built.is_empty());
}

// ============================================================================
// NextLinkPaginator Tests
// ============================================================================

#[test]
fn test_next_link_from_body() {
    let paginator = NextLinkPaginator::default();
    let response = ApiResponse::json(json!({
        "paging": {
            "next_link": "https://adsapi.snapchat.com/v1/adaccounts/a1/campaigns?cursor=abc&limit=50"
        }
    }));

    assert_eq!(
        paginator.next_params(&response),
        Some(params(&[("cursor", "abc"), ("limit", "50")]))
    );
}

#[test]
fn test_next_link_absent_is_terminal() {
    let paginator = NextLinkPaginator::default();
    assert!(paginator.next_params(&ApiResponse::json(json!({"paging": {}}))).is_none());
    assert!(paginator.next_params(&ApiResponse::json(json!({}))).is_none());
    assert!(paginator
        .next_params(&ApiResponse::json(json!({"paging": {"next_link": null}})))
        .is_none());
}

#[test]
fn test_next_link_without_query_is_empty_token() {
    let paginator = NextLinkPaginator::default();
    let response = ApiResponse::json(json!({
        "paging": {"next_link": "https://adsapi.snapchat.com/v1/me/organizations"}
    }));

    assert_eq!(paginator.next_params(&response), Some(QueryParams::new()));
    assert_eq!(
        paginator.next_token(&response, None),
        Some(PageToken::Params(QueryParams::new()))
    );
}

#[test]
fn test_header_fallback_bare_value() {
    let paginator = NextLinkPaginator::default();
    let response = response_with_header("xyz");

    assert_eq!(
        paginator.next_params(&response),
        Some(params(&[("cursor", "xyz")]))
    );
}

#[test]
fn test_header_fallback_link_value() {
    let paginator = NextLinkPaginator::default();
    let response = response_with_header("https://adsapi.snapchat.com/v1/x?cursor=h1&limit=10");

    assert_eq!(
        paginator.next_params(&response),
        Some(params(&[("cursor", "h1"), ("limit", "10")]))
    );
}

#[test]
fn test_body_link_wins_over_header() {
    let paginator = NextLinkPaginator::default();
    let mut response = response_with_header("from-header");
    response.body = json!({"paging": {"next_link": "/v1/x?cursor=from-body"}});

    assert_eq!(
        paginator.next_params(&response),
        Some(params(&[("cursor", "from-body")]))
    );
}

#[test]
fn test_header_only_paginator_ignores_body() {
    let paginator = NextLinkPaginator::header_only();
    let response = ApiResponse::json(json!({"paging": {"next_link": "/v1/x?cursor=abc"}}));
    assert!(paginator.next_params(&response).is_none());
}

// ============================================================================
// parse_link_params Tests
// ============================================================================

#[test]
fn test_parse_link_params_variants() {
    assert_eq!(
        parse_link_params("https://host/v1/path?a=1&b=two%20words"),
        params(&[("a", "1"), ("b", "two words")])
    );
    assert_eq!(
        parse_link_params("/v1/path?cursor=c"),
        params(&[("cursor", "c")])
    );
    assert_eq!(parse_link_params("cursor=c&limit=5"), params(&[("cursor", "c"), ("limit", "5")]));
    assert!(parse_link_params("https://host/v1/path").is_empty());
}
