//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: token refresh → HTTP requests → messages and state

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tap_snapchat_ads::engine::{JsonLinesSink, Message, SyncConfig};
use tap_snapchat_ads::http::{HttpClient, HttpClientConfig};
use tap_snapchat_ads::state::StateManager;
use tap_snapchat_ads::{Error, SnapchatAdsConnector, TapConfig};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/login/oauth2/access_token";

// ============================================================================
// Helpers
// ============================================================================

fn config_for(server: &MockServer) -> TapConfig {
    let mut config = TapConfig::new("client", "secret", "refresh");
    config.api_url = Some(server.uri());
    config.token_url = Some(format!("{}{TOKEN_PATH}", server.uri()));
    config.http.max_retries = 0;
    config.http.requests_per_second = 100;
    config
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "token_type": "Bearer",
            "expires_in": 1800
        })))
        .mount(server)
        .await;
}

async fn mount_organizations(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/me/organizations"))
        .and(header("Authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_status": "SUCCESS",
            "organizations": [
                {"sub_request_status": "SUCCESS", "organization": {
                    "id": "o1", "name": "Acme", "updated_at": "2024-02-01T00:00:00.000Z"
                }}
            ]
        })))
        .mount(server)
        .await;
}

async fn mount_ad_accounts(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/organizations/o1/adaccounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_status": "SUCCESS",
            "adaccounts": [
                {"sub_request_status": "SUCCESS", "adaccount": {
                    "id": "a1", "organization_id": "o1", "updated_at": "2024-02-10T00:00:00.000Z"
                }},
                {"sub_request_status": "SUCCESS", "adaccount": {
                    "id": "a2", "organization_id": "o1", "updated_at": "2024-02-12T00:00:00.000Z"
                }}
            ]
        })))
        .mount(server)
        .await;
}

fn records_for<'a>(messages: &'a [Message], stream: &str) -> Vec<&'a Value> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { stream: s, record } if s == stream => Some(record),
            _ => None,
        })
        .collect()
}

fn selection(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

// ============================================================================
// HTTP Client Integration Tests
// ============================================================================

#[tokio::test]
async fn test_http_client_get_json_relative_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/adaccounts/a1/campaigns"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "campaigns": [{"campaign": {"id": "c1"}}]
        })))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(
        HttpClientConfig::builder()
            .base_url(mock_server.uri())
            .no_rate_limit()
            .build(),
    )
    .unwrap();

    let mut query = tap_snapchat_ads::types::QueryParams::new();
    query.insert("limit".to_string(), "50".to_string());
    let response = client
        .get_json("/adaccounts/a1/campaigns", &query)
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body["campaigns"][0]["campaign"]["id"], "c1");
}

#[tokio::test]
async fn test_http_client_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/organizations"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(
        HttpClientConfig::builder()
            .base_url(mock_server.uri())
            .max_retries(0)
            .no_rate_limit()
            .build(),
    )
    .unwrap();

    let err = client
        .get_json("/me/organizations", &Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 403, .. }));
}

// ============================================================================
// Check
// ============================================================================

#[tokio::test]
async fn test_check_success() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_organizations(&mock_server).await;

    let connector = SnapchatAdsConnector::new(config_for(&mock_server)).unwrap();
    let result = connector.check().await;

    assert!(result.success, "{:?}", result.message);
}

#[tokio::test]
async fn test_check_rejected_refresh_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&mock_server)
        .await;

    let connector = SnapchatAdsConnector::new(config_for(&mock_server)).unwrap();
    let result = connector.check().await;

    assert!(!result.success);
    assert!(result.message.unwrap().contains("invalid_grant"));
}

// ============================================================================
// Discover
// ============================================================================

#[tokio::test]
async fn test_discover_lists_all_streams() {
    let mock_server = MockServer::start().await;
    let connector = SnapchatAdsConnector::new(config_for(&mock_server)).unwrap();

    let catalog = connector.discover();
    assert_eq!(catalog.streams.len(), 45);

    let ad_accounts = catalog.get("ad_accounts").unwrap();
    assert_eq!(ad_accounts.parent.as_deref(), Some("organizations"));
    assert_eq!(ad_accounts.replication_key.as_deref(), Some("updated_at"));

    let stats = catalog.get("ad_stats_hourly").unwrap();
    assert_eq!(stats.key_properties, vec!["id", "start_time"]);

    assert!(!catalog.get("creatives").unwrap().selected_by_default);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

// ============================================================================
// Read
// ============================================================================

#[tokio::test]
async fn test_read_parent_and_child() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_organizations(&mock_server).await;
    mount_ad_accounts(&mock_server).await;

    let connector = SnapchatAdsConnector::new(config_for(&mock_server)).unwrap();
    let streams = selection(&["organizations", "ad_accounts"]);
    let mut messages: Vec<Message> = Vec::new();

    let stats = connector
        .read(Some(&streams), StateManager::in_memory(), &mut messages, None)
        .await
        .unwrap();

    assert_eq!(stats.records_synced, 3);
    assert_eq!(stats.errors, 0);

    let orgs = records_for(&messages, "organizations");
    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0]["id"], "o1");

    let accounts = records_for(&messages, "ad_accounts");
    let ids: Vec<_> = accounts.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!("a1"), json!("a2")]);

    // Schemas lead, state closes the stream
    assert!(messages[0].is_schema());
    assert!(messages.last().unwrap().is_state());

    let Message::State { value } = messages.last().unwrap() else {
        unreachable!()
    };
    assert_eq!(
        value["streams"]["organizations"]["bookmark"]["value"],
        "2024-02-01T00:00:00.000Z"
    );
    let partitions = value["streams"]["ad_accounts"]["partitions"]
        .as_object()
        .unwrap();
    assert_eq!(partitions.len(), 1);
    let partition = partitions.values().next().unwrap();
    assert_eq!(partition["context"]["organization_id"], "o1");
    assert_eq!(partition["bookmark"]["value"], "2024-02-12T00:00:00.000Z");
}

#[tokio::test]
async fn test_read_follows_next_link() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;

    // Higher-specificity mock mounted first wins
    Mock::given(method("GET"))
        .and(path("/me/organizations"))
        .and(query_param("cursor", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organizations": [
                {"organization": {"id": "o2", "updated_at": "2024-03-01T00:00:00.000Z"}}
            ],
            "paging": {}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/organizations"))
        .and(query_param("sort", "asc"))
        .and(query_param("order_by", "updated_at"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organizations": [
                {"organization": {"id": "o1", "updated_at": "2024-02-01T00:00:00.000Z"}}
            ],
            "paging": {
                "next_link": format!("{}/me/organizations?cursor=page2&limit=50", mock_server.uri())
            }
        })))
        .mount(&mock_server)
        .await;

    let connector = SnapchatAdsConnector::new(config_for(&mock_server)).unwrap();
    let streams = selection(&["organizations"]);
    let mut messages: Vec<Message> = Vec::new();

    let stats = connector
        .read(Some(&streams), StateManager::in_memory(), &mut messages, None)
        .await
        .unwrap();

    assert_eq!(stats.pages_fetched, 2);
    let ids: Vec<_> = records_for(&messages, "organizations")
        .iter()
        .map(|r| r["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!("o1"), json!("o2")]);
}

#[tokio::test]
async fn test_read_refreshes_token_on_unauthorized() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/me/organizations"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_organizations(&mock_server).await;

    let connector = SnapchatAdsConnector::new(config_for(&mock_server)).unwrap();
    let streams = selection(&["organizations"]);
    let mut messages: Vec<Message> = Vec::new();

    connector
        .read(Some(&streams), StateManager::in_memory(), &mut messages, None)
        .await
        .unwrap();

    assert_eq!(records_for(&messages, "organizations").len(), 1);

    let token_requests = mock_server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == TOKEN_PATH)
        .count();
    assert_eq!(token_requests, 2);
}

#[tokio::test]
async fn test_read_unknown_stream() {
    let mock_server = MockServer::start().await;
    let connector = SnapchatAdsConnector::new(config_for(&mock_server)).unwrap();
    let streams = selection(&["no_such_stream"]);
    let mut messages: Vec<Message> = Vec::new();

    let err = connector
        .read(Some(&streams), StateManager::in_memory(), &mut messages, None)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("no_such_stream"));
    assert!(messages.is_empty());
}

#[tokio::test]
async fn test_read_failure_still_emits_state() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_organizations(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/organizations/o1/adaccounts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let connector = SnapchatAdsConnector::new(config_for(&mock_server)).unwrap();
    let streams = selection(&["organizations", "ad_accounts"]);
    let mut messages: Vec<Message> = Vec::new();

    let result = connector
        .read(Some(&streams), StateManager::in_memory(), &mut messages, None)
        .await;

    assert!(result.is_err());
    assert_eq!(records_for(&messages, "organizations").len(), 1);
    assert!(messages.last().unwrap().is_state());
}

#[tokio::test]
async fn test_read_continues_without_fail_fast() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_organizations(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/organizations/o1/adaccounts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/organizations/o1/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "members": [
                {"member": {"id": "m1", "updated_at": "2024-01-05T00:00:00.000Z"}}
            ]
        })))
        .mount(&mock_server)
        .await;

    let connector = SnapchatAdsConnector::new(config_for(&mock_server))
        .unwrap()
        .with_sync_config(SyncConfig::new().with_fail_fast(false));
    let streams = selection(&["ad_accounts", "members"]);
    let mut messages: Vec<Message> = Vec::new();

    let stats = connector
        .read(Some(&streams), StateManager::in_memory(), &mut messages, None)
        .await
        .unwrap();

    assert_eq!(stats.errors, 1);
    assert_eq!(records_for(&messages, "members").len(), 1);
    // organizations ran only to supply context
    assert!(records_for(&messages, "organizations").is_empty());
}

#[tokio::test]
async fn test_read_ad_account_stats() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_organizations(&mock_server).await;
    mount_ad_accounts(&mock_server).await;

    let day = (Utc::now() - Duration::days(3)).date_naive();
    let bucket_start = format!("{}T00:00:00.000Z", day + Duration::days(1));
    let bucket_end = format!("{}T00:00:00.000Z", day + Duration::days(2));

    Mock::given(method("GET"))
        .and(path("/adaccounts/a1/stats"))
        .and(query_param("granularity", "DAY"))
        .and(query_param("fields", "spend"))
        .and(query_param("omit_empty", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "timeseries_stats": [
                {"timeseries_stat": {
                    "id": "a1",
                    "type": "AD_ACCOUNT",
                    "granularity": "DAY",
                    "timeseries": [
                        {"start_time": bucket_start, "end_time": bucket_end, "stats": {"spend": 1200}}
                    ]
                }}
            ]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/adaccounts/a2/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"timeseries_stats": []})))
        .mount(&mock_server)
        .await;

    let mut config = config_for(&mock_server);
    config.start_date = format!("{day}T00:00:00Z");
    let connector = SnapchatAdsConnector::new(config).unwrap();
    let streams = selection(&["ad_account_stats_daily"]);
    let mut messages: Vec<Message> = Vec::new();

    connector
        .read(Some(&streams), StateManager::in_memory(), &mut messages, None)
        .await
        .unwrap();

    let rows = records_for(&messages, "ad_account_stats_daily");
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|r| r["id"] == "a1" && r["spend"] == 1200));
    assert_eq!(rows[0]["start_time"], json!(bucket_start));
    assert!(records_for(&messages, "ad_accounts").is_empty());
}

// ============================================================================
// State Persistence
// ============================================================================

#[tokio::test]
async fn test_state_file_resumes_incremental_sync() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_organizations(&mock_server).await;
    mount_ad_accounts(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let streams = selection(&["organizations", "ad_accounts"]);
    let connector = SnapchatAdsConnector::new(config_for(&mock_server)).unwrap();

    let mut first: Vec<Message> = Vec::new();
    connector
        .read(
            Some(&streams),
            StateManager::from_file(&state_path).unwrap(),
            &mut first,
            None,
        )
        .await
        .unwrap();
    assert_eq!(records_for(&first, "ad_accounts").len(), 2);
    assert!(state_path.exists());

    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&state_path).unwrap()).unwrap();
    assert_eq!(
        saved["streams"]["organizations"]["bookmark"]["value"],
        "2024-02-01T00:00:00.000Z"
    );

    // Same API data again: nothing new to emit
    let mut second: Vec<Message> = Vec::new();
    let stats = connector
        .read(
            Some(&streams),
            StateManager::from_file(&state_path).unwrap(),
            &mut second,
            None,
        )
        .await
        .unwrap();

    assert_eq!(stats.records_synced, 0);
    assert!(records_for(&second, "organizations").is_empty());
    assert!(records_for(&second, "ad_accounts").is_empty());
}

#[tokio::test]
async fn test_json_lines_output() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server).await;
    mount_organizations(&mock_server).await;

    let connector = SnapchatAdsConnector::new(config_for(&mock_server)).unwrap();
    let streams = selection(&["organizations"]);
    let mut sink = JsonLinesSink::new(Vec::new());

    connector
        .read(Some(&streams), StateManager::in_memory(), &mut sink, None)
        .await
        .unwrap();

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<Value> = output
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(lines[0]["type"], "SCHEMA");
    assert_eq!(lines[0]["stream"], "organizations");
    assert_eq!(lines[1]["type"], "RECORD");
    assert_eq!(lines[1]["record"]["name"], "Acme");
    assert_eq!(lines.last().unwrap()["type"], "STATE");
}
