//! Tests for stream definitions, graph validation and the catalog

use super::*;
use crate::config::TapConfig;
use crate::error::Error;
use crate::partition::ContextProjection;
use crate::window::Granularity;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn config_with_countries(codes: &[&str]) -> TapConfig {
    let mut config = TapConfig::new("id", "secret", "refresh");
    config.targeting_country_codes = codes.iter().map(ToString::to_string).collect();
    config
}

fn catalog() -> StreamGraph {
    StreamGraph::new(all_streams(&config_with_countries(&["us", "ca"]))).unwrap()
}

// ============================================================================
// Definition Tests
// ============================================================================

#[test]
fn test_definition_defaults() {
    let stream = StreamDefinition::new("roles", "/organizations/{organization_id}/roles", "$.roles[*].role");
    assert_eq!(stream.primary_keys, vec!["id"]);
    assert!(!stream.is_incremental());
    assert_eq!(stream.kind, StreamKind::Paginated);
    assert_eq!(stream.next_page_path.as_deref(), Some("$.paging.next_link"));
    assert!(stream.selected_by_default);
}

#[test]
fn test_record_key_composite() {
    let stream = StreamDefinition::new("targeting_regions", "/x", "$.y")
        .primary_keys(["id", "country_code"]);
    let record = json!({"id": "r1", "country_code": "us", "name": "Texas"});
    assert_eq!(stream.record_key(&record), r#"["r1","us"]"#);

    let missing = json!({"id": "r1"});
    assert_eq!(stream.record_key(&missing), r#"["r1",null]"#);
}

#[test]
fn test_replication_value() {
    let stream = StreamDefinition::new("campaigns", "/x", "$.y").replication_key("updated_at");
    let record = json!({"id": "c1", "updated_at": "2024-01-01T00:00:00.000Z"});
    assert_eq!(
        stream.replication_value(&record),
        Some(&json!("2024-01-01T00:00:00.000Z"))
    );
    assert!(stream.replication_value(&json!({"id": "c1", "updated_at": null})).is_none());

    let full_refresh = StreamDefinition::new("roles", "/x", "$.y");
    assert!(full_refresh.replication_value(&record).is_none());
}

#[test]
fn test_time_series_constant_params() {
    let stream = StreamDefinition::new("ad_stats_daily", "/ads/{ad_id}/stats", "$.y")
        .kind(StreamKind::TimeSeries {
            granularity: Granularity::Day,
            metrics: vec!["impressions".to_string(), "spend".to_string()],
        })
        .param("omit_empty", "false");

    let params = stream.constant_params();
    assert_eq!(params.get("granularity").map(String::as_str), Some("DAY"));
    assert_eq!(params.get("fields").map(String::as_str), Some("impressions,spend"));
    assert_eq!(params.get("omit_empty").map(String::as_str), Some("false"));
}

#[test]
fn test_schema_lists_keys_and_metrics() {
    let stream = StreamDefinition::new("ad_account_stats_hourly", "/x", "$.y")
        .primary_keys(["id", "start_time"])
        .replication_key("start_time")
        .kind(StreamKind::TimeSeries {
            granularity: Granularity::Hour,
            metrics: vec!["spend".to_string()],
        });

    let schema = stream.schema();
    let properties = schema["properties"].as_object().unwrap();
    assert!(properties.contains_key("id"));
    assert_eq!(properties["start_time"]["format"], "date-time");
    assert_eq!(properties["spend"]["type"], json!(["null", "number"]));
    assert!(properties.contains_key("end_time"));
    assert_eq!(schema["additionalProperties"], true);
}

// ============================================================================
// Graph Validation Tests
// ============================================================================

fn parent() -> StreamDefinition {
    StreamDefinition::new("organizations", "/me/organizations", "$.organizations[*].organization")
        .child_context(ContextProjection::single("organization_id", "id"))
}

#[test]
fn test_graph_rejects_duplicate_names() {
    let err = StreamGraph::new(vec![parent(), parent()]).unwrap_err();
    assert!(matches!(err, Error::Graph { .. }));
    assert!(err.to_string().contains("duplicate"));
}

#[test]
fn test_graph_rejects_unknown_parent() {
    let orphan = StreamDefinition::new("roles", "/organizations/{organization_id}/roles", "$.r")
        .child_of("nowhere", true);
    let err = StreamGraph::new(vec![parent(), orphan]).unwrap_err();
    assert!(err.to_string().contains("unknown parent 'nowhere'"));
}

#[test]
fn test_graph_rejects_cycle() {
    let a = StreamDefinition::new("a", "/a", "$.a").child_of("b", true);
    let b = StreamDefinition::new("b", "/b", "$.b").child_of("a", true);
    let err = StreamGraph::new(vec![a, b]).unwrap_err();
    assert!(err.to_string().contains("cycle"));
}

#[test]
fn test_graph_rejects_unresolvable_placeholder() {
    let child = StreamDefinition::new("ads", "/adaccounts/{ad_account_id}/ads", "$.ads[*].ad")
        .child_of("organizations", true);
    let err = StreamGraph::new(vec![parent(), child]).unwrap_err();
    assert!(err.to_string().contains("ad_account_id"));

    let root = StreamDefinition::new("regions", "/targeting/geo/{country_code}/region", "$.r");
    assert!(StreamGraph::new(vec![root]).is_err());
}

#[test]
fn test_graph_accepts_fan_out_placeholder() {
    let stream = StreamDefinition::new("regions", "/targeting/geo/{country_code}/region", "$.r")
        .kind(StreamKind::FanOut {
            key: "country_code".to_string(),
            values: vec![],
        });
    assert!(StreamGraph::new(vec![stream]).is_ok());
}

#[test]
fn test_graph_children_and_ancestors() {
    let graph = catalog();

    let children: Vec<&str> = graph.children("campaigns").map(|s| s.name.as_str()).collect();
    assert_eq!(children, vec!["campaign_stats_daily", "campaign_stats_hourly"]);

    let ancestors: Vec<&str> = graph
        .ancestors("ad_stats_hourly")
        .into_iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(ancestors, vec!["ads", "ad_accounts", "organizations"]);

    assert!(graph.ancestors("organizations").is_empty());
}

// ============================================================================
// Selection Tests
// ============================================================================

#[test]
fn test_default_selection_skips_creatives_and_media() {
    let graph = catalog();
    let selection = graph.select(None).unwrap();

    assert!(selection.is_selected("organizations"));
    assert!(selection.is_selected("targeting_postal_codes"));
    assert!(!selection.is_selected("creatives"));
    assert!(!selection.is_selected("media"));
    assert!(!selection.is_run("media"));
}

#[test]
fn test_explicit_selection_runs_ancestors() {
    let graph = catalog();
    let selection = graph.select(Some(&["campaign_stats_daily".to_string()])).unwrap();

    assert!(selection.is_selected("campaign_stats_daily"));
    for ancestor in ["campaigns", "ad_accounts", "organizations"] {
        assert!(selection.is_run(ancestor));
        assert!(!selection.is_selected(ancestor));
    }
    assert!(!selection.is_run("ads"));
    assert_eq!(selection.selected().collect::<Vec<_>>(), vec!["campaign_stats_daily"]);
}

#[test]
fn test_selection_rejects_unknown_stream() {
    let graph = catalog();
    let err = graph.select(Some(&["no_such_stream".to_string()])).unwrap_err();
    assert!(matches!(err, Error::StreamNotFound { .. }));
}

// ============================================================================
// Catalog Tests
// ============================================================================

#[test]
fn test_catalog_is_valid_and_complete() {
    let graph = catalog();
    assert_eq!(graph.len(), 45);
    assert_eq!(
        graph.roots().filter(|s| !s.name.starts_with("targeting_")).count(),
        1
    );
}

#[test]
fn test_catalog_pixels_and_domain_stats_are_distinct() {
    let graph = catalog();
    let pixels = graph.get("pixels").unwrap();
    assert_eq!(pixels.path, "/adaccounts/{ad_account_id}/pixels");

    let domain_stats = graph.get("pixel_domain_stats").unwrap();
    assert_eq!(domain_stats.parent.as_deref(), Some("pixels"));
    assert!(!domain_stats.is_incremental());
    assert_eq!(domain_stats.kind, StreamKind::Paginated);
}

#[test_case("ad_account_stats_daily", Granularity::Day, 1 ; "ad account daily requests spend only")]
#[test_case("ad_account_stats_hourly", Granularity::Hour, 1 ; "ad account hourly requests spend only")]
#[test_case("campaign_stats_daily", Granularity::Day, ALL_STATS_FIELDS.len() ; "campaign daily")]
#[test_case("ad_stats_hourly", Granularity::Hour, ALL_STATS_FIELDS.len() ; "ad hourly")]
fn test_catalog_stats_streams(name: &str, expected: Granularity, metric_count: usize) {
    let graph = catalog();
    let stream = graph.get(name).unwrap();

    let StreamKind::TimeSeries { granularity, metrics } = &stream.kind else {
        panic!("{name} is not a time-series stream");
    };
    assert_eq!(*granularity, expected);
    assert_eq!(metrics.len(), metric_count);
    assert_eq!(stream.primary_keys, vec!["id", "start_time"]);
    assert_eq!(stream.replication_key.as_deref(), Some("start_time"));
    assert!(stream.ignore_parent_replication_key);

    let params = stream.constant_params();
    assert_eq!(params.get("omit_empty").map(String::as_str), Some("false"));
    assert_eq!(
        params.get("conversion_source_types").map(String::as_str),
        Some("web,app,total")
    );
    assert_eq!(
        params.get("swipe_up_attribution_window").map(String::as_str),
        Some("28_DAY")
    );
    assert_eq!(params.get("view_attribution_window").map(String::as_str), Some("1_DAY"));
}

#[test]
fn test_catalog_fan_out_streams_use_config_countries() {
    let graph = catalog();
    for name in ["targeting_regions", "targeting_metros", "targeting_postal_codes"] {
        let stream = graph.get(name).unwrap();
        assert_eq!(stream.primary_keys, vec!["id", "country_code"]);
        assert_eq!(
            stream.kind,
            StreamKind::FanOut {
                key: COUNTRY_CODE.to_string(),
                values: vec!["us".to_string(), "ca".to_string()],
            }
        );
    }
    assert_eq!(
        graph.get("targeting_postal_codes").unwrap().path,
        "/targeting/geo/{country_code}/postal_code"
    );
}

#[test]
fn test_catalog_targeting_record_paths() {
    let graph = catalog();
    assert_eq!(
        graph.get("targeting_android_versions").unwrap().records_path,
        "$.targeting_dimensions[*].os_version"
    );
    assert_eq!(
        graph.get("targeting_device_makes").unwrap().path,
        "/targeting/device/marketing_name"
    );
}
