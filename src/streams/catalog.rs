//! Snapchat Ads stream catalog
//!
//! Every resource the tap replicates, expressed as stream definitions.

use super::types::{StreamDefinition, StreamKind};
use crate::config::TapConfig;
use crate::normalize::RecordTransform;
use crate::partition::ContextProjection;
use crate::window::Granularity;

/// Metrics requested by campaign, ad squad and ad stats streams
pub const ALL_STATS_FIELDS: &[&str] = &[
    "android_installs",
    "attachment_avg_view_time_millis",
    "attachment_impressions",
    "attachment_quartile_1",
    "attachment_quartile_2",
    "attachment_quartile_3",
    "attachment_total_view_time_millis",
    "attachment_view_completion",
    "avg_screen_time_millis",
    "avg_view_time_millis",
    "impressions",
    "ios_installs",
    "quartile_1",
    "quartile_2",
    "quartile_3",
    "screen_time_millis",
    "spend",
    "swipe_up_percent",
    "swipes",
    "total_installs",
    "video_views",
    "video_views_time_based",
    "video_views_15s",
    "view_completion",
    "view_time_millis",
    "conversion_purchases",
    "conversion_purchases_value",
    "conversion_save",
    "conversion_start_checkout",
    "conversion_add_cart",
    "conversion_view_content",
    "conversion_add_billing",
    "conversion_sign_ups",
    "conversion_searches",
    "conversion_level_completes",
    "conversion_app_opens",
    "conversion_page_views",
    "conversion_subscribe",
    "conversion_ad_click",
    "conversion_ad_view",
    "conversion_complete_tutorial",
    "conversion_invite",
    "conversion_login",
    "conversion_share",
    "conversion_reserve",
    "conversion_achievement_unlocked",
    "conversion_add_to_wishlist",
    "conversion_spend_credits",
    "conversion_rate",
    "conversion_start_trial",
    "conversion_list_view",
    "custom_event_1",
    "custom_event_2",
    "custom_event_3",
    "custom_event_4",
    "custom_event_5",
    "attachment_frequency",
    "attachment_uniques",
    "frequency",
    "uniques",
];

/// Metrics requested by ad account stats streams
pub const AD_ACCOUNT_STATS_FIELDS: &[&str] = &["spend"];

/// Dimension streams under `/targeting`: (name, path, dimension field)
const TARGETING_DIMENSIONS: &[(&str, &str, &str)] = &[
    ("targeting_age_groups", "/targeting/demographics/age_group", "age_group"),
    ("targeting_genders", "/targeting/demographics/gender", "gender"),
    ("targeting_languages", "/targeting/demographics/languages", "languages"),
    (
        "targeting_advanced_demographics",
        "/targeting/demographics/advanced_demographics",
        "advanced_demographics",
    ),
    (
        "targeting_connection_types",
        "/targeting/device/connection_type",
        "connection_type",
    ),
    ("targeting_os_types", "/targeting/device/os_type", "os_type"),
    ("targeting_ios_versions", "/targeting/device/iOS/os_version", "os_version"),
    (
        "targeting_android_versions",
        "/targeting/device/ANDROID/os_version",
        "os_version",
    ),
    ("targeting_carriers", "/targeting/device/carrier", "carrier"),
    (
        "targeting_device_makes",
        "/targeting/device/marketing_name",
        "marketing_name",
    ),
    ("targeting_interests_dlxs", "/targeting/interests/dlxs", "dlxs"),
    ("targeting_interests_dlxc", "/targeting/interests/dlxc", "dlxc"),
    ("targeting_interests_dlxp", "/targeting/interests/dlxp", "dlxp"),
    ("targeting_interests_nln", "/targeting/interests/nln", "nln"),
    ("targeting_interests_plc", "/targeting/interests/plc", "plc"),
    (
        "targeting_location_categories",
        "/targeting/location/categories_loi",
        "categories_loi",
    ),
];

/// Context key carrying a targeting country code
pub const COUNTRY_CODE: &str = "country_code";

const UPDATED_AT: &str = "updated_at";

/// Build every stream definition for a configuration
pub fn all_streams(config: &TapConfig) -> Vec<StreamDefinition> {
    let mut streams = entity_streams();
    streams.extend(stats_streams(config));
    streams.extend(targeting_streams(config));
    streams
}

/// Account structure: organizations and everything beneath them
fn entity_streams() -> Vec<StreamDefinition> {
    let by_organization = |name: &str, path: &str, records: &str| {
        StreamDefinition::new(name, path, records)
            .replication_key(UPDATED_AT)
            .child_of("organizations", true)
    };
    let by_ad_account = |name: &str, path: &str, records: &str| {
        StreamDefinition::new(name, path, records)
            .replication_key(UPDATED_AT)
            .child_of("ad_accounts", true)
    };

    vec![
        StreamDefinition::new(
            "organizations",
            "/me/organizations",
            "$.organizations[*].organization",
        )
        .replication_key(UPDATED_AT)
        .child_context(ContextProjection::single("organization_id", "id")),
        by_organization(
            "ad_accounts",
            "/organizations/{organization_id}/adaccounts",
            "$.adaccounts[*].adaccount",
        )
        .child_context(ContextProjection::single("ad_account_id", "id")),
        by_ad_account("ads", "/adaccounts/{ad_account_id}/ads", "$.ads[*].ad")
            .child_context(ContextProjection::single("ad_id", "id")),
        by_ad_account(
            "ad_squads",
            "/adaccounts/{ad_account_id}/adsquads",
            "$.adsquads[*].adsquad",
        )
        .child_context(ContextProjection::single("ad_squad_id", "id")),
        by_ad_account(
            "audience_segments",
            "/adaccounts/{ad_account_id}/segments",
            "$.segments[*].segment",
        ),
        by_organization(
            "billing_centers",
            "/organizations/{organization_id}/billingcenters",
            "$.billingcenter[*].billingcenter",
        ),
        by_ad_account(
            "campaigns",
            "/adaccounts/{ad_account_id}/campaigns",
            "$.campaigns[*].campaign",
        )
        .child_context(ContextProjection::single("campaign_id", "id")),
        by_ad_account(
            "creatives",
            "/adaccounts/{ad_account_id}/creatives",
            "$.creatives[*].creative",
        )
        .not_selected_by_default(),
        by_organization(
            "funding_sources",
            "/organizations/{organization_id}/fundingsources",
            "$.fundingsources[*].fundingsource",
        ),
        by_ad_account("media", "/adaccounts/{ad_account_id}/media", "$.media[*].media")
            .not_selected_by_default(),
        by_organization(
            "members",
            "/organizations/{organization_id}/members",
            "$.members[*].member",
        ),
        by_ad_account(
            "phone_numbers",
            "/adaccounts/{ad_account_id}/phone_numbers",
            "$.phone_numbers[*].phone_number",
        ),
        by_ad_account("pixels", "/adaccounts/{ad_account_id}/pixels", "$.pixels[*].pixel")
            .child_context(ContextProjection::single("pixel_id", "id")),
        StreamDefinition::new(
            "pixel_domain_stats",
            "/pixels/{pixel_id}/domains/stats",
            "$.timeseries_stats[*].timeseries_stat",
        )
        .child_of("pixels", true),
        by_organization(
            "product_catalogs",
            "/organizations/{organization_id}/catalogs",
            "$.catalogs[*].catalog",
        )
        .child_context(ContextProjection::single("product_catalog_id", "id")),
        StreamDefinition::new(
            "product_sets",
            "/catalogs/{product_catalog_id}/product_sets",
            "$.product_sets[*].product_set",
        )
        .child_of("product_catalogs", true),
        StreamDefinition::new(
            "roles",
            "/organizations/{organization_id}/roles",
            "$.roles[*].role",
        )
        .child_of("organizations", true),
    ]
}

/// Daily and hourly stats for ad accounts, campaigns, ad squads and ads
fn stats_streams(config: &TapConfig) -> Vec<StreamDefinition> {
    let targets: [(&str, &str, &str, &[&str]); 4] = [
        (
            "ad_account",
            "ad_accounts",
            "/adaccounts/{ad_account_id}/stats",
            AD_ACCOUNT_STATS_FIELDS,
        ),
        (
            "campaign",
            "campaigns",
            "/campaigns/{campaign_id}/stats",
            ALL_STATS_FIELDS,
        ),
        (
            "ad_squad",
            "ad_squads",
            "/adsquads/{ad_squad_id}/stats",
            ALL_STATS_FIELDS,
        ),
        ("ad", "ads", "/ads/{ad_id}/stats", ALL_STATS_FIELDS),
    ];

    let mut streams = Vec::new();
    for granularity in [Granularity::Day, Granularity::Hour] {
        for (entity, parent, path, metrics) in targets {
            streams.push(stats_stream(
                config,
                &format!("{entity}_stats_{}", granularity.suffix()),
                parent,
                path,
                granularity,
                metrics,
            ));
        }
    }
    streams
}

fn stats_stream(
    config: &TapConfig,
    name: &str,
    parent: &str,
    path: &str,
    granularity: Granularity,
    metrics: &[&str],
) -> StreamDefinition {
    StreamDefinition::new(name, path, "$.timeseries_stats[*].timeseries_stat")
        .primary_keys(["id", "start_time"])
        .replication_key("start_time")
        .child_of(parent, true)
        .kind(StreamKind::TimeSeries {
            granularity,
            metrics: metrics.iter().map(ToString::to_string).collect(),
        })
        .param("omit_empty", "false")
        .param("conversion_source_types", "web,app,total")
        .param(
            "swipe_up_attribution_window",
            config.swipe_up_attribution_window.as_str(),
        )
        .param(
            "view_attribution_window",
            config.view_attribution_window.as_str(),
        )
}

/// Targeting dimensions and geo lookups
fn targeting_streams(config: &TapConfig) -> Vec<StreamDefinition> {
    let mut streams: Vec<StreamDefinition> = TARGETING_DIMENSIONS
        .iter()
        .map(|(name, path, field)| {
            StreamDefinition::new(*name, *path, format!("$.targeting_dimensions[*].{field}"))
        })
        .collect();

    streams.push(
        StreamDefinition::new(
            "targeting_countries",
            "/targeting/geo/country",
            "$.targeting_dimensions[*].country",
        )
        .transform(RecordTransform::nested_id("country")),
    );

    let by_country = |name: &str, dimension: &str, id_transform: RecordTransform| {
        StreamDefinition::new(
            name,
            format!("/targeting/geo/{{{COUNTRY_CODE}}}/{dimension}"),
            format!("$.targeting_dimensions[*].{dimension}"),
        )
        .primary_keys(["id", COUNTRY_CODE])
        .kind(StreamKind::FanOut {
            key: COUNTRY_CODE.to_string(),
            values: config.targeting_country_codes.clone(),
        })
        .transform(id_transform)
        .transform(RecordTransform::inject(COUNTRY_CODE))
    };

    streams.push(by_country(
        "targeting_regions",
        "region",
        RecordTransform::nested_id("region"),
    ));
    streams.push(by_country(
        "targeting_metros",
        "metro",
        RecordTransform::nested_id("metro"),
    ));
    streams.push(by_country(
        "targeting_postal_codes",
        "postal_code",
        RecordTransform::copy("postalCode", "id"),
    ));

    streams
}
