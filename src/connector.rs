//! Snapchat Ads connector
//!
//! Ties configuration, the HTTP client, the stream catalog and the sync
//! engine together behind the `spec` / `check` / `discover` / `read`
//! operations.

use crate::auth::TokenProvider;
use crate::config::TapConfig;
use crate::engine::{MessageSink, SyncConfig, SyncEngine, SyncStats};
use crate::error::Result;
use crate::http::{Fetcher, HttpClient};
use crate::state::StateManager;
use crate::streams::{all_streams, StreamDefinition, StreamGraph};
use crate::types::{JsonValue, QueryParams, SyncMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Path requested by `check`
pub const CHECK_PATH: &str = "/me/organizations";

// ============================================================================
// Connector Spec
// ============================================================================

/// Connector specification returned by `spec()`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorSpec {
    /// Connector name
    pub name: String,

    /// Crate version
    pub version: String,

    /// Description
    pub description: String,

    /// JSON Schema of the configuration
    pub connection_specification: JsonValue,
}

// ============================================================================
// Check Result
// ============================================================================

/// Result of a connection check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the check succeeded
    pub success: bool,

    /// Error message if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    /// Create a successful check result
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Create a failed check result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Discovered streams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// One entry per stream, in declaration order
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Find an entry by stream name
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|s| s.stream == name)
    }
}

/// Description of one stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream name
    pub stream: String,
    /// Primary key fields
    pub key_properties: Vec<String>,
    /// Replication key, if incremental
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,
    /// Replication method
    pub sync_mode: SyncMode,
    /// Parent stream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Synced when no explicit selection is made
    pub selected_by_default: bool,
    /// JSON Schema of the records
    pub schema: JsonValue,
}

impl From<&StreamDefinition> for CatalogEntry {
    fn from(stream: &StreamDefinition) -> Self {
        Self {
            stream: stream.name.clone(),
            key_properties: stream.primary_keys.clone(),
            replication_key: stream.replication_key.clone(),
            sync_mode: if stream.is_incremental() {
                SyncMode::Incremental
            } else {
                SyncMode::FullRefresh
            },
            parent: stream.parent.clone(),
            selected_by_default: stream.selected_by_default,
            schema: stream.schema(),
        }
    }
}

// ============================================================================
// Connector
// ============================================================================

/// The Snapchat Ads connector
#[derive(Debug)]
pub struct SnapchatAdsConnector {
    config: TapConfig,
    client: Arc<HttpClient>,
    graph: Arc<StreamGraph>,
    sync: SyncConfig,
}

impl SnapchatAdsConnector {
    /// Validate the configuration and build the client and stream graph
    pub fn new(config: TapConfig) -> Result<Self> {
        config.validate()?;
        let client = HttpClient::with_auth(config.http_client_config(), config.auth_config())?;
        Self::with_client(config, client)
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(config: TapConfig, client: HttpClient) -> Result<Self> {
        config.validate()?;
        let graph = StreamGraph::new(all_streams(&config))?;
        Ok(Self {
            config,
            client: Arc::new(client),
            graph: Arc::new(graph),
            sync: SyncConfig::default(),
        })
    }

    /// Set sync behavior for `read`
    #[must_use]
    pub fn with_sync_config(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    /// Connector specification
    pub fn spec() -> ConnectorSpec {
        ConnectorSpec {
            name: crate::NAME.to_string(),
            version: crate::VERSION.to_string(),
            description: "Extracts Snapchat Marketing API resources with incremental state"
                .to_string(),
            connection_specification: TapConfig::json_schema(),
        }
    }

    /// The validated configuration
    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// The validated stream graph
    pub fn graph(&self) -> &StreamGraph {
        &self.graph
    }

    /// Refresh the access token and request the caller's organizations
    pub async fn check(&self) -> CheckResult {
        if let Some(auth) = self.client.authenticator() {
            if let Err(e) = auth.access_token().await {
                warn!("Credential check failed: {e}");
                return CheckResult::failure(format!("Authentication failed: {e}"));
            }
        }

        let mut params = QueryParams::new();
        params.insert("limit".to_string(), "1".to_string());
        match self.client.fetch(CHECK_PATH, &params).await {
            Ok(_) => {
                info!("Connection check succeeded");
                CheckResult::success()
            }
            Err(e) => {
                warn!("Connection check failed: {e}");
                CheckResult::failure(e.to_string())
            }
        }
    }

    /// List every stream with its keys and schema
    pub fn discover(&self) -> Catalog {
        Catalog {
            streams: self.graph.streams().map(CatalogEntry::from).collect(),
        }
    }

    /// Sync the selected streams (all default streams when `None`)
    pub async fn read(
        &self,
        streams: Option<&[String]>,
        state: StateManager,
        sink: &mut dyn MessageSink,
        cancel: Option<CancellationToken>,
    ) -> Result<SyncStats> {
        let selection = self.graph.select(streams)?;
        info!(
            "Syncing {} selected streams",
            selection.selected().count()
        );

        let fetcher: Arc<dyn Fetcher> = self.client.clone();
        let mut engine = SyncEngine::new(fetcher, Arc::clone(&self.graph), state)
            .with_config(self.sync.clone())
            .with_start_date(self.config.start_date()?);
        if let Some(cancel) = cancel {
            engine = engine.with_cancellation(cancel);
        }

        engine.run(&selection, sink).await
    }
}
