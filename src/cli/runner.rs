//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::TapConfig;
use crate::connector::SnapchatAdsConnector;
use crate::engine::{JsonLinesSink, SyncConfig};
use crate::error::{Error, Result, ResultExt};
use crate::state::StateManager;
use serde::Serialize;
use serde_json::json;
use std::io::BufWriter;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(),
            Commands::Check => self.check().await,
            Commands::Discover => self.discover(),
            Commands::Read {
                streams,
                no_fail_fast,
            } => self.read(streams, !*no_fail_fast).await,
        }
    }

    /// Load configuration
    pub(crate) fn load_config(&self) -> Result<TapConfig> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return TapConfig::from_json_str(json_str);
        }

        if let Some(path) = &self.cli.config {
            return TapConfig::from_file(path);
        }

        Err(Error::config(
            "No configuration provided (use --config or --config-json)",
        ))
    }

    /// Load state
    pub(crate) fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json).context("Invalid --state-json")
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
                .with_context(|| format!("Failed to load state from {}", path.display()))
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Show spec
    fn spec(&self) -> Result<()> {
        self.output(&json!({
            "type": "SPEC",
            "spec": SnapchatAdsConnector::spec()
        }))
    }

    /// Check connection
    async fn check(&self) -> Result<()> {
        let connector = SnapchatAdsConnector::new(self.load_config()?)?;
        let result = connector.check().await;

        self.output(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": {
                "status": if result.success { "SUCCEEDED" } else { "FAILED" },
                "message": result.message
            }
        }))?;

        if result.success {
            Ok(())
        } else {
            Err(Error::Other("Connection check failed".to_string()))
        }
    }

    /// Discover streams
    fn discover(&self) -> Result<()> {
        let connector = SnapchatAdsConnector::new(self.load_config()?)?;
        self.output(&json!({
            "type": "CATALOG",
            "catalog": connector.discover()
        }))
    }

    /// Read streams to stdout
    async fn read(&self, streams: &[String], fail_fast: bool) -> Result<()> {
        let connector = SnapchatAdsConnector::new(self.load_config()?)?
            .with_sync_config(SyncConfig::new().with_fail_fast(fail_fast));
        let state = self.load_state()?;

        let cancel = CancellationToken::new();
        let watcher = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping before the next request");
                watcher.cancel();
            }
        });

        let selection = (!streams.is_empty()).then_some(streams);
        let mut sink = JsonLinesSink::new(BufWriter::new(std::io::stdout()));
        let stats = connector
            .read(selection, state, &mut sink, Some(cancel))
            .await?;

        info!(
            "Read {} records ({} skipped) from {} streams in {}ms",
            stats.records_synced, stats.records_skipped, stats.streams_synced, stats.duration_ms
        );
        Ok(())
    }

    /// Output a message
    fn output(&self, msg: &impl Serialize) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(msg)?,
        };
        println!("{line}");
        Ok(())
    }
}
