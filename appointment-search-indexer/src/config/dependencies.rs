//! Dependency initialization and wiring for the appointment indexer.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{IndexerConfig, SiteConfig};
use crate::indexer::AppointmentIndexer;
use crate::source::HttpBookingSource;
use crate::IndexingError;
use appointment_search_repository::config::{DEFAULT_SOLR_CORE, DEFAULT_SOLR_URL};
use appointment_search_repository::{SearchIndexProvider, SolrConfig, SolrProvider};

use super::settings::{DEFAULT_SITE_NAME, DEFAULT_SITE_ROOT_URL};

/// Default booking API URL.
const DEFAULT_BOOKING_API_URL: &str = "http://localhost:8080/appointment/api";

/// Default commit delay requested from Solr, in milliseconds.
const DEFAULT_COMMIT_WITHIN_MS: u64 = 1000;

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for Solr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Anything else falls back to "retry".
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!(value = %value, "Invalid SOLR_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }

    /// Read the connection mode from `SOLR_CONNECTION_MODE` (default: retry).
    fn from_env() -> Self {
        Self::parse(&env::var("SOLR_CONNECTION_MODE").unwrap_or_else(|_| "retry".to_string()))
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The indexer, ready to run a full pass.
    pub indexer: Arc<AppointmentIndexer>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SOLR_URL`: Solr base URL (default: http://localhost:8983/solr)
    /// - `SOLR_CORE`: Solr core (default: lutece)
    /// - `SOLR_COMMIT_WITHIN_MS`: commit delay requested from Solr (default: 1000)
    /// - `SOLR_CONNECTION_MODE`: Connection mode - "fail-fast" or "retry" (default: retry)
    /// - `SOLR_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `BOOKING_API_URL`: booking backend API (default: http://localhost:8080/appointment/api)
    /// - `SITE_NAME`: site name prefixed to uids (default: lutece)
    /// - `SITE_ROOT_URL`: front-office root URL (default: http://localhost:8080/lutece/)
    /// - `INDEXER_ENABLED`: set to false to disable indexing (default: true)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails (only in fail-fast mode for Solr)
    pub async fn new() -> Result<Self, IndexingError> {
        let solr_url = env_or("SOLR_URL", DEFAULT_SOLR_URL);
        let solr_core = env_or("SOLR_CORE", DEFAULT_SOLR_CORE);
        let commit_within_ms = env_parse("SOLR_COMMIT_WITHIN_MS", DEFAULT_COMMIT_WITHIN_MS);
        let connection_mode = ConnectionMode::from_env();
        let retry_interval = env_parse("SOLR_RETRY_INTERVAL_SECS", DEFAULT_RETRY_INTERVAL_SECS);
        let booking_api_url = env_or("BOOKING_API_URL", DEFAULT_BOOKING_API_URL);
        let site = SiteConfig::new(
            env_or("SITE_NAME", DEFAULT_SITE_NAME),
            env_or("SITE_ROOT_URL", DEFAULT_SITE_ROOT_URL),
        );
        let enabled = env_parse("INDEXER_ENABLED", true);

        info!(
            solr_url = %solr_url,
            solr_core = %solr_core,
            booking_api_url = %booking_api_url,
            site = %site.name,
            enabled,
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval,
            "Initializing dependencies"
        );

        let solr_config = SolrConfig::new(solr_url, solr_core, site.name.clone())
            .with_commit_within_ms(commit_within_ms);

        // Initialize Solr provider with retry logic
        let search_provider = Self::connect_to_solr(
            solr_config,
            connection_mode,
            Duration::from_secs(retry_interval),
        )
        .await?;

        info!("Solr connection established");

        let source = HttpBookingSource::new(&booking_api_url).map_err(|e| {
            IndexingError::config(format!("Failed to create booking source: {}", e))
        })?;

        let indexer = Arc::new(AppointmentIndexer::new(
            Arc::new(source),
            Arc::new(search_provider),
            IndexerConfig { enabled, site },
        ));

        Ok(Self { indexer })
    }

    /// Connect to Solr with retry logic based on connection mode.
    async fn connect_to_solr(
        config: SolrConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<SolrProvider, IndexingError> {
        loop {
            match Self::try_connect_solr(config.clone()).await {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to Solr: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            solr_url = %config.url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to Solr, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Create the provider and ping its core.
    async fn try_connect_solr(config: SolrConfig) -> Result<SolrProvider, IndexingError> {
        let provider = SolrProvider::new(config).map_err(|e| {
            IndexingError::config(format!("Failed to create Solr provider: {}", e))
        })?;

        provider
            .ensure_ready()
            .await
            .map_err(|e| IndexingError::config(format!("Solr core is not ready: {}", e)))?;

        Ok(provider)
    }
}
