//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start background tasks (zone refresher, watcher, signals)
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast on bad listener or routing engine URL
//! - Zone data is best-effort at startup; an empty store still serves
//! - Listener starts last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::EngineConfig;
use crate::enrich::{EnrichmentOrchestrator, GeometryDecoder, ScoringPool};
use crate::http::{AppState, HttpServer};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::observability::metrics;
use crate::routing::{OsrmClient, RoutingEngine, RoutingError};
use crate::zones::{ZoneRefresher, ZoneStore, ZoneWatcher};

/// Time background tasks get to stop after the server exits.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Routing engine client: {0}")]
    Routing(#[from] RoutingError),

    #[error("Invalid address '{0}'")]
    Address(String),
}

/// Everything the HTTP layer needs, built from configuration.
pub struct Engine {
    pub zones: Arc<ZoneStore>,
    pub orchestrator: Arc<EnrichmentOrchestrator>,
}

impl Engine {
    /// Build the zone store and orchestrator. Does not load zones.
    pub fn build(config: &EngineConfig) -> Result<Self, StartupError> {
        let zones = Arc::new(ZoneStore::from_config(&config.zones));
        let engine: Arc<dyn RoutingEngine> = Arc::new(OsrmClient::new(&config.routing)?);
        let pool = ScoringPool::new(config.scoring.max_workers);

        tracing::info!(
            routing_engine = %config.routing.base_url,
            scoring_workers = pool.size(),
            environment = ?config.zones.environment,
            "Engine built"
        );

        let orchestrator = Arc::new(EnrichmentOrchestrator::new(
            engine,
            zones.clone(),
            GeometryDecoder::new(config.routing.geometries),
            pool,
        ));

        Ok(Self { zones, orchestrator })
    }

    pub fn app_state(&self, config: &EngineConfig) -> AppState {
        AppState {
            orchestrator: self.orchestrator.clone(),
            zones: self.zones.clone(),
            metro: Arc::new(config.metro.clone()),
            monsoon: Arc::new(config.monsoon.clone()),
        }
    }
}

/// Start every subsystem and serve until a shutdown signal arrives.
pub async fn run(config: EngineConfig) -> Result<(), StartupError> {
    // 1. Metrics
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::Address(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr);
    }

    // 2. Core
    let engine = Engine::build(&config)?;
    if let Err(e) = engine.zones.refresh().await {
        tracing::warn!(error = %e, "Starting with incomplete zone data");
    }

    // 3. Background tasks
    let shutdown = Arc::new(Shutdown::new());
    let (change_tx, change_rx) = mpsc::unbounded_channel();

    let _watcher = if config.zones.watch {
        match ZoneWatcher::new(&config.zones.data_dir, change_tx.clone()).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::error!(error = %e, path = %config.zones.data_dir.display(), "Zone watcher failed to start");
                None
            }
        }
    } else {
        None
    };

    let refresher = ZoneRefresher::new(
        engine.zones.clone(),
        Duration::from_secs(config.zones.refresh_interval_secs),
    )
    .with_changes(change_rx);
    let refresher = tokio::spawn(refresher.run(shutdown.subscribe()));

    signals::spawn_signal_handler(shutdown.clone(), change_tx);

    // 4. Listener
    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        city = %config.metro.name,
        "Listening for connections"
    );

    let server = HttpServer::new(
        engine.app_state(&config),
        Duration::from_secs(config.server.request_timeout_secs),
    );
    let result = server.run(listener, shutdown.subscribe()).await;

    // 5. Drain
    shutdown.trigger();
    if tokio::time::timeout(DRAIN_TIMEOUT, refresher).await.is_err() {
        tracing::warn!("Zone refresher did not stop in time");
    }

    result.map_err(StartupError::from)
}
