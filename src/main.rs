//! Bike route engine
//!
//! Safety-aware bicycle routing for a hazard-prone city.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────────┐
//!                        │                BIKE ROUTE ENGINE                   │
//!                        │                                                    │
//!     Client Request     │  ┌─────────┐    ┌──────────────┐    ┌──────────┐   │
//!     ───────────────────┼─▶│  http   │───▶│    enrich    │───▶│ routing  │───┼──▶ Routing
//!                        │  │ server  │    │ orchestrator │    │  client  │◀──┼─── Engine
//!                        │  └─────────┘    └──────┬───────┘    └──────────┘   │
//!                        │                        │                            │
//!                        │          decode + score│(bounded pool)              │
//!                        │                        ▼                            │
//!                        │                 ┌──────────────┐                    │
//!                        │                 │   spatial    │                    │
//!                        │                 │    index     │                    │
//!                        │                 └──────▲───────┘                    │
//!                        │                        │ snapshot                   │
//!                        │                 ┌──────┴───────┐                    │
//!                        │                 │    zones     │◀── dev cache /     │
//!                        │                 │    store     │    cache / GeoJSON │
//!                        │                 └──────────────┘                    │
//!                        │                                                    │
//!                        │  Cross-cutting: config, observability, resilience, │
//!                        │                 lifecycle                           │
//!                        └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use bike_route_engine::config::{load_config, EngineConfig};
use bike_route_engine::lifecycle;
use bike_route_engine::observability::logging;

#[derive(Parser)]
#[command(name = "bike-route-engine")]
#[command(about = "Safety-aware bike route enrichment service", long_about = None)]
struct Args {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        bind_address = %config.server.bind_address,
        routing_engine = %config.routing.base_url,
        "bike-route-engine starting"
    );

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
