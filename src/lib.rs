//! Bike route enrichment and selection engine.

pub mod config;
pub mod enrich;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod spatial;
pub mod zones;

pub use config::EngineConfig;
pub use enrich::{EnrichmentOrchestrator, RouteOutcome, RouteRequest};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use zones::ZoneStore;
