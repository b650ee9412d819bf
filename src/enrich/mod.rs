//! Route enrichment subsystem.
//!
//! # Data Flow
//! ```text
//! RouteRequest
//!     → orchestrator.rs (effective avoid set, exclusion polygons)
//!     → RoutingEngine (alternatives)
//!     → per alternative, concurrently on pool.rs:
//!           decoder.rs (geometry → coordinates)
//!           scorer.rs  (safety ∥ bike lane ∥ hazards)
//!     → join
//!     → selector.rs (weighted objective, first wins ties)
//!     → RouteOutcome { alternatives, selected }
//! ```
//!
//! # Design Decisions
//! - Each request reads exactly one zone snapshot
//! - A bad geometry degrades that alternative only
//! - Scoring is bounded by the pool size, not by request volume

pub mod decoder;
pub mod orchestrator;
pub mod pool;
pub mod scorer;
pub mod selector;
pub mod types;

pub use decoder::GeometryDecoder;
pub use orchestrator::{EnrichmentOrchestrator, RequestPhase, RouteOutcome, RouteRequest};
pub use pool::{Cancellation, ScoringPool};
pub use scorer::RouteScorer;
pub use selector::RouteSelector;
pub use types::{EnrichError, EnrichResult, EnrichedRoute, HazardEvent, RouteMetadata, Severity};
