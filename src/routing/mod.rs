//! Routing engine subsystem.
//!
//! # Data Flow
//! ```text
//! RouteRequest (start, end, avoided hazards)
//!     → request.rs (coordinates path, exclusion polygons)
//!     → client.rs (HTTP GET under deadline)
//!     → response.rs (routes with geometry, distance, duration, legs)
//!     → Return: Vec<RouteAlternative> or RoutingError
//! ```
//!
//! # Design Decisions
//! - `RoutingEngine` is a trait so the orchestrator can be driven by fakes
//! - Only network suspension point of a route request
//! - No retries; failures surface as "routing unavailable"

pub mod client;
pub mod request;
pub mod response;
pub mod types;

pub use client::{OsrmClient, RoutingEngine};
pub use request::{ExclusionPolygon, RouteQuery, EXCLUSION_BUFFER_METERS};
pub use response::{EngineResponse, RouteAlternative, RouteGeometry};
pub use types::{RoutingError, RoutingResult};
