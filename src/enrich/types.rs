//! Enrichment domain types and error definitions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enrich::pool::{Cancelled, PoolError};
use crate::routing::{RouteAlternative, RoutingError};
use crate::spatial::Coordinate;
use crate::zones::ZoneCategory;

/// How dangerous a hazard category is for a cyclist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Fixed severity per hazard category; `None` for non-hazards.
    pub const fn for_category(category: ZoneCategory) -> Option<Self> {
        match category {
            ZoneCategory::Theft => Some(Severity::High),
            ZoneCategory::Waterlogging => Some(Severity::Medium),
            ZoneCategory::Pothole => Some(Severity::Low),
            ZoneCategory::BikeLane => None,
        }
    }
}

/// A hazard zone crossed by a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardEvent {
    pub category: ZoneCategory,
    pub location: Coordinate,
    pub severity: Severity,
    /// Sample index over route length, in `[0, 1)`.
    pub distance_along: f64,
}

/// Safety metrics computed for one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMetadata {
    /// `[0, 1]`; 0.5 means "no geometry to judge".
    pub safety_score: f64,
    /// `[0, 100]`, one decimal place.
    pub bike_lane_percentage: f64,
    pub hazards: Vec<HazardEvent>,
    pub avoided_categories: BTreeSet<ZoneCategory>,
}

/// A routing engine alternative plus its decoded path and metrics.
///
/// Serializes as the engine's route object with `coordinates` and `metadata` added.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRoute {
    #[serde(flatten)]
    pub route: RouteAlternative,
    pub coordinates: Vec<Coordinate>,
    pub metadata: RouteMetadata,
}

impl EnrichedRoute {
    pub fn distance(&self) -> f64 {
        self.route.distance
    }
}

/// Errors that can occur while enriching a route request.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// The routing engine timed out or failed; the request cannot be served.
    #[error("Route calculation service unavailable: {0}")]
    RoutingUnavailable(#[from] RoutingError),

    /// Selection was attempted over an empty set of alternatives.
    #[error("No route alternatives to select from")]
    NoAlternatives,

    #[error("Route enrichment cancelled")]
    Cancelled,

    /// A scoring job panicked or the pool was shut down.
    #[error("Scoring worker failed: {0}")]
    Worker(String),
}

impl From<Cancelled> for EnrichError {
    fn from(_: Cancelled) -> Self {
        EnrichError::Cancelled
    }
}

impl From<PoolError> for EnrichError {
    fn from(e: PoolError) -> Self {
        EnrichError::Worker(e.to_string())
    }
}

/// Result type for enrichment operations.
pub type EnrichResult<T> = Result<T, EnrichError>;
