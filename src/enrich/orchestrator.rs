//! Per-request enrichment pipeline.
//!
//! # State Machine
//! ```text
//! FETCHING ──(engine error/timeout)──→ FAILED
//!     │
//!     ├──(zero alternatives)──→ DONE (empty outcome, selector skipped)
//!     ↓
//! SCORING (all alternatives concurrently; decode, then three scoring jobs)
//!     ↓ join
//! SELECTING
//!     ↓
//! DONE
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::try_join_all;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::enrich::decoder::GeometryDecoder;
use crate::enrich::pool::{Cancellation, ScoringPool};
use crate::enrich::scorer::RouteScorer;
use crate::enrich::selector::RouteSelector;
use crate::enrich::types::{EnrichError, EnrichResult, EnrichedRoute, RouteMetadata};
use crate::observability::metrics;
use crate::routing::{ExclusionPolygon, RouteAlternative, RouteQuery, RoutingEngine};
use crate::spatial::Coordinate;
use crate::zones::{ZoneCategory, ZoneSnapshot, ZoneStore};

/// A parsed route request from the API layer.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub id: Uuid,
    pub start: Coordinate,
    pub end: Coordinate,
    pub avoid: BTreeSet<ZoneCategory>,
    pub monsoon_mode: bool,
}

impl RouteRequest {
    pub fn new(start: Coordinate, end: Coordinate) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            avoid: BTreeSet::new(),
            monsoon_mode: false,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_avoid(mut self, avoid: impl IntoIterator<Item = ZoneCategory>) -> Self {
        self.avoid = avoid.into_iter().collect();
        self
    }

    pub fn with_monsoon_mode(mut self, monsoon_mode: bool) -> Self {
        self.monsoon_mode = monsoon_mode;
        self
    }

    /// Requested avoid set, plus waterlogging in monsoon mode.
    pub fn effective_avoid(&self) -> BTreeSet<ZoneCategory> {
        let mut avoid = self.avoid.clone();
        if self.monsoon_mode {
            avoid.insert(ZoneCategory::Waterlogging);
        }
        avoid
    }
}

/// Every enriched alternative plus the chosen one.
#[derive(Debug, Clone, Serialize)]
pub struct RouteOutcome {
    pub alternatives: Vec<EnrichedRoute>,
    /// `None` only when the engine returned no alternatives.
    pub selected: Option<EnrichedRoute>,
}

impl RouteOutcome {
    pub fn empty() -> Self {
        Self {
            alternatives: Vec::new(),
            selected: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Fetching,
    Scoring,
    Selecting,
    Done,
    Failed,
}

impl fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestPhase::Fetching => "fetching",
            RequestPhase::Scoring => "scoring",
            RequestPhase::Selecting => "selecting",
            RequestPhase::Done => "done",
            RequestPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Exclusion polygons for every hazard category in `avoid`.
pub fn build_exclusions(zones: &ZoneSnapshot, avoid: &BTreeSet<ZoneCategory>) -> Vec<ExclusionPolygon> {
    avoid
        .iter()
        .filter(|category| category.is_hazard())
        .flat_map(|category| zones.zones(*category))
        .map(ExclusionPolygon::from_zone)
        .collect()
}

/// Drives one route request from fetch to selection.
pub struct EnrichmentOrchestrator {
    engine: Arc<dyn RoutingEngine>,
    zones: Arc<ZoneStore>,
    decoder: GeometryDecoder,
    selector: RouteSelector,
    pool: ScoringPool,
}

impl EnrichmentOrchestrator {
    pub fn new(
        engine: Arc<dyn RoutingEngine>,
        zones: Arc<ZoneStore>,
        decoder: GeometryDecoder,
        pool: ScoringPool,
    ) -> Self {
        Self {
            engine,
            zones,
            decoder,
            selector: RouteSelector::default(),
            pool,
        }
    }

    pub fn with_selector(mut self, selector: RouteSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn zones(&self) -> &Arc<ZoneStore> {
        &self.zones
    }

    /// Fetch, enrich and select.
    ///
    /// Dropping the returned future cancels in-flight scoring jobs.
    pub async fn enrich(&self, request: &RouteRequest) -> EnrichResult<RouteOutcome> {
        let span = tracing::info_span!("route_request", request_id = %request.id);
        let started = Instant::now();

        let result = self.run(request).instrument(span).await;

        let outcome = match &result {
            Ok(outcome) if outcome.selected.is_none() => "empty",
            Ok(_) => "ok",
            Err(EnrichError::RoutingUnavailable(_)) => "routing_unavailable",
            Err(_) => "error",
        };
        metrics::record_route_request(outcome, started);
        result
    }

    async fn run(&self, request: &RouteRequest) -> EnrichResult<RouteOutcome> {
        let cancel = Cancellation::new();
        let _cancel_on_drop = cancel.guard();

        // One snapshot for the whole request, even if a refresh lands meanwhile.
        let snapshot = self.zones.snapshot().await;
        let avoided = Arc::new(request.effective_avoid());

        tracing::debug!(phase = %RequestPhase::Fetching, avoid = ?avoided, "Route request phase");
        let query = RouteQuery::new(request.start, request.end)
            .with_exclusions(build_exclusions(&snapshot, &avoided));

        let alternatives = match self.engine.alternatives(&query).await {
            Ok(alternatives) => alternatives,
            Err(e) => {
                tracing::warn!(phase = %RequestPhase::Failed, error = %e, "Routing engine unavailable");
                return Err(EnrichError::RoutingUnavailable(e));
            }
        };

        if alternatives.is_empty() {
            tracing::info!(phase = %RequestPhase::Done, "Routing engine returned no alternatives");
            return Ok(RouteOutcome::empty());
        }

        tracing::debug!(
            phase = %RequestPhase::Scoring,
            alternatives = alternatives.len(),
            exclusions = query.exclusions.len(),
            "Route request phase"
        );
        let scorer = RouteScorer::new(snapshot);
        let enriched = try_join_all(alternatives.into_iter().map(|alternative| {
            self.enrich_alternative(alternative, scorer.clone(), avoided.clone(), cancel.clone())
        }))
        .await?;

        tracing::debug!(phase = %RequestPhase::Selecting, "Route request phase");
        let selected = self.selector.select(&enriched)?.clone();

        for hazard in enriched.iter().flat_map(|r| &r.metadata.hazards) {
            metrics::record_hazard(hazard.category);
        }

        tracing::info!(
            phase = %RequestPhase::Done,
            alternatives = enriched.len(),
            selected_distance = selected.distance(),
            safety_score = selected.metadata.safety_score,
            "Route request complete"
        );

        Ok(RouteOutcome {
            alternatives: enriched,
            selected: Some(selected),
        })
    }

    async fn enrich_alternative(
        &self,
        alternative: RouteAlternative,
        scorer: RouteScorer,
        avoided: Arc<BTreeSet<ZoneCategory>>,
        cancel: Cancellation,
    ) -> EnrichResult<EnrichedRoute> {
        let decoder = self.decoder;
        let geometry = alternative.geometry.clone();
        let coords: Arc<[Coordinate]> = self
            .pool
            .run(move || decoder.decode(geometry.as_ref()))
            .await?
            .into();
        cancel.check()?;

        let safety = {
            let (scorer, coords, cancel) = (scorer.clone(), coords.clone(), cancel.clone());
            self.pool.run(move || scorer.safety_score(&coords, &cancel))
        };
        let bike_lane = {
            let (scorer, coords, cancel) = (scorer.clone(), coords.clone(), cancel.clone());
            self.pool.run(move || scorer.bike_lane_percentage(&coords, &cancel))
        };
        let hazards = {
            let (coords, avoided, cancel) = (coords.clone(), avoided.clone(), cancel.clone());
            self.pool.run(move || scorer.detect_hazards(&coords, &avoided, &cancel))
        };

        let (safety, bike_lane, hazards) = tokio::join!(safety, bike_lane, hazards);

        Ok(EnrichedRoute {
            route: alternative,
            coordinates: coords.to_vec(),
            metadata: RouteMetadata {
                safety_score: safety??,
                bike_lane_percentage: bike_lane??,
                hazards: hazards??,
                avoided_categories: (*avoided).clone(),
            },
        })
    }
}
