//! Route safety metrics.
//!
//! # Algorithm
//! ```text
//! safety:    every max(1, len/20)-th point
//!            1.0 − 0.6·theft − 0.4·waterlogging − 0.3·pothole + 0.1·bike_lane
//!            clamped to [0, 1] per point, averaged
//! bike lane: same stride, share of points inside a bike lane × 100
//! hazards:   every max(1, len/10)-th point, non-avoided hazard categories only
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::enrich::pool::{Cancellation, Cancelled};
use crate::enrich::types::{HazardEvent, RouteMetadata, Severity};
use crate::spatial::Coordinate;
use crate::zones::{ZoneCategory, ZoneSnapshot};

pub const THEFT_PENALTY: f64 = 0.6;
pub const WATERLOGGING_PENALTY: f64 = 0.4;
pub const POTHOLE_PENALTY: f64 = 0.3;
pub const BIKE_LANE_BONUS: f64 = 0.1;

/// Safety score reported when there is no geometry to judge.
pub const NEUTRAL_SAFETY_SCORE: f64 = 0.5;

const SCORE_SAMPLES: usize = 20;
const HAZARD_SAMPLES: usize = 10;

fn stride(len: usize, samples: usize) -> usize {
    (len / samples).max(1)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Per-point score adjustment for a zone category.
pub const fn category_weight(category: ZoneCategory) -> f64 {
    match category {
        ZoneCategory::Theft => -THEFT_PENALTY,
        ZoneCategory::Waterlogging => -WATERLOGGING_PENALTY,
        ZoneCategory::Pothole => -POTHOLE_PENALTY,
        ZoneCategory::BikeLane => BIKE_LANE_BONUS,
    }
}

/// Scores coordinate sequences against one zone snapshot.
///
/// Cheap to clone; all clones read the same snapshot.
#[derive(Debug, Clone)]
pub struct RouteScorer {
    zones: Arc<ZoneSnapshot>,
}

impl RouteScorer {
    pub fn new(zones: Arc<ZoneSnapshot>) -> Self {
        Self { zones }
    }

    pub fn safety_score(&self, coords: &[Coordinate], cancel: &Cancellation) -> Result<f64, Cancelled> {
        if coords.is_empty() {
            return Ok(NEUTRAL_SAFETY_SCORE);
        }

        let index = self.zones.index();
        let mut total = 0.0;
        let mut sampled = 0usize;

        for point in coords.iter().step_by(stride(coords.len(), SCORE_SAMPLES)) {
            cancel.check()?;
            let point_score = ZoneCategory::ALL
                .iter()
                .filter(|category| index.contains(*point, **category))
                .fold(1.0, |score, category| score + category_weight(*category));
            total += point_score.clamp(0.0, 1.0);
            sampled += 1;
        }

        Ok(round_to(total / sampled as f64, 2))
    }

    pub fn bike_lane_percentage(&self, coords: &[Coordinate], cancel: &Cancellation) -> Result<f64, Cancelled> {
        let index = self.zones.index();
        let mut inside = 0usize;
        let mut sampled = 0usize;

        for point in coords.iter().step_by(stride(coords.len(), SCORE_SAMPLES)) {
            cancel.check()?;
            if index.contains(*point, ZoneCategory::BikeLane) {
                inside += 1;
            }
            sampled += 1;
        }

        if sampled == 0 {
            return Ok(0.0);
        }
        Ok(round_to(inside as f64 / sampled as f64 * 100.0, 1))
    }

    /// Hazards along the route, ordered by position then category.
    pub fn detect_hazards(
        &self,
        coords: &[Coordinate],
        avoided: &BTreeSet<ZoneCategory>,
        cancel: &Cancellation,
    ) -> Result<Vec<HazardEvent>, Cancelled> {
        let index = self.zones.index();
        let len = coords.len();
        let mut hazards = Vec::new();

        for (i, point) in coords.iter().enumerate().step_by(stride(len, HAZARD_SAMPLES)) {
            cancel.check()?;
            for category in ZoneCategory::HAZARDS {
                if avoided.contains(&category) || !index.contains(*point, category) {
                    continue;
                }
                let Some(severity) = Severity::for_category(category) else {
                    continue;
                };
                hazards.push(HazardEvent {
                    category,
                    location: *point,
                    severity,
                    distance_along: i as f64 / len as f64,
                });
            }
        }

        Ok(hazards)
    }

    /// All three metrics computed sequentially on the calling thread.
    pub fn score(&self, coords: &[Coordinate], avoided: &BTreeSet<ZoneCategory>) -> RouteMetadata {
        let cancel = Cancellation::new();
        // A fresh token is never cancelled.
        let safety_score = self.safety_score(coords, &cancel).unwrap_or(NEUTRAL_SAFETY_SCORE);
        let bike_lane_percentage = self.bike_lane_percentage(coords, &cancel).unwrap_or(0.0);
        let hazards = self.detect_hazards(coords, avoided, &cancel).unwrap_or_default();

        RouteMetadata {
            safety_score,
            bike_lane_percentage,
            hazards,
            avoided_categories: avoided.clone(),
        }
    }
}
