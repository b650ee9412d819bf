//! Best-route selection over enriched alternatives.

use crate::enrich::types::{EnrichError, EnrichResult, EnrichedRoute};

/// Weighted objective over safety, bike-lane coverage and relative shortness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSelector {
    pub safety_weight: f64,
    pub bike_lane_weight: f64,
    pub distance_weight: f64,
}

impl Default for RouteSelector {
    fn default() -> Self {
        Self {
            safety_weight: 0.6,
            bike_lane_weight: 0.3,
            distance_weight: 0.1,
        }
    }
}

impl RouteSelector {
    /// Objective value of one route relative to the longest in its set.
    pub fn objective(&self, route: &EnrichedRoute, max_distance: f64) -> f64 {
        self.safety_weight * route.metadata.safety_score
            + self.bike_lane_weight * (route.metadata.bike_lane_percentage / 100.0)
            + self.distance_weight * (1.0 - route.distance() / max_distance)
    }

    /// Index of the best route; the earliest wins ties.
    pub fn select_index(&self, routes: &[EnrichedRoute]) -> EnrichResult<usize> {
        if routes.is_empty() {
            return Err(EnrichError::NoAlternatives);
        }

        let longest = routes.iter().map(|r| r.distance()).fold(0.0, f64::max);
        let max_distance = if longest > 0.0 { longest } else { 1.0 };

        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (i, route) in routes.iter().enumerate() {
            let score = self.objective(route, max_distance);
            if score > best_score {
                best = i;
                best_score = score;
            }
        }

        Ok(best)
    }

    pub fn select<'a>(&self, routes: &'a [EnrichedRoute]) -> EnrichResult<&'a EnrichedRoute> {
        self.select_index(routes).map(|i| &routes[i])
    }
}
