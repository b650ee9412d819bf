//! Request bodies, query strings and request IDs.
//!
//! # Responsibilities
//! - Deserialize API inputs
//! - Validate coordinates before any work is done
//! - Recover the request ID assigned by middleware
//!
//! # Design Decisions
//! - Unknown hazard names fail deserialization (axum answers 422)
//! - Out-of-range coordinates are a 422, not a 400

use axum::http::HeaderMap;
use geojson::{Feature, FeatureCollection};
use serde::Deserialize;
use uuid::Uuid;

use crate::enrich::RouteRequest;
use crate::http::response::ApiError;
use crate::spatial::Coordinate;
use crate::zones::ZoneCategory;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID set by middleware, or a fresh one if absent or not a UUID.
pub fn request_id(headers: &HeaderMap) -> Uuid {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .unwrap_or_else(Uuid::new_v4)
}

fn coordinate(field: &str, lon: f64, lat: f64) -> Result<Coordinate, ApiError> {
    let point = Coordinate::new(lon, lat);
    if point.is_valid() {
        Ok(point)
    } else {
        Err(ApiError::InvalidInput(format!(
            "{} ({}, {}) is outside WGS-84 ranges",
            field, lon, lat
        )))
    }
}

/// `POST /api/v1/routes` body.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteBody {
    pub start_lon: f64,
    pub start_lat: f64,
    pub end_lon: f64,
    pub end_lat: f64,
    #[serde(default)]
    pub avoid: Vec<ZoneCategory>,
    /// Falls back to the configured monsoon months when omitted.
    #[serde(default)]
    pub monsoon_mode: Option<bool>,
}

impl RouteBody {
    pub fn into_request(self, id: Uuid, in_monsoon_season: bool) -> Result<RouteRequest, ApiError> {
        let start = coordinate("start", self.start_lon, self.start_lat)?;
        let end = coordinate("end", self.end_lon, self.end_lat)?;

        Ok(RouteRequest::new(start, end)
            .with_id(id)
            .with_avoid(self.avoid)
            .with_monsoon_mode(self.monsoon_mode.unwrap_or(in_monsoon_season)))
    }
}

/// `GET /api/v1/hazards/nearby` query.
#[derive(Debug, Clone, Deserialize)]
pub struct NearbyQuery {
    pub lon: f64,
    pub lat: f64,
}

impl NearbyQuery {
    pub fn point(&self) -> Result<Coordinate, ApiError> {
        coordinate("point", self.lon, self.lat)
    }
}

/// `PUT /api/v1/zones/{category}` body: a FeatureCollection or a bare feature array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ZoneFeatures {
    Collection(FeatureCollection),
    Features(Vec<Feature>),
}

impl ZoneFeatures {
    pub fn into_features(self) -> Vec<Feature> {
        match self {
            ZoneFeatures::Collection(collection) => collection.features,
            ZoneFeatures::Features(features) => features,
        }
    }
}
