//! API request handlers.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::enrich::RouteOutcome;
use crate::http::request::{request_id, NearbyQuery, RouteBody, ZoneFeatures};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::zones::{ZoneCategory, ZoneError};

pub async fn create_route(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RouteBody>,
) -> Result<Json<RouteOutcome>, ApiError> {
    let id = request_id(&headers);
    let request = body.into_request(id, state.monsoon.in_season_now())?;

    for (label, point) in [("start", request.start), ("end", request.end)] {
        if !state.metro.bbox.contains(point) {
            tracing::warn!(
                request_id = %id,
                endpoint = label,
                lon = point.lon,
                lat = point.lat,
                metro = %state.metro.name,
                "Route endpoint outside metropolitan area"
            );
        }
    }

    let outcome = state.orchestrator.enrich(&request).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
pub struct NearbyHazards {
    /// Categories whose zones contain the point.
    pub inside: Vec<ZoneCategory>,
    /// Meters to the nearest hazard boundary; `null` when inside or when no zones exist.
    pub distances_m: BTreeMap<ZoneCategory, Option<f64>>,
}

pub async fn nearby_hazards(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<NearbyHazards>, ApiError> {
    let point = query.point()?;
    let snapshot = state.zones.snapshot().await;
    let index = snapshot.index();

    let distances_m = ZoneCategory::HAZARDS
        .into_iter()
        .map(|category| {
            let meters = index
                .distance_to_boundary(point, category)
                .filter(|m| m.is_finite())
                .map(|m| (m * 10.0).round() / 10.0);
            (category, meters)
        })
        .collect();

    Ok(Json(NearbyHazards {
        inside: index.categories_at(point),
        distances_m,
    }))
}

#[derive(Debug, Serialize)]
pub struct RefreshReport {
    pub zones: BTreeMap<ZoneCategory, usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<ZoneCategory>,
}

pub async fn refresh_zones(State(state): State<AppState>) -> impl IntoResponse {
    let result = state.zones.refresh().await;
    let zones = state.zones.current().counts();

    match result {
        Ok(()) => (StatusCode::OK, Json(RefreshReport { zones, failed: Vec::new() })),
        Err(ZoneError::SourceUnavailable { categories }) => {
            tracing::warn!(failed = ?categories, "Zone refresh requested over API degraded");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(RefreshReport {
                    zones,
                    failed: categories,
                }),
            )
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DevZonesReport {
    pub category: ZoneCategory,
    pub zones: usize,
}

/// Development only: replace one category's zones in the dev cache file.
pub async fn set_dev_zones(
    State(state): State<AppState>,
    Path(category): Path<ZoneCategory>,
    Json(body): Json<ZoneFeatures>,
) -> Result<Json<DevZonesReport>, ApiError> {
    let features = body.into_features();
    tracing::info!(category = %category, features = features.len(), "Dev zone override requested");

    let zones = state.zones.set_dev_zones(category, features).await?;
    Ok(Json(DevZonesReport { category, zones }))
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub city: String,
    pub zones: BTreeMap<ZoneCategory, usize>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy",
        city: state.metro.name.clone(),
        zones: state.zones.current().counts(),
    })
}
