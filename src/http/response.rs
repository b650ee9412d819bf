//! API error responses.
//!
//! # Status Mapping
//! - routing engine timeout or failure → 503 `Route calculation service unavailable`
//! - invalid coordinates → 422
//! - cancelled or failed scoring → 500
//! - zone override outside development → 403
//!
//! Bodies are `{"detail": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::enrich::EnrichError;
use crate::zones::DevZonesError;

/// Message returned whenever the routing engine cannot serve a request.
pub const ROUTING_UNAVAILABLE: &str = "Route calculation service unavailable";

#[derive(Debug)]
pub enum ApiError {
    InvalidInput(String),
    Enrich(EnrichError),
    DevZones(DevZonesError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Enrich(EnrichError::RoutingUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Enrich(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DevZones(DevZonesError::NotDevelopment) => StatusCode::FORBIDDEN,
            ApiError::DevZones(DevZonesError::Write(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::InvalidInput(message) => message.clone(),
            ApiError::Enrich(EnrichError::RoutingUnavailable(_)) => ROUTING_UNAVAILABLE.to_string(),
            ApiError::Enrich(_) => "Route enrichment failed".to_string(),
            ApiError::DevZones(e) => e.to_string(),
        }
    }
}

impl From<EnrichError> for ApiError {
    fn from(e: EnrichError) -> Self {
        ApiError::Enrich(e)
    }
}

impl From<DevZonesError> for ApiError {
    fn from(e: DevZonesError) -> Self {
        ApiError::DevZones(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = ?self, "Request failed");
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
