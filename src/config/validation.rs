//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, months 1-12)
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::EngineConfig;
use crate::spatial::Coordinate;

/// A single semantic problem with a configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g. `routing.timeout_secs`).
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("invalid socket address '{}'", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be > 0"));
    }

    match url::Url::parse(&config.routing.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::new(
            "routing.base_url",
            format!("expected an http(s) URL, got '{}'", config.routing.base_url),
        )),
    }
    if !config.routing.route_path.contains("{coordinates}") {
        errors.push(ValidationError::new(
            "routing.route_path",
            "must contain the {coordinates} placeholder",
        ));
    }
    if config.routing.timeout_secs == 0 {
        errors.push(ValidationError::new("routing.timeout_secs", "must be > 0"));
    }
    if config.routing.max_alternatives == 0 {
        errors.push(ValidationError::new("routing.max_alternatives", "must be >= 1"));
    }

    if config.zones.cache_ttl_secs == 0 {
        errors.push(ValidationError::new("zones.cache_ttl_secs", "must be > 0"));
    }
    if config.zones.refresh_interval_secs == 0 {
        errors.push(ValidationError::new("zones.refresh_interval_secs", "must be > 0"));
    }

    let bbox = &config.metro.bbox;
    if !(bbox.min_lon < bbox.max_lon && bbox.min_lat < bbox.max_lat) {
        errors.push(ValidationError::new("metro.bbox", "min must be below max on both axes"));
    } else if !(Coordinate::new(bbox.min_lon, bbox.min_lat).is_valid()
        && Coordinate::new(bbox.max_lon, bbox.max_lat).is_valid())
    {
        errors.push(ValidationError::new("metro.bbox", "corners outside WGS-84 ranges"));
    }

    if let Some(month) = config.monsoon.months.iter().find(|m| !(1..=12).contains(*m)) {
        errors.push(ValidationError::new(
            "monsoon.months",
            format!("month {} outside 1-12", month),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
