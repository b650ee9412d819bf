//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the engine.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::spatial::MetroBounds;

/// Root configuration for the route engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// HTTP API listener settings.
    pub server: ServerConfig,

    /// Upstream routing engine settings.
    pub routing: RoutingEngineConfig,

    /// Zone data tiers and refresh cadence.
    pub zones: ZoneConfig,

    /// Metropolitan operating area.
    pub metro: MetroConfig,

    pub monsoon: MonsoonConfig,

    pub scoring: ScoringConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP API listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Whole-request timeout applied by middleware.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Encoding requested for route geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeometryFormat {
    #[default]
    GeoJson,
    Polyline,
    Polyline6,
}

impl GeometryFormat {
    /// Value of the upstream `geometries` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            GeometryFormat::GeoJson => "geojson",
            GeometryFormat::Polyline => "polyline",
            GeometryFormat::Polyline6 => "polyline6",
        }
    }

    /// Decimal precision of an encoded polyline in this format.
    pub fn polyline_precision(&self) -> u32 {
        match self {
            GeometryFormat::Polyline6 => 6,
            GeometryFormat::GeoJson | GeometryFormat::Polyline => 5,
        }
    }
}

/// Upstream routing engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingEngineConfig {
    /// Base URL of the routing engine (e.g., "http://localhost:5001").
    pub base_url: String,

    /// Path template; `{coordinates}` is replaced by "lon,lat;lon,lat".
    pub route_path: String,

    /// Deadline for a whole upstream call.
    pub timeout_secs: u64,

    /// Alternatives kept from the upstream response.
    pub max_alternatives: usize,

    pub geometries: GeometryFormat,
}

impl Default for RoutingEngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            route_path: "/route/v1/cycling/{coordinates}".to_string(),
            timeout_secs: 10,
            max_alternatives: 3,
            geometries: GeometryFormat::GeoJson,
        }
    }
}

/// Deployment environment; selects which zone tiers are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Zone data configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub environment: Environment,

    /// Directory holding `<category>.geojson` files (durable tier).
    pub data_dir: PathBuf,

    /// Development-only JSON cache, keyed by category name.
    pub dev_cache_file: PathBuf,

    /// Distributed cache TTL and snapshot staleness threshold.
    pub cache_ttl_secs: u64,

    /// Background refresh period.
    pub refresh_interval_secs: u64,

    /// Refresh when files under `data_dir` change.
    pub watch: bool,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            data_dir: PathBuf::from("data/zones"),
            dev_cache_file: PathBuf::from("data/zones/zone_cache.dev.json"),
            cache_ttl_secs: 3600,
            refresh_interval_secs: 3600,
            watch: false,
        }
    }
}

/// Metropolitan area configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetroConfig {
    /// Display name reported by the health endpoint.
    pub name: String,

    pub bbox: MetroBounds,
}

impl Default for MetroConfig {
    fn default() -> Self {
        Self {
            name: "Delhi".to_string(),
            bbox: MetroBounds {
                min_lon: 76.84,
                max_lon: 77.45,
                min_lat: 28.40,
                max_lat: 28.88,
            },
        }
    }
}

/// Months (1-12) during which waterlogging is avoided by default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonsoonConfig {
    pub months: Vec<u32>,
}

impl Default for MonsoonConfig {
    fn default() -> Self {
        Self {
            months: vec![6, 7, 8, 9],
        }
    }
}

impl MonsoonConfig {
    pub fn in_season_at(&self, date: NaiveDate) -> bool {
        self.months.contains(&date.month())
    }

    pub fn in_season_now(&self) -> bool {
        self.in_season_at(Local::now().date_naive())
    }
}

/// Scoring worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ScoringConfig {
    /// Concurrent scoring jobs; 0 means one per available core.
    pub max_workers: usize,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8000");
        assert_eq!(config.routing.max_alternatives, 3);
        assert_eq!(config.routing.geometries, GeometryFormat::GeoJson);
        assert_eq!(config.zones.environment, Environment::Development);
        assert_eq!(config.zones.cache_ttl_secs, 3600);
        assert_eq!(config.metro.name, "Delhi");
        assert_eq!(config.monsoon.months, vec![6, 7, 8, 9]);
    }

    #[test]
    fn test_partial_sections() {
        let config: EngineConfig = toml::from_str(
            r#"
            [routing]
            base_url = "http://osrm:5000"
            geometries = "polyline6"

            [zones]
            environment = "production"
            "#,
        )
        .unwrap();

        assert_eq!(config.routing.base_url, "http://osrm:5000");
        assert_eq!(config.routing.timeout_secs, 10);
        assert_eq!(config.routing.geometries.polyline_precision(), 6);
        assert_eq!(config.zones.environment, Environment::Production);
    }

    #[test]
    fn test_monsoon_season() {
        let monsoon = MonsoonConfig::default();
        assert!(monsoon.in_season_at(NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()));
        assert!(!monsoon.in_season_at(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()));
    }
}
