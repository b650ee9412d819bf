//! Zone categories, zone polygons, and zone-loading errors.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use geo::Polygon;
use geojson::JsonObject;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of hazard and amenity categories a zone can be tagged with.
///
/// The discriminant doubles as the slot index used by [`crate::spatial::SpatialIndex`],
/// so lookups per point and category never hash a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneCategory {
    /// High bike-theft areas.
    Theft,
    /// Monsoon flooding zones.
    Waterlogging,
    /// Known bad road surface.
    #[serde(alias = "potholes")]
    Pothole,
    /// Dedicated bicycle paths.
    #[serde(alias = "bike_lanes", alias = "bike-lane")]
    BikeLane,
}

impl ZoneCategory {
    /// Number of categories (size of per-category lookup tables).
    pub const COUNT: usize = 4;

    /// Every category, in slot order.
    pub const ALL: [ZoneCategory; Self::COUNT] = [
        ZoneCategory::Theft,
        ZoneCategory::Waterlogging,
        ZoneCategory::Pothole,
        ZoneCategory::BikeLane,
    ];

    /// Categories that penalize a route.
    pub const HAZARDS: [ZoneCategory; 3] = [
        ZoneCategory::Theft,
        ZoneCategory::Waterlogging,
        ZoneCategory::Pothole,
    ];

    /// Slot index for fixed-size per-category tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Canonical wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            ZoneCategory::Theft => "theft",
            ZoneCategory::Waterlogging => "waterlogging",
            ZoneCategory::Pothole => "pothole",
            ZoneCategory::BikeLane => "bike_lane",
        }
    }

    /// Whether the category is a hazard (as opposed to an amenity).
    pub const fn is_hazard(self) -> bool {
        !matches!(self, ZoneCategory::BikeLane)
    }

    /// Key used for this category in the distributed cache tier.
    pub fn cache_key(self) -> String {
        format!("zones:{}", self.as_str())
    }

    /// File name of this category's collection in the durable store.
    pub const fn data_file(self) -> &'static str {
        match self {
            ZoneCategory::Theft => "theft_zones.geojson",
            ZoneCategory::Waterlogging => "waterlogging_zones.geojson",
            ZoneCategory::Pothole => "pothole_zones.geojson",
            ZoneCategory::BikeLane => "bike_lanes.geojson",
        }
    }
}

impl fmt::Display for ZoneCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown zone category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for ZoneCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "theft" => Ok(ZoneCategory::Theft),
            "waterlogging" => Ok(ZoneCategory::Waterlogging),
            "pothole" | "potholes" => Ok(ZoneCategory::Pothole),
            "bike_lane" | "bike_lanes" | "bike-lane" => Ok(ZoneCategory::BikeLane),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// A polygonal region tagged with a category.
///
/// Immutable once loaded; reloads replace whole snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub category: ZoneCategory,
    /// Boundary in (lon, lat) order. Exterior ring is closed.
    pub polygon: Polygon<f64>,
    /// Feature properties carried over from the source.
    pub metadata: Option<JsonObject>,
}

impl Zone {
    pub fn new(category: ZoneCategory, polygon: Polygon<f64>) -> Self {
        Self {
            category,
            polygon,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: JsonObject) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Errors raised by a single zone tier.
#[derive(Debug, Error)]
pub enum ZoneSourceError {
    /// Reading a local file failed.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tier returned data that is not valid zone GeoJSON.
    #[error("Invalid zone data: {0}")]
    Parse(String),

    /// The tier could not be reached.
    #[error("Zone tier unavailable: {0}")]
    Unavailable(String),
}

/// Result type for tier operations.
pub type ZoneSourceResult<T> = Result<T, ZoneSourceError>;

/// Errors surfaced by [`crate::zones::ZoneStore`].
#[derive(Debug, Error)]
pub enum ZoneError {
    /// Every tier failed for the listed categories.
    #[error("Zone data unavailable at every tier for {categories:?}")]
    SourceUnavailable { categories: Vec<ZoneCategory> },
}

/// Result type for zone store operations.
pub type ZoneResult<T> = Result<T, ZoneError>;

/// Errors from overriding zones through the dev cache file.
#[derive(Debug, Error)]
pub enum DevZonesError {
    /// The store has no dev cache tier outside development.
    #[error("Zone overrides are only available in development mode")]
    NotDevelopment,

    #[error("Failed to write dev zone cache: {0}")]
    Write(#[from] ZoneSourceError),
}
