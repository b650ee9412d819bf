//! Routing engine response shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Route geometry as the engine encodes it.
///
/// Variant order matters for untagged decoding: a JSON string is an encoded
/// polyline, an object that parses as GeoJSON is a point list, and anything
/// else is kept verbatim so the alternative can still be returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteGeometry {
    Encoded(String),
    GeoJson(geojson::Geometry),
    Unrecognized(Value),
}

/// One candidate route from the engine. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAlternative {
    #[serde(default)]
    pub geometry: Option<RouteGeometry>,

    /// Meters.
    #[serde(default)]
    pub distance: f64,

    /// Seconds.
    #[serde(default)]
    pub duration: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legs: Vec<Value>,

    /// Any other engine-reported fields (`weight`, `weight_name`, ...), passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RouteAlternative {
    pub fn new(geometry: Option<RouteGeometry>, distance: f64, duration: f64) -> Self {
        Self {
            geometry,
            distance,
            duration,
            legs: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// Top-level engine response.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<RouteAlternative>,
}
