//! Route geometry normalization.
//!
//! Both accepted encodings end up as `(lon, lat)` coordinates in route order.
//! Encoded polylines carry latitude first and are swapped during decoding.

use thiserror::Error;

use crate::config::GeometryFormat;
use crate::routing::RouteGeometry;
use crate::spatial::Coordinate;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("invalid polyline character {0:?} at byte {1}")]
    InvalidCharacter(char, usize),

    #[error("polyline ends mid-value")]
    Truncated,

    #[error("polyline value overflows")]
    Overflow,
}

/// Decode a Google encoded polyline with the given decimal precision.
pub fn decode_polyline(encoded: &str, precision: u32) -> Result<Vec<Coordinate>, PolylineError> {
    let factor = 10f64.powi(precision as i32);
    let bytes = encoded.as_bytes();
    let mut coordinates = Vec::with_capacity(bytes.len() / 4);
    let mut pos = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while pos < bytes.len() {
        lat = lat
            .checked_add(next_value(bytes, &mut pos)?)
            .ok_or(PolylineError::Overflow)?;
        lon = lon
            .checked_add(next_value(bytes, &mut pos)?)
            .ok_or(PolylineError::Overflow)?;
        coordinates.push(Coordinate::new(lon as f64 / factor, lat as f64 / factor));
    }

    Ok(coordinates)
}

fn next_value(bytes: &[u8], pos: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let Some(&byte) = bytes.get(*pos) else {
            return Err(PolylineError::Truncated);
        };
        if !(63..=126).contains(&byte) {
            return Err(PolylineError::InvalidCharacter(byte as char, *pos));
        }
        *pos += 1;

        // Twelve chunks carry 60 bits; a thirteenth would not fit.
        if shift >= 60 {
            return Err(PolylineError::Overflow);
        }
        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}

/// Normalizes engine geometry to an ordered coordinate list.
#[derive(Debug, Clone, Copy)]
pub struct GeometryDecoder {
    precision: u32,
}

impl GeometryDecoder {
    pub fn new(format: GeometryFormat) -> Self {
        Self {
            precision: format.polyline_precision(),
        }
    }

    pub fn with_precision(precision: u32) -> Self {
        Self { precision }
    }

    /// Decode a route geometry.
    ///
    /// Missing or malformed geometry yields an empty list, never an error.
    pub fn decode(&self, geometry: Option<&RouteGeometry>) -> Vec<Coordinate> {
        match geometry {
            None => Vec::new(),
            Some(RouteGeometry::Encoded(encoded)) => {
                decode_polyline(encoded, self.precision).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Malformed polyline geometry");
                    Vec::new()
                })
            }
            Some(RouteGeometry::GeoJson(geometry)) => points_from_geojson(&geometry.value),
            Some(RouteGeometry::Unrecognized(value)) => {
                tracing::warn!(geometry = %value, "Unrecognized route geometry");
                Vec::new()
            }
        }
    }
}

impl Default for GeometryDecoder {
    fn default() -> Self {
        Self::new(GeometryFormat::default())
    }
}

fn points_from_geojson(value: &geojson::Value) -> Vec<Coordinate> {
    let positions: Vec<&Vec<f64>> = match value {
        geojson::Value::LineString(line) => line.iter().collect(),
        geojson::Value::MultiLineString(lines) => lines.iter().flatten().collect(),
        _ => {
            tracing::warn!("Route geometry is not a line");
            return Vec::new();
        }
    };

    let mut coordinates = Vec::with_capacity(positions.len());
    for position in positions {
        match position.as_slice() {
            [lon, lat, ..] if Coordinate::new(*lon, *lat).is_valid() => {
                coordinates.push(Coordinate::new(*lon, *lat));
            }
            _ => {
                tracing::warn!(position = ?position, "Malformed GeoJSON position");
                return Vec::new();
            }
        }
    }
    coordinates
}
