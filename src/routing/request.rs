//! Outgoing routing query: endpoints and exclusion polygons.

use std::fmt;

use crate::spatial::Coordinate;
use crate::zones::Zone;

/// Buffer, in meters, the routing engine keeps around each excluded polygon.
pub const EXCLUSION_BUFFER_METERS: u32 = 100;

/// A zone boundary the routing engine must route around.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionPolygon {
    /// Exterior ring vertices in order.
    pub ring: Vec<Coordinate>,
    pub buffer_meters: u32,
}

impl ExclusionPolygon {
    pub fn from_zone(zone: &Zone) -> Self {
        Self {
            ring: zone
                .polygon
                .exterior()
                .coords()
                .map(|c| Coordinate::from(*c))
                .collect(),
            buffer_meters: EXCLUSION_BUFFER_METERS,
        }
    }

    /// Render as `polygon(lat,lon,lat,lon,...,buffer)`; vertices are latitude first.
    pub fn to_param(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExclusionPolygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("polygon(")?;
        for vertex in &self.ring {
            write!(f, "{},{},", vertex.lat, vertex.lon)?;
        }
        write!(f, "{})", self.buffer_meters)
    }
}

/// One routing request as sent upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    pub start: Coordinate,
    pub end: Coordinate,
    pub exclusions: Vec<ExclusionPolygon>,
}

impl RouteQuery {
    pub fn new(start: Coordinate, end: Coordinate) -> Self {
        Self {
            start,
            end,
            exclusions: Vec::new(),
        }
    }

    pub fn with_exclusions(mut self, exclusions: Vec<ExclusionPolygon>) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Path segment `lon1,lat1;lon2,lat2`.
    pub fn coordinates_path(&self) -> String {
        format!(
            "{},{};{},{}",
            self.start.lon, self.start.lat, self.end.lon, self.end.lat
        )
    }

    /// Comma-joined exclusion list, or `None` when nothing is excluded.
    pub fn exclude_param(&self) -> Option<String> {
        if self.exclusions.is_empty() {
            return None;
        }
        let parts: Vec<String> = self.exclusions.iter().map(|e| e.to_param()).collect();
        Some(parts.join(","))
    }
}
