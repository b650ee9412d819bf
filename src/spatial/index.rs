//! Per-category R-tree over zone polygons.
//!
//! # Conventions
//! - Containment is boundary-inclusive: a point exactly on a zone edge or
//!   vertex is inside that zone.
//! - Distances are planar in degrees, converted with a fixed equirectangular
//!   factor. This is a local approximation, not a geodesic distance.

use std::collections::BTreeMap;

use geo::{BoundingRect, Distance, Euclidean, Intersects};
use rstar::{Envelope, PointDistance, RTree, RTreeObject, AABB};

use crate::spatial::coordinate::Coordinate;
use crate::zones::types::{Zone, ZoneCategory};

/// Meters per degree used to convert planar distances.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Envelope of one zone, pointing back into the layer's zone list.
struct ZoneEnvelope {
    slot: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for ZoneEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for ZoneEnvelope {
    // Distance to the bounding box, a lower bound on the distance to the polygon.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        Envelope::distance_2(&self.envelope, point)
    }
}

struct ZoneLayer {
    zones: Vec<Zone>,
    tree: RTree<ZoneEnvelope>,
}

impl ZoneLayer {
    fn build(zones: Vec<Zone>) -> Self {
        let entries = zones
            .iter()
            .enumerate()
            .filter_map(|(slot, zone)| {
                let rect = zone.polygon.bounding_rect()?;
                Some(ZoneEnvelope {
                    slot,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();

        Self {
            zones,
            tree: RTree::bulk_load(entries),
        }
    }
}

/// Immutable spatial index over one snapshot of zone data.
pub struct SpatialIndex {
    layers: [ZoneLayer; ZoneCategory::COUNT],
}

impl SpatialIndex {
    /// An index with no zones in any category.
    pub fn empty() -> Self {
        Self::from_layers(std::array::from_fn(|_| Vec::new()))
    }

    /// Build from zones of any mix of categories.
    pub fn build(zones: impl IntoIterator<Item = Zone>) -> Self {
        let mut layers: [Vec<Zone>; ZoneCategory::COUNT] = std::array::from_fn(|_| Vec::new());
        for zone in zones {
            layers[zone.category.index()].push(zone);
        }
        Self::from_layers(layers)
    }

    /// Build from zones already grouped by category slot.
    pub fn from_layers(layers: [Vec<Zone>; ZoneCategory::COUNT]) -> Self {
        Self {
            layers: layers.map(ZoneLayer::build),
        }
    }

    /// Zones of one category, in load order.
    pub fn zones(&self, category: ZoneCategory) -> &[Zone] {
        &self.layers[category.index()].zones
    }

    /// Zone count per category.
    pub fn counts(&self) -> BTreeMap<ZoneCategory, usize> {
        ZoneCategory::ALL
            .iter()
            .map(|&c| (c, self.zones(c).len()))
            .collect()
    }

    /// True iff the point lies within (or on the boundary of) any zone of the category.
    pub fn contains(&self, point: Coordinate, category: ZoneCategory) -> bool {
        let layer = &self.layers[category.index()];
        let query = AABB::from_point([point.lon, point.lat]);
        let p = point.to_point();

        layer
            .tree
            .locate_in_envelope_intersecting(&query)
            .any(|entry| layer.zones[entry.slot].polygon.intersects(&p))
    }

    /// Categories whose zones contain the point.
    pub fn categories_at(&self, point: Coordinate) -> Vec<ZoneCategory> {
        ZoneCategory::ALL
            .into_iter()
            .filter(|&c| self.contains(point, c))
            .collect()
    }

    /// Distance in meters from the point to the nearest zone boundary of the category.
    ///
    /// `None` when the point is inside a zone. A category with no zones yields
    /// `Some(f64::INFINITY)`.
    pub fn distance_to_boundary(&self, point: Coordinate, category: ZoneCategory) -> Option<f64> {
        if self.contains(point, category) {
            return None;
        }

        let layer = &self.layers[category.index()];
        let p = point.to_point();
        let mut best = f64::INFINITY;

        for (entry, envelope_distance_2) in layer
            .tree
            .nearest_neighbor_iter_with_distance_2(&[point.lon, point.lat])
        {
            // Entries arrive ordered by envelope distance; nothing further can beat `best`.
            if envelope_distance_2 > best * best {
                break;
            }
            let polygon = &layer.zones[entry.slot].polygon;
            let distance = std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| Euclidean.distance(&p, ring))
                .fold(f64::INFINITY, f64::min);
            best = best.min(distance);
        }

        Some(best * METERS_PER_DEGREE)
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("counts", &self.counts())
            .finish()
    }
}
