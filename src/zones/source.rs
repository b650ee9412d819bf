//! Zone tiers: development cache file, distributed cache, durable store.
//!
//! Every tier speaks GeoJSON features; conversion to [`Zone`] polygons
//! happens once per refresh in [`zones_from_features`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use geojson::{Feature, GeoJson};

use crate::zones::types::{Zone, ZoneCategory, ZoneSourceError, ZoneSourceResult};

/// Durable backing store for zone features (tier 3).
#[async_trait]
pub trait ZoneSource: Send + Sync {
    /// Fetch every feature of a category.
    async fn fetch(&self, category: ZoneCategory) -> ZoneSourceResult<Vec<Feature>>;
}

/// Distributed cache holding serialized feature arrays (tier 2).
#[async_trait]
pub trait ZoneCache: Send + Sync {
    /// Get the cached value for a key, `None` on miss or expiry.
    async fn get(&self, key: &str) -> ZoneSourceResult<Option<String>>;

    /// Store a value with a time-to-live.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> ZoneSourceResult<()>;
}

/// Local development cache file (tier 1).
///
/// A JSON object mapping category names to feature arrays.
#[derive(Debug, Clone)]
pub struct DevCacheFile {
    path: PathBuf,
}

impl DevCacheFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every category in the file; a missing file is empty.
    ///
    /// When a category appears under both its canonical name and an alias
    /// (`bike_lane` and `bike_lanes`), the canonical entry wins. Unknown keys
    /// are skipped.
    pub async fn read_all(&self) -> ZoneSourceResult<BTreeMap<ZoneCategory, Vec<Feature>>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(ZoneSourceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let entries: BTreeMap<String, Vec<Feature>> = serde_json::from_str(&content)
            .map_err(|e| ZoneSourceError::Parse(format!("{}: {}", self.path.display(), e)))?;

        let mut zones = BTreeMap::new();
        for (key, features) in entries {
            let Ok(category) = key.parse::<ZoneCategory>() else {
                tracing::warn!(key = %key, path = %self.path.display(), "Unknown category in dev zone cache");
                continue;
            };
            if key == category.as_str() {
                zones.insert(category, features);
            } else {
                zones.entry(category).or_insert(features);
            }
        }
        Ok(zones)
    }

    /// Read one category. A missing file or missing key is a miss, not an error.
    pub async fn read(&self, category: ZoneCategory) -> ZoneSourceResult<Option<Vec<Feature>>> {
        Ok(self.read_all().await?.remove(&category))
    }

    /// Replace one category, keeping the others already in the file.
    pub async fn set_category(&self, category: ZoneCategory, features: Vec<Feature>) -> ZoneSourceResult<()> {
        let mut zones = self.read_all().await?;
        zones.insert(category, features);
        self.write(&zones).await
    }

    async fn write(&self, zones: &BTreeMap<ZoneCategory, Vec<Feature>>) -> ZoneSourceResult<()> {
        let keyed: BTreeMap<&str, &Vec<Feature>> =
            zones.iter().map(|(c, f)| (c.as_str(), f)).collect();
        let content = serde_json::to_string(&keyed)
            .map_err(|e| ZoneSourceError::Parse(e.to_string()))?;

        let io_error = |source: std::io::Error| ZoneSourceError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(&self.path, content).await.map_err(io_error)?;
        tracing::info!(path = %self.path.display(), categories = zones.len(), "Wrote dev zone cache");
        Ok(())
    }
}

/// In-process TTL cache standing in for a shared cache service.
#[derive(Clone, Default)]
pub struct MemoryZoneCache {
    inner: Arc<DashMap<String, (String, Instant)>>,
}

impl MemoryZoneCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.inner.iter().filter(|r| r.value().1 > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ZoneCache for MemoryZoneCache {
    async fn get(&self, key: &str) -> ZoneSourceResult<Option<String>> {
        let now = Instant::now();
        let hit = self.inner.get(key).and_then(|r| {
            let (value, expires_at) = r.value();
            (*expires_at > now).then(|| value.clone())
        });
        if hit.is_none() {
            self.inner.remove_if(key, |_, (_, expires_at)| *expires_at <= now);
        }
        Ok(hit)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> ZoneSourceResult<()> {
        self.inner.insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }
}

/// Directory of GeoJSON feature collections, one file per category.
#[derive(Debug, Clone)]
pub struct GeoJsonDirectory {
    dir: PathBuf,
}

impl GeoJsonDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ZoneSource for GeoJsonDirectory {
    async fn fetch(&self, category: ZoneCategory) -> ZoneSourceResult<Vec<Feature>> {
        let path = self.dir.join(category.data_file());
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ZoneSourceError::Io {
                path: path.clone(),
                source,
            })?;

        let geojson: GeoJson = content
            .parse()
            .map_err(|e| ZoneSourceError::Parse(format!("{}: {}", path.display(), e)))?;

        match geojson {
            GeoJson::FeatureCollection(collection) => Ok(collection.features),
            GeoJson::Feature(feature) => Ok(vec![feature]),
            GeoJson::Geometry(_) => Err(ZoneSourceError::Parse(format!(
                "{}: expected a FeatureCollection",
                path.display()
            ))),
        }
    }
}

/// Convert features to zones. Polygons become one zone each, multipolygons
/// are split; anything else is skipped.
pub fn zones_from_features(category: ZoneCategory, features: &[Feature]) -> Vec<Zone> {
    let mut zones = Vec::with_capacity(features.len());

    for (i, feature) in features.iter().enumerate() {
        let Some(geometry) = feature.geometry.clone() else {
            tracing::warn!(category = %category, feature = i, "Zone feature has no geometry, skipping");
            continue;
        };

        let polygons = match geo::Geometry::<f64>::try_from(geometry) {
            Ok(geo::Geometry::Polygon(polygon)) => vec![polygon],
            Ok(geo::Geometry::MultiPolygon(multi)) => multi.0,
            Ok(_) => {
                tracing::warn!(category = %category, feature = i, "Zone feature is not a polygon, skipping");
                continue;
            }
            Err(e) => {
                tracing::warn!(category = %category, feature = i, error = %e, "Invalid zone geometry, skipping");
                continue;
            }
        };

        for polygon in polygons {
            let zone = Zone::new(category, polygon);
            zones.push(match &feature.properties {
                Some(properties) => zone.with_metadata(properties.clone()),
                None => zone,
            });
        }
    }

    zones
}


#[cfg(test)]
mod tests {
    use super::fixtures::square_feature;
    use super::*;
    use geojson::{Geometry, Value};

    #[test]
    fn test_polygon_features_become_zones() {
        let features = vec![square_feature(77.0, 28.5, 0.01, "kashmere-gate")];
        let zones = zones_from_features(ZoneCategory::Theft, &features);

        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].category, ZoneCategory::Theft);
        let metadata = zones[0].metadata.as_ref().unwrap();
        assert_eq!(metadata["name"], "kashmere-gate");
    }

    #[test]
    fn test_multipolygon_is_split_and_points_are_skipped() {
        let square = |x: f64| {
            vec![vec![
                vec![x, 0.0],
                vec![x + 1.0, 0.0],
                vec![x + 1.0, 1.0],
                vec![x, 1.0],
                vec![x, 0.0],
            ]]
        };
        let multi = Feature::from(Geometry::new(Value::MultiPolygon(vec![square(0.0), square(5.0)])));
        let point = Feature::from(Geometry::new(Value::Point(vec![0.5, 0.5])));
        let empty = Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: None,
            foreign_members: None,
        };

        let zones = zones_from_features(ZoneCategory::Pothole, &[multi, point, empty]);
        assert_eq!(zones.len(), 2);
    }

    #[tokio::test]
    async fn test_memory_cache_expiry() {
        let cache = MemoryZoneCache::new();
        cache.set("zones:theft", "[]".into(), Duration::from_secs(60)).await.unwrap();
        cache.set("zones:pothole", "[]".into(), Duration::ZERO).await.unwrap();

        assert_eq!(cache.get("zones:theft").await.unwrap().as_deref(), Some("[]"));
        assert!(cache.get("zones:pothole").await.unwrap().is_none());
        assert!(cache.get("zones:missing").await.unwrap().is_none());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_dev_cache_alias_and_set_category() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zone_cache.dev.json");
        tokio::fs::write(
            &path,
            serde_json::json!({ "bike_lanes": [square_feature(77.0, 28.5, 0.01, "ring-road")] }).to_string(),
        )
        .await
        .unwrap();

        let dev = DevCacheFile::new(&path);
        let lanes = dev.read(ZoneCategory::BikeLane).await.unwrap().unwrap();
        assert_eq!(lanes.len(), 1);
        assert!(dev.read(ZoneCategory::Theft).await.unwrap().is_none());

        dev.set_category(ZoneCategory::Theft, vec![square_feature(77.1, 28.6, 0.01, "chandni-chowk")])
            .await
            .unwrap();
        assert_eq!(dev.read(ZoneCategory::Theft).await.unwrap().unwrap().len(), 1);
        // Other categories survive, rewritten under their canonical key.
        assert_eq!(dev.read(ZoneCategory::BikeLane).await.unwrap().unwrap().len(), 1);
        let raw: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert!(raw.get("bike_lane").is_some());
        assert!(raw.get("bike_lanes").is_none());
    }

    #[tokio::test]
    async fn test_dev_cache_canonical_key_beats_alias() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zone_cache.dev.json");
        let alias = vec![square_feature(77.0, 28.5, 0.01, "alias")];
        let canonical = vec![
            square_feature(77.0, 28.5, 0.01, "canonical-a"),
            square_feature(77.1, 28.5, 0.01, "canonical-b"),
        ];
        for document in [
            serde_json::json!({ "bike_lanes": alias, "bike_lane": canonical }),
            serde_json::json!({ "bike_lane": canonical, "bike_lanes": alias, "flood": [] }),
        ] {
            tokio::fs::write(&path, document.to_string()).await.unwrap();
            let lanes = DevCacheFile::new(&path).read(ZoneCategory::BikeLane).await.unwrap().unwrap();
            assert_eq!(lanes.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_dev_cache_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let dev = DevCacheFile::new(dir.path().join("zones").join("zone_cache.dev.json"));
        dev.set_category(ZoneCategory::Pothole, vec![]).await.unwrap();
        assert_eq!(dev.read(ZoneCategory::Pothole).await.unwrap(), Some(vec![]));
    }

    #[tokio::test]
    async fn test_dev_cache_missing_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let dev = DevCacheFile::new(dir.path().join("absent.json"));
        assert!(dev.read(ZoneCategory::Theft).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_geojson_directory() {
        let dir = tempfile::tempdir().unwrap();
        let collection = geojson::FeatureCollection {
            bbox: None,
            features: vec![
                square_feature(77.2, 28.6, 0.01, "minto-road"),
                square_feature(77.3, 28.7, 0.01, "ito"),
            ],
            foreign_members: None,
        };
        tokio::fs::write(
            dir.path().join("waterlogging_zones.geojson"),
            GeoJson::from(collection).to_string(),
        )
        .await
        .unwrap();

        let store = GeoJsonDirectory::new(dir.path());
        let features = store.fetch(ZoneCategory::Waterlogging).await.unwrap();
        assert_eq!(features.len(), 2);

        let err = store.fetch(ZoneCategory::Theft).await.unwrap_err();
        assert!(matches!(err, ZoneSourceError::Io { .. }));
    }
}
