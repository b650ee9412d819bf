//! Process-wide zone store with a tiered fallback chain.
//!
//! # Responsibilities
//! - Load each category through dev cache → distributed cache → durable store
//!   on a lazy load, and dev cache → durable store → distributed cache on an
//!   explicit refresh
//! - Populate the distributed cache after a durable read
//! - Publish immutable snapshots readers can hold without locking
//! - Refresh lazily once the snapshot is older than the TTL
//!
//! # Design Decisions
//! - Snapshots are swapped whole (`ArcSwap`); readers never see a partial set
//! - Refreshes are serialized so bursts of stale readers trigger one load
//! - A category that fails at every tier keeps its last good zones
//!   (empty if it never loaded) and is reported, never raised to readers

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use geojson::Feature;
use tokio::sync::Mutex;

use crate::config::schema::{Environment, ZoneConfig};
use crate::observability::metrics;
use crate::spatial::SpatialIndex;
use crate::zones::source::{
    zones_from_features, DevCacheFile, GeoJsonDirectory, MemoryZoneCache, ZoneCache, ZoneSource,
};
use crate::zones::types::{DevZonesError, Zone, ZoneCategory, ZoneError, ZoneResult};

/// One immutable generation of zone data.
#[derive(Debug, Default)]
pub struct ZoneSnapshot {
    index: SpatialIndex,
    refreshed_at: Option<Instant>,
}

impl ZoneSnapshot {
    pub fn new(index: SpatialIndex) -> Self {
        Self {
            index,
            refreshed_at: Some(Instant::now()),
        }
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn zones(&self, category: ZoneCategory) -> &[Zone] {
        self.index.zones(category)
    }

    pub fn counts(&self) -> BTreeMap<ZoneCategory, usize> {
        self.index.counts()
    }

    /// When this snapshot was built; `None` for the initial empty snapshot.
    pub fn refreshed_at(&self) -> Option<Instant> {
        self.refreshed_at
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        self.refreshed_at.map_or(true, |at| at.elapsed() >= ttl)
    }
}

/// Which of the shared tiers a load consults first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TierOrder {
    /// Lazy loads on a stale read.
    CacheFirst,
    /// Explicit, periodic and change-triggered refreshes.
    SourceFirst,
}

/// The fallback tiers, each optional.
#[derive(Default, Clone)]
pub struct ZoneTiers {
    pub dev_cache: Option<DevCacheFile>,
    pub distributed: Option<Arc<dyn ZoneCache>>,
    pub durable: Option<Arc<dyn ZoneSource>>,
}

/// Shared, read-mostly zone data.
pub struct ZoneStore {
    current: ArcSwap<ZoneSnapshot>,
    tiers: ZoneTiers,
    ttl: Duration,
    refresh_lock: Mutex<()>,
}

impl ZoneStore {
    /// Create an empty store. Nothing is loaded until `refresh` or first access.
    pub fn new(tiers: ZoneTiers, ttl: Duration) -> Self {
        Self {
            current: ArcSwap::from_pointee(ZoneSnapshot::default()),
            tiers,
            ttl,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Build the tier chain described by the configuration.
    ///
    /// The dev cache file is only consulted in development.
    pub fn from_config(config: &ZoneConfig) -> Self {
        let dev_cache = match config.environment {
            Environment::Development => Some(DevCacheFile::new(&config.dev_cache_file)),
            Environment::Staging | Environment::Production => None,
        };

        let tiers = ZoneTiers {
            dev_cache,
            distributed: Some(Arc::new(MemoryZoneCache::new())),
            durable: Some(Arc::new(GeoJsonDirectory::new(&config.data_dir))),
        };

        Self::new(tiers, Duration::from_secs(config.cache_ttl_secs))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The current snapshot, without triggering a load.
    pub fn current(&self) -> Arc<ZoneSnapshot> {
        self.current.load_full()
    }

    /// The current snapshot, refreshed first if it has expired.
    ///
    /// Refresh failures are logged; the caller always gets a snapshot.
    pub async fn snapshot(&self) -> Arc<ZoneSnapshot> {
        let current = self.current.load_full();
        if !current.is_stale(self.ttl) {
            return current;
        }

        let _guard = self.refresh_lock.lock().await;
        // Another task may have refreshed while we waited.
        let current = self.current.load_full();
        if !current.is_stale(self.ttl) {
            return current;
        }

        if let Err(e) = self.refresh_locked(TierOrder::CacheFirst).await {
            tracing::warn!(error = %e, "Zone refresh degraded, serving remaining zones");
        }
        self.current.load_full()
    }

    /// Replace the current snapshot. Readers holding the old one keep it.
    pub fn publish(&self, snapshot: ZoneSnapshot) {
        tracing::info!(counts = ?snapshot.counts(), "Zone snapshot published");
        self.current.store(Arc::new(snapshot));
    }

    /// Zones of one category. Never fails; an unreachable source yields an empty list.
    pub async fn get_zones(&self, category: ZoneCategory) -> Vec<Zone> {
        self.snapshot().await.zones(category).to_vec()
    }

    /// Reload every category and publish a new snapshot.
    ///
    /// The durable store is read ahead of the distributed cache, so edits to
    /// the source show up here and replace the cached copy. The cache only
    /// answers when the durable store is down.
    ///
    /// Returns `SourceUnavailable` naming the categories that failed at every
    /// tier; the snapshot is still replaced for the rest.
    pub async fn refresh(&self) -> ZoneResult<()> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked(TierOrder::SourceFirst).await
    }

    /// Development only: replace one category in the dev cache file and reload.
    ///
    /// Returns the number of zones the category now holds. Stores built for
    /// staging or production have no dev cache tier and refuse.
    pub async fn set_dev_zones(
        &self,
        category: ZoneCategory,
        features: Vec<Feature>,
    ) -> Result<usize, DevZonesError> {
        let dev = self.tiers.dev_cache.as_ref().ok_or(DevZonesError::NotDevelopment)?;
        dev.set_category(category, features).await?;
        tracing::info!(category = %category, path = %dev.path().display(), "Dev zones replaced");

        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Zone refresh after dev override degraded");
        }
        Ok(self.current().zones(category).len())
    }

    async fn refresh_locked(&self, order: TierOrder) -> ZoneResult<()> {
        let previous = self.current.load_full();
        let mut failed = Vec::new();

        let mut layers: [Vec<Zone>; ZoneCategory::COUNT] = std::array::from_fn(|_| Vec::new());
        for category in ZoneCategory::ALL {
            layers[category.index()] = match self.load_category(category, order).await {
                Some(features) => zones_from_features(category, &features),
                None => {
                    failed.push(category);
                    previous.zones(category).to_vec()
                }
            };
            metrics::record_zones_loaded(category, layers[category.index()].len());
        }

        let snapshot = ZoneSnapshot::new(SpatialIndex::from_layers(layers));
        tracing::info!(failed = ?failed, "Zone refresh finished");
        self.publish(snapshot);

        if failed.is_empty() {
            Ok(())
        } else {
            Err(ZoneError::SourceUnavailable { categories: failed })
        }
    }

    /// Walk the tiers for one category; first success wins.
    async fn load_category(&self, category: ZoneCategory, order: TierOrder) -> Option<Vec<Feature>> {
        if let Some(features) = self.read_dev_cache(category).await {
            return Some(features);
        }

        match order {
            TierOrder::CacheFirst => match self.read_cache(category).await {
                Some(features) => Some(features),
                None => self.read_durable(category).await,
            },
            TierOrder::SourceFirst => match self.read_durable(category).await {
                Some(features) => Some(features),
                None => self.read_cache(category).await,
            },
        }
    }

    async fn read_dev_cache(&self, category: ZoneCategory) -> Option<Vec<Feature>> {
        let dev = self.tiers.dev_cache.as_ref()?;
        match dev.read(category).await {
            Ok(Some(features)) => {
                tracing::debug!(category = %category, path = %dev.path().display(), "Loaded zones from dev cache");
                metrics::record_zone_tier("dev_cache", true);
                Some(features)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(category = %category, error = %e, "Dev zone cache unreadable");
                metrics::record_zone_tier("dev_cache", false);
                None
            }
        }
    }

    async fn read_cache(&self, category: ZoneCategory) -> Option<Vec<Feature>> {
        let cache = self.tiers.distributed.as_ref()?;
        let key = category.cache_key();
        match cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Feature>>(&raw) {
                Ok(features) => {
                    tracing::debug!(category = %category, key = %key, "Loaded zones from cache");
                    metrics::record_zone_tier("cache", true);
                    Some(features)
                }
                Err(e) => {
                    tracing::warn!(category = %category, error = %e, "Discarding corrupt cached zones");
                    metrics::record_zone_tier("cache", false);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(category = %category, error = %e, "Zone cache unavailable");
                metrics::record_zone_tier("cache", false);
                None
            }
        }
    }

    /// Durable read; a success overwrites the cache entry.
    async fn read_durable(&self, category: ZoneCategory) -> Option<Vec<Feature>> {
        let durable = self.tiers.durable.as_ref()?;
        match durable.fetch(category).await {
            Ok(features) => {
                metrics::record_zone_tier("durable", true);
                if let Some(cache) = &self.tiers.distributed {
                    self.populate_cache(cache.as_ref(), &category.cache_key(), &features)
                        .await;
                }
                Some(features)
            }
            Err(e) => {
                tracing::warn!(category = %category, error = %e, "Durable zone store unavailable");
                metrics::record_zone_tier("durable", false);
                None
            }
        }
    }

    async fn populate_cache(&self, cache: &dyn ZoneCache, key: &str, features: &[Feature]) {
        let raw = match serde_json::to_string(features) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize zones for cache");
                return;
            }
        };
        if let Err(e) = cache.set(key, raw, self.ttl).await {
            tracing::warn!(key = %key, error = %e, "Failed to populate zone cache");
        }
    }
}
