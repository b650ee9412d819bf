//! Zone data subsystem.
//!
//! # Data Flow
//! ```text
//! ZoneStore::refresh (startup, interval, file change, or stale read)
//!     → source.rs tier 1: dev cache file (development only)
//!     → source.rs tier 2: distributed cache `zones:{category}`
//!     → source.rs tier 3: durable store (populates tier 2)
//!     → GeoJSON features → Zone polygons
//!     → SpatialIndex → ZoneSnapshot
//!     → atomic swap; in-flight requests keep their old snapshot
//! ```
//!
//! # Design Decisions
//! - Explicitly constructed and injected; no global zone state
//! - Missing zone data degrades scoring to neutral, it never fails a request

pub mod refresh;
pub mod source;
pub mod store;
pub mod types;
pub mod watcher;

pub use refresh::ZoneRefresher;
pub use source::{DevCacheFile, GeoJsonDirectory, MemoryZoneCache, ZoneCache, ZoneSource};
pub use store::{ZoneSnapshot, ZoneStore, ZoneTiers};
pub use types::{DevZonesError, Zone, ZoneCategory, ZoneError, ZoneSourceError};
pub use watcher::ZoneWatcher;
