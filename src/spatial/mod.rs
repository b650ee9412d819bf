//! Spatial queries over zone polygons.
//!
//! # Data Flow
//! ```text
//! ZoneStore refresh
//!     → zones grouped by category
//!     → index.rs (one R-tree of envelopes per category)
//!     → frozen inside a ZoneSnapshot
//!
//! Scoring (per sampled point):
//!     → envelope query → exact polygon test
//! ```
//!
//! # Design Decisions
//! - Categories index a fixed array, never a string map
//! - Index is immutable; refreshes build a new one
//! - Boundary-inclusive containment

pub mod coordinate;
pub mod index;

pub use coordinate::{Coordinate, MetroBounds};
pub use index::{SpatialIndex, METERS_PER_DEGREE};
