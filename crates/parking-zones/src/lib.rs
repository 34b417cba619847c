//! Parking Zones - Non-overlapping Geographic Zone Management
//!
//! This library manages user-drawn map zones (polygons, rectangles and circles) and
//! guarantees that no two stored zones overlap. Each zone carries user metadata (name,
//! color tag) and derived geometric attributes (area in square meters, centroid).
//!
//! # Architecture
//!
//! - **[`normalize`]**: Converts raw drawing-surface coordinates into a canonical [`Shape`]
//! - **[`geometry`]**: Pure functions over shapes (area, centroid, overlap detection)
//! - **[`ZoneRepository`]**: Owns the zone collection and persists it through a
//!   [`StorageBackend`] on every mutation
//!
//! # Usage Example
//!
//! ```rust
//! use parking_zones::{
//!     ColorTag, Config, MemoryStorage, RawCoordinates, RawShape, ShapeType, ZoneMetadata,
//!     ZoneRepository, normalize,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut repository = ZoneRepository::new(Box::new(MemoryStorage::new()), Config::default());
//!
//! let raw = RawShape {
//!     shape_type: ShapeType::Circle,
//!     raw_coordinates: RawCoordinates::Pair([45.815, 15.9819]),
//!     radius: Some(50.0),
//! };
//! let shape = normalize(&raw)?;
//!
//! let zone = repository.create(shape, ZoneMetadata::new("Zone A", ColorTag::Blue))?;
//! assert_eq!(repository.list().len(), 1);
//! assert!(zone.area() > 7800.0);
//! # Ok(())
//! # }
//! ```
//!
//! All geometry runs in a local planar approximation (meters per degree at the
//! zone's latitude), which is accurate enough for the city-scale extents zones cover.

pub mod geometry;
mod normalize;
mod query;
mod repository;
mod shape;
pub mod storage;
pub mod utils;
mod zone;

// Public API exports
pub use geometry::{BoundingBox, OverlapReport, detect_overlap};
pub use normalize::{RawCoordinates, RawShape, normalize};
pub use query::{SortOrder, ZoneQuery};
pub use repository::{Config, ZoneRepository};
pub use shape::{Circle, LatLng, Ring, Shape, ShapeType};
pub use storage::{MemoryStorage, StorageBackend, StorageError, default_storage_backend};
pub use zone::{ColorTag, Zone, ZoneMetadata, ZoneUpdate};

/// Error types for zone operations
#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    #[error("Malformed shape: {0}")]
    MalformedShape(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Zone overlaps with: {}", .conflicts.join(", "))]
    Overlap { conflicts: Vec<String> },

    #[error("Zone not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, ZoneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        let _: fn() -> Config = Config::default;
        let _: fn() -> MemoryStorage = MemoryStorage::new;
    }

    #[test]
    fn test_overlap_error_lists_names() {
        let err = ZoneError::Overlap {
            conflicts: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(err.to_string(), "Zone overlaps with: A, B");
    }
}
