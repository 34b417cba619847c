//! ZoneRepository - owner of the zone collection
//!
//! The repository enforces id uniqueness, non-empty names and non-overlap at
//! creation time, and writes the whole collection to durable storage after every
//! successful mutation. Storage write failures are logged, not returned: the
//! in-memory collection stays authoritative and the next mutation retries a
//! full write.
//!
//! The overlap check and the insertion in [`ZoneRepository::create`] run under a
//! single `&mut self` borrow, so they cannot interleave with another mutation.

use crate::geometry::{self, OverlapReport};
use crate::storage::{self, StorageBackend};
use crate::{LatLng, Result, Shape, Zone, ZoneError, ZoneMetadata, ZoneQuery, ZoneUpdate};
use serde::{Deserialize, Serialize};

/// Repository configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Key under which the serialized collection is stored
    pub storage_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key: "parking-zones".to_string(),
        }
    }
}

/// Owner of the authoritative zone collection
pub struct ZoneRepository {
    /// Zones in insertion order
    zones: Vec<Zone>,
    backend: Box<dyn StorageBackend>,
    config: Config,
    /// Set by structural mutations, cleared by a successful write
    dirty: bool,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl ZoneRepository {
    /// Create a repository and restore any previously persisted zones.
    ///
    /// Missing or unreadable data yields an empty collection.
    pub fn new(backend: Box<dyn StorageBackend>, config: Config) -> Self {
        let zones = Self::load(backend.as_ref(), &config.storage_key);
        Self {
            zones,
            backend,
            config,
            dirty: false,
        }
    }

    /// Create a repository on the platform's default storage backend
    pub fn with_default_backend(config: Config) -> Result<Self> {
        Ok(Self::new(storage::default_storage_backend()?, config))
    }

    fn load(backend: &dyn StorageBackend, key: &str) -> Vec<Zone> {
        let zones: Vec<Zone> = match storage::load_json_backend(backend, key) {
            Ok(Some(zones)) => zones,
            Ok(None) => {
                tracing::info!("No persisted zones found, starting fresh");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("Discarding unreadable persisted zones: {}", e);
                return Vec::new();
            }
        };

        let mut unique: Vec<Zone> = Vec::with_capacity(zones.len());
        for zone in zones {
            if unique.iter().any(|z| z.id() == zone.id()) {
                tracing::warn!("Dropping persisted zone with duplicate id {}", zone.id());
                continue;
            }
            unique.push(zone);
        }

        tracing::info!("Restored {} zones", unique.len());
        unique
    }

    /// All zones in insertion order
    #[inline]
    pub fn list(&self) -> &[Zone] {
        &self.zones
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id() == id)
    }

    /// Zone under a clicked point, if any
    pub fn zone_at(&self, point: LatLng) -> Option<&Zone> {
        self.zones.iter().find(|z| z.contains(point))
    }

    /// Filtered and sorted view for display
    pub fn query(&self, query: &ZoneQuery) -> Vec<&Zone> {
        query.apply(&self.zones)
    }

    /// Check a drawn shape against the current collection without storing it
    pub fn check_overlap(&self, shape: &Shape) -> OverlapReport<'_> {
        geometry::detect_overlap(shape, &self.zones)
    }

    /// Whether the latest mutation has not reached durable storage yet
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Store a new zone.
    ///
    /// Fails with [`ZoneError::Validation`] for an empty name and with
    /// [`ZoneError::Overlap`] when the shape conflicts with existing zones; neither
    /// failure changes the collection.
    pub fn create(&mut self, shape: Shape, metadata: ZoneMetadata) -> Result<Zone> {
        let name = validated_name(&metadata.name)?;

        let report = geometry::detect_overlap(&shape, &self.zones);
        if report.overlaps {
            let conflicts = report.conflict_names();
            tracing::info!(
                "Rejected zone '{}': overlaps with {}",
                name,
                conflicts.join(", ")
            );
            return Err(ZoneError::Overlap { conflicts });
        }

        let zone = Zone::new(
            self.fresh_id(),
            shape,
            ZoneMetadata {
                name,
                color_tag: metadata.color_tag,
            },
        );
        tracing::info!(
            "Created {:?} zone '{}' ({}, {:.1} m²)",
            zone.shape_type(),
            zone.name(),
            zone.id(),
            zone.area()
        );

        self.zones.push(zone.clone());
        self.dirty = true;
        self.persist();
        Ok(zone)
    }

    /// Change a zone's name and/or color tag; geometry is never touched
    pub fn update(&mut self, id: &str, update: ZoneUpdate) -> Result<Zone> {
        let name = update.name.as_deref().map(validated_name).transpose()?;

        let zone = self
            .zones
            .iter_mut()
            .find(|z| z.id() == id)
            .ok_or_else(|| ZoneError::NotFound(id.to_string()))?;

        let mut changed = false;
        if let Some(name) = name
            && name != zone.name()
        {
            zone.set_name(name);
            changed = true;
        }
        if let Some(color_tag) = update.color_tag
            && color_tag != zone.color_tag()
        {
            zone.set_color_tag(color_tag);
            changed = true;
        }

        let updated = zone.clone();
        if changed {
            tracing::info!("Updated zone '{}' ({})", updated.name(), updated.id());
            self.dirty = true;
        }
        self.persist();
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let index = self
            .zones
            .iter()
            .position(|z| z.id() == id)
            .ok_or_else(|| ZoneError::NotFound(id.to_string()))?;

        let zone = self.zones.remove(index);
        tracing::info!("Deleted zone '{}' ({})", zone.name(), zone.id());
        self.dirty = true;
        self.persist();
        Ok(())
    }

    /// Remove every zone
    pub fn clear(&mut self) {
        if !self.zones.is_empty() {
            tracing::info!("Clearing {} zones", self.zones.len());
            self.zones.clear();
            self.dirty = true;
        }
        self.persist();
    }

    /// Write pending changes now, returning the storage error if the write fails
    pub fn flush(&mut self) -> Result<()> {
        if self.dirty {
            self.write()?;
        }
        Ok(())
    }

    /// Write the full collection if it changed; failures are logged and retried on the next mutation
    fn persist(&mut self) {
        if !self.dirty {
            return;
        }
        if let Err(e) = self.write() {
            tracing::error!("Failed to persist {} zones: {}", self.zones.len(), e);
        }
    }

    fn write(&mut self) -> Result<()> {
        #[cfg(feature = "profiling")]
        profiling::scope!("repository::write");

        storage::save_json_backend(self.backend.as_ref(), &self.config.storage_key, &self.zones)?;
        self.dirty = false;
        tracing::debug!("Persisted {} zones", self.zones.len());
        Ok(())
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

/// Trimmed, non-empty zone name
fn validated_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ZoneError::Validation("zone name is required".to_string()));
    }
    Ok(trimmed.to_string())
}
