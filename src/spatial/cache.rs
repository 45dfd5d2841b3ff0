//! Memoized areas, buffers and pairwise overlap results
//!
//! One cache lives for one editing session and is passed by reference into
//! every evaluation. Overlap entries are always written in both directions
//! and removed in both directions, so a half-link can never be observed.

use crate::core::types::EntityId;
use crate::entity::Entity;
use ahash::AHashMap;
use geo_types::{Coord, Polygon};

/// Entry counts, mostly for diagnostics and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub areas: usize,
    pub buffers: usize,
    /// Unordered pairs with a cached result
    pub overlap_pairs: usize,
    pub snapshots: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SpatialCache {
    areas: AHashMap<EntityId, f64>,
    buffers: AHashMap<EntityId, Polygon<f64>>,
    overlaps: AHashMap<EntityId, AHashMap<EntityId, bool>>,
    snapshots: AHashMap<EntityId, Vec<Vec<Coord<f64>>>>,
}

impl SpatialCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_area(&self, id: EntityId) -> bool {
        self.areas.contains_key(&id)
    }

    pub fn get_area(&self, id: EntityId) -> Option<f64> {
        self.areas.get(&id).copied()
    }

    pub fn set_area(&mut self, id: EntityId, area: f64) {
        self.areas.insert(id, area);
    }

    pub fn get_buffer(&self, id: EntityId) -> Option<&Polygon<f64>> {
        self.buffers.get(&id)
    }

    pub fn set_buffer(&mut self, id: EntityId, buffered: Polygon<f64>) {
        self.buffers.insert(id, buffered);
    }

    pub fn has_overlap(&self, a: EntityId, b: EntityId) -> bool {
        self.get_overlap(a, b).is_some()
    }

    pub fn get_overlap(&self, a: EntityId, b: EntityId) -> Option<bool> {
        self.overlaps.get(&a).and_then(|row| row.get(&b)).copied()
    }

    /// Record a pair result under both orderings
    pub fn set_overlap(&mut self, a: EntityId, b: EntityId, value: bool) {
        self.overlaps.entry(a).or_default().insert(b, value);
        self.overlaps.entry(b).or_default().insert(a, value);
    }

    /// Compare the entity's rings against the stored snapshot.
    ///
    /// Returns `true` and stores the new rings when the ring count, a ring
    /// length or any vertex differs (or nothing was stored yet). Returns
    /// `false` without touching the snapshot otherwise.
    pub fn coordinates_changed(&mut self, entity: &Entity) -> bool {
        if let Some(snapshot) = self.snapshots.get(&entity.id) {
            let ring_count = 1 + entity.geometry().interiors().len();
            let unchanged = snapshot.len() == ring_count
                && entity
                    .rings()
                    .zip(snapshot)
                    .all(|(ring, stored)| ring == stored.as_slice());
            if unchanged {
                return false;
            }
        }
        let rings = entity.rings().map(|ring| ring.to_vec()).collect();
        self.snapshots.insert(entity.id, rings);
        true
    }

    /// Drop the area, buffer and every overlap entry involving `id`
    pub fn invalidate(&mut self, id: EntityId) {
        self.areas.remove(&id);
        self.buffers.remove(&id);
        if let Some(row) = self.overlaps.remove(&id) {
            for other in row.keys() {
                if let Some(other_row) = self.overlaps.get_mut(other) {
                    other_row.remove(&id);
                    if other_row.is_empty() {
                        self.overlaps.remove(other);
                    }
                }
            }
        }
    }

    /// Invalidate the entity's memos if its geometry changed since last seen.
    /// Returns whether anything was invalidated.
    pub fn refresh(&mut self, entity: &Entity) -> bool {
        if self.coordinates_changed(entity) {
            self.invalidate(entity.id);
            true
        } else {
            false
        }
    }

    /// Remove every trace of an entity that left the placed set
    pub fn forget(&mut self, id: EntityId) {
        self.invalidate(id);
        self.snapshots.remove(&id);
    }

    pub fn clear(&mut self) {
        self.areas.clear();
        self.buffers.clear();
        self.overlaps.clear();
        self.snapshots.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let directed: usize = self.overlaps.values().map(|row| row.len()).sum();
        let self_pairs = self
            .overlaps
            .iter()
            .filter(|(id, row)| row.contains_key(*id))
            .count();
        CacheStats {
            areas: self.areas.len(),
            buffers: self.buffers.len(),
            overlap_pairs: (directed + self_pairs) / 2,
            snapshots: self.snapshots.len(),
        }
    }
}
