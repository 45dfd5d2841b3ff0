//! Fire-safety cluster aggregation
//!
//! Two entities are buffer-connected when one's fire-buffered outline
//! touches the other's raw outline. A cluster is everything reachable
//! through such links; its area is the sum of its members' areas.
//!
//! The walk uses an explicit work stack and marks an entity visited before
//! queueing it, so every reachable entity is expanded exactly once and the
//! walk terminates on any overlap graph, fully connected ones included.

use crate::core::config::PlacementConfig;
use crate::core::types::EntityId;
use crate::entity::{Entity, EntitySet};
use crate::geometry::{fast_may_overlap, BBox, GeometryAdapter};
use crate::spatial::cache::SpatialCache;
use ahash::AHashSet;

/// Result of one aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Visited entities in visiting order, starting entity first
    pub members: Vec<EntityId>,
    pub total_area: f64,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

pub struct ClusterAggregator<'a> {
    adapter: &'a dyn GeometryAdapter,
    buffer_m: f64,
    margin_m: f64,
}

impl<'a> ClusterAggregator<'a> {
    pub fn new(adapter: &'a dyn GeometryAdapter, config: &PlacementConfig) -> Self {
        Self {
            adapter,
            buffer_m: config.fire_buffer_m,
            margin_m: config.bbox_margin_m,
        }
    }

    /// Total area of the cluster `entity` belongs to
    pub fn cluster_area(
        &self,
        entity: &Entity,
        entities: &EntitySet,
        cache: &mut SpatialCache,
    ) -> f64 {
        self.cluster(entity, entities, cache).total_area
    }

    /// Walk the cluster starting at `entity`.
    ///
    /// `entity` need not be part of `entities`; when a member shares its id,
    /// `entity` stands in for it.
    pub fn cluster(
        &self,
        entity: &Entity,
        entities: &EntitySet,
        cache: &mut SpatialCache,
    ) -> Cluster {
        cache.refresh(entity);

        // One pass over the set: bring stale memos up to date before any of
        // them is read, and compute each candidate's box once.
        let candidates: Vec<(&Entity, BBox)> = entities
            .iter()
            .filter(|other| other.id != entity.id)
            .filter_map(|other| {
                cache.refresh(other);
                self.adapter.bounding_box(other.geometry()).map(|bbox| (other, bbox))
            })
            .collect();

        let mut visited: AHashSet<EntityId> = AHashSet::with_capacity(candidates.len() + 1);
        visited.insert(entity.id);
        let mut stack: Vec<&Entity> = vec![entity];
        let mut members = Vec::new();
        let mut total_area = 0.0;

        let (pad_lng, pad_lat) = self
            .adapter
            .projection()
            .meters_to_degrees(self.buffer_m + self.margin_m);

        while let Some(node) = stack.pop() {
            members.push(node.id);
            total_area += self.area(node, cache);

            let Some(reach) = self
                .adapter
                .bounding_box(node.geometry())
                .map(|bbox| bbox.padded(pad_lng, pad_lat))
            else {
                tracing::debug!("Entity {} has no vertices, skipping its neighbours", node.id);
                continue;
            };

            for (other, bbox) in &candidates {
                if visited.contains(&other.id) || !fast_may_overlap(&reach, bbox) {
                    continue;
                }
                if self.connected(node, other, cache) {
                    visited.insert(other.id);
                    stack.push(*other);
                }
            }
        }

        Cluster {
            members,
            total_area,
        }
    }

    /// Memoized planar area of an entity
    pub fn area(&self, entity: &Entity, cache: &mut SpatialCache) -> f64 {
        if let Some(area) = cache.get_area(entity.id) {
            return area;
        }
        let area = self.adapter.area(entity.geometry());
        cache.set_area(entity.id, area);
        area
    }

    /// Memoized buffer-connection test between two entities.
    ///
    /// Computed in canonical id order (lower id's buffer against the higher
    /// id's outline), so the result does not depend on argument order.
    pub fn connected(&self, a: &Entity, b: &Entity, cache: &mut SpatialCache) -> bool {
        if let Some(hit) = cache.get_overlap(a.id, b.id) {
            return hit;
        }
        let (low, high) = if a.id <= b.id { (a, b) } else { (b, a) };

        if cache.get_buffer(low.id).is_none() {
            let buffered = self.adapter.buffer(low.geometry(), self.buffer_m);
            cache.set_buffer(low.id, buffered);
        }

        let hit = match cache.get_buffer(low.id) {
            Some(buffered) => {
                self.adapter.overlaps(buffered, high.geometry())
                    || self.adapter.contains(buffered, high.geometry())
                    || self.adapter.contains(high.geometry(), buffered)
            }
            None => false,
        };

        cache.set_overlap(a.id, b.id, hit);
        hit
    }
}
