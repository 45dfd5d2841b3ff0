//! One editing session over a set of placed entities
//!
//! The session owns every piece of mutable state the rules read: the placed
//! set, the spatial cache and the scheduler. Each mutation brings the cache
//! up to date before returning, so no later tick can read a memo computed
//! for an outline that no longer exists.

use crate::core::config::PlacementConfig;
use crate::core::error::{PlacementError, Result};
use crate::core::types::EntityId;
use crate::entity::{Entity, EntityProperties, EntitySet};
use crate::geometry::{GeoAdapter, GeometryAdapter, LocalProjection};
use crate::regions::{Layer, ReferenceLayers, RegionFeature};
use crate::rules::{RuleContext, RuleRegistry};
use crate::spatial::{CacheStats, Cluster, ClusterAggregator, SpatialCache};
use crate::validation::{EntityReport, Tick, ValidationScheduler};
use geo_types::Polygon;

pub struct PlacementSession {
    config: PlacementConfig,
    adapter: GeoAdapter,
    layers: ReferenceLayers,
    entities: EntitySet,
    cache: SpatialCache,
    registry: RuleRegistry,
    scheduler: ValidationScheduler,
}

impl PlacementSession {
    pub fn new(
        config: PlacementConfig,
        layers: ReferenceLayers,
        registry: RuleRegistry,
    ) -> Result<Self> {
        config.validate()?;
        let adapter = GeoAdapter::new(
            LocalProjection::new(config.venue_latitude, config.venue_longitude),
            config.buffer_segments,
        );
        for layer in registry.missing_layers(&layers) {
            tracing::warn!("Layer {} is not loaded; rules reading it will not trigger", layer);
        }
        let scheduler = ValidationScheduler::new(config.chunk_size);

        Ok(Self {
            config,
            adapter,
            layers,
            entities: EntitySet::new(),
            cache: SpatialCache::new(),
            registry,
            scheduler,
        })
    }

    pub fn with_standard_rules(config: PlacementConfig, layers: ReferenceLayers) -> Result<Self> {
        Self::new(config, layers, RuleRegistry::standard())
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn adapter(&self) -> &GeoAdapter {
        &self.adapter
    }

    pub fn layers(&self) -> &ReferenceLayers {
        &self.layers
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn entities(&self) -> &EntitySet {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn scheduler(&self) -> &ValidationScheduler {
        &self.scheduler
    }

    pub fn cache(&self) -> &SpatialCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Replace a reference layer; every entity may be affected
    pub fn set_layer(&mut self, layer: Layer, features: Vec<RegionFeature>) {
        tracing::info!("Layer {} replaced with {} features", layer, features.len());
        self.layers.insert(layer, features);
        self.revalidate_all();
    }

    /// Add or replace an entity and queue it and its cluster neighbours
    pub fn upsert(&mut self, entity: Entity) -> Option<Entity> {
        let id = entity.id;
        let before = self.cluster_members(id);
        let previous = self.entities.upsert(entity);
        if let Some(current) = self.entities.get(id) {
            self.cache.refresh(current);
        }
        let after = self.cluster_members(id);
        self.scheduler.request_incremental(before.into_iter().chain(after));
        previous
    }

    /// Bulk load; queues a full pass
    pub fn load(&mut self, entities: impl IntoIterator<Item = Entity>) {
        for entity in entities {
            if let Some(previous) = self.entities.upsert(entity) {
                tracing::debug!("Entity {} loaded twice, keeping the later one", previous.id);
            }
        }
        for entity in self.entities.iter() {
            self.cache.refresh(entity);
        }
        self.revalidate_all();
    }

    pub fn update_geometry(&mut self, id: EntityId, geometry: Polygon<f64>) -> Result<()> {
        if !self.entities.contains(id) {
            return Err(PlacementError::UnknownEntity(id));
        }
        let before = self.cluster_members(id);
        let entity = self
            .entities
            .get_mut(id)
            .ok_or(PlacementError::UnknownEntity(id))?;
        entity.set_geometry(geometry);
        self.cache.refresh(entity);

        let after = self.cluster_members(id);
        self.scheduler.request_incremental(before.into_iter().chain(after));
        Ok(())
    }

    /// Properties never change cluster connectivity, so only the entity
    /// itself is queued
    pub fn update_properties(&mut self, id: EntityId, properties: EntityProperties) -> Result<()> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or(PlacementError::UnknownEntity(id))?;
        entity.properties = properties;
        self.scheduler.request_incremental([id]);
        Ok(())
    }

    /// Remove an entity and queue its former cluster neighbours
    pub fn remove(&mut self, id: EntityId) -> Result<Entity> {
        let before = self.cluster_members(id);
        let removed = self
            .entities
            .remove(id)
            .ok_or(PlacementError::UnknownEntity(id))?;
        self.cache.forget(id);
        self.scheduler.forget(id);
        self.scheduler
            .request_incremental(before.into_iter().filter(|member| *member != id));
        Ok(removed)
    }

    /// Queue every placed entity, superseding any pass in progress
    pub fn revalidate_all(&mut self) {
        let ids: Vec<EntityId> = self.entities.ids().collect();
        tracing::debug!("Full revalidation of {} entities", ids.len());
        self.scheduler.request_full(ids);
    }

    pub fn tick(&mut self) -> Tick {
        let mut ctx = RuleContext::new(
            &self.adapter,
            &self.config,
            &self.layers,
            &self.entities,
            &mut self.cache,
        );
        self.scheduler.tick(&self.registry, &mut ctx)
    }

    /// Tick until idle without yielding. Returns entities evaluated.
    pub fn run_to_idle(&mut self) -> usize {
        let mut total = 0;
        loop {
            match self.tick() {
                Tick::Yield { processed, .. } => total += processed,
                Tick::Idle { processed } => return total + processed,
            }
        }
    }

    /// Tick until idle, yielding to the runtime between chunks
    pub async fn drain(&mut self) -> usize {
        let mut ctx = RuleContext::new(
            &self.adapter,
            &self.config,
            &self.layers,
            &self.entities,
            &mut self.cache,
        );
        self.scheduler.drain(&self.registry, &mut ctx).await
    }

    pub fn report(&self, id: EntityId) -> Option<&EntityReport> {
        self.scheduler.report(id)
    }

    pub fn reports(&self) -> impl Iterator<Item = &EntityReport> {
        self.scheduler.reports()
    }

    /// Published reports, worst severity first
    pub fn ranked_reports(&self) -> Vec<&EntityReport> {
        let mut reports: Vec<&EntityReport> = self.reports().collect();
        reports.sort_by(|a, b| {
            b.worst_severity()
                .cmp(&a.worst_severity())
                .then_with(|| b.violations.len().cmp(&a.violations.len()))
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        reports
    }

    pub fn cluster_of(&mut self, id: EntityId) -> Result<Cluster> {
        let entity = self
            .entities
            .get(id)
            .ok_or(PlacementError::UnknownEntity(id))?;
        let aggregator = ClusterAggregator::new(&self.adapter, &self.config);
        Ok(aggregator.cluster(entity, &self.entities, &mut self.cache))
    }

    /// The entity's outline grown by the fire-safety distance
    pub fn buffered_geometry(&mut self, id: EntityId) -> Result<Polygon<f64>> {
        let entity = self
            .entities
            .get(id)
            .ok_or(PlacementError::UnknownEntity(id))?;
        if entity.is_degenerate() {
            return Err(PlacementError::DegenerateGeometry(id));
        }
        self.cache.refresh(entity);
        if let Some(buffered) = self.cache.get_buffer(id) {
            return Ok(buffered.clone());
        }
        let buffered = self.adapter.buffer(entity.geometry(), self.config.fire_buffer_m);
        self.cache.set_buffer(id, buffered.clone());
        Ok(buffered)
    }

    fn cluster_members(&mut self, id: EntityId) -> Vec<EntityId> {
        match self.entities.get(id) {
            Some(entity) if !entity.is_degenerate() => {
                let aggregator = ClusterAggregator::new(&self.adapter, &self.config);
                aggregator.cluster(entity, &self.entities, &mut self.cache).members
            }
            Some(_) => vec![id],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Severity;

    fn session() -> PlacementSession {
        PlacementSession::with_standard_rules(PlacementConfig::default(), ReferenceLayers::new())
            .unwrap()
    }

    fn square(session: &PlacementSession, x: f64, side: f64) -> Polygon<f64> {
        session.adapter().projection().polygon_from_meters(&[
            (x, 0.0),
            (x + side, 0.0),
            (x + side, side),
            (x, side),
        ])
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PlacementConfig {
            fire_buffer_m: -1.0,
            ..Default::default()
        };
        assert!(PlacementSession::with_standard_rules(config, ReferenceLayers::new()).is_err());
    }

    #[test]
    fn test_update_unknown_entity() {
        let mut s = session();
        let id = EntityId::new();
        let poly = square(&s, 0.0, 10.0);
        assert!(matches!(
            s.update_geometry(id, poly),
            Err(PlacementError::UnknownEntity(_))
        ));
        assert!(s.remove(id).is_err());
    }

    #[test]
    fn test_property_update_revalidates() {
        let mut s = session();
        let poly = square(&s, 0.0, 10.0);
        let id = EntityId::new();
        s.upsert(Entity::new(id, poly, EntityProperties::default()));
        s.run_to_idle();
        assert!(!s.report(id).unwrap().is_triggered("powerful"));

        s.update_properties(
            id,
            EntityProperties {
                power_need: Some(9000.0),
                ..Default::default()
            },
        )
        .unwrap();
        s.run_to_idle();
        let report = s.report(id).unwrap();
        assert!(report.is_triggered("powerful"));
        assert_eq!(report.violation("powerful").unwrap().severity, Severity::Low);
    }

    #[test]
    fn test_remove_forgets_everything() {
        let mut s = session();
        let a = EntityId::new();
        let b = EntityId::new();
        s.upsert(Entity::new(a, square(&s, 0.0, 10.0), EntityProperties::default()));
        s.upsert(Entity::new(b, square(&s, 12.0, 10.0), EntityProperties::default()));
        s.run_to_idle();
        assert_eq!(s.cluster_of(a).unwrap().len(), 2);

        s.remove(b).unwrap();
        s.run_to_idle();
        assert!(s.report(b).is_none());
        assert_eq!(s.cluster_of(a).unwrap().len(), 1);
        assert_eq!(s.cache_stats().overlap_pairs, 0);
    }

    #[test]
    fn test_buffered_geometry_is_larger() {
        let mut s = session();
        let id = EntityId::new();
        s.upsert(Entity::new(id, square(&s, 0.0, 10.0), EntityProperties::default()));
        let buffered = s.buffered_geometry(id).unwrap();
        let raw = s.entity(id).unwrap().geometry().clone();
        assert!(s.adapter().area(&buffered) > s.adapter().area(&raw));
        assert!(s.adapter().contains(&buffered, &raw));
    }
}
