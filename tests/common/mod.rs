//! Shared fixtures for integration tests

#![allow(dead_code)]

use camp_placement::core::types::EntityId;
use camp_placement::entity::{Entity, EntityProperties};
use camp_placement::geometry::{BBox, GeoAdapter, GeometryAdapter, LocalProjection};
use camp_placement::PlacementConfig;
use geo_types::{Point, Polygon};
use std::cell::Cell;

/// Side (m) of a 500 m² square
pub const SIDE_500: f64 = 22.360_679_774_997_9;

pub fn config() -> PlacementConfig {
    PlacementConfig::default()
}

pub fn adapter() -> GeoAdapter {
    let config = config();
    GeoAdapter::new(
        LocalProjection::new(config.venue_latitude, config.venue_longitude),
        config.buffer_segments,
    )
}

/// Axis-aligned rectangle given in meters from the venue origin
pub fn rect(adapter: &dyn GeometryAdapter, x: f64, y: f64, w: f64, h: f64) -> Polygon<f64> {
    adapter
        .projection()
        .polygon_from_meters(&[(x, y), (x + w, y), (x + w, y + h), (x, y + h)])
}

pub fn square(adapter: &dyn GeometryAdapter, x: f64, y: f64, side: f64) -> Polygon<f64> {
    rect(adapter, x, y, side, side)
}

pub fn complete_props(name: &str) -> EntityProperties {
    EntityProperties {
        name: name.to_string(),
        contact_info: format!("{}@example.org", name.to_lowercase()),
        ..Default::default()
    }
}

pub fn camp(adapter: &dyn GeometryAdapter, x: f64, y: f64, side: f64) -> Entity {
    Entity::new(
        EntityId::new(),
        square(adapter, x, y, side),
        EntityProperties::default(),
    )
}

/// Adapter wrapper counting the operations whose results the cache memoizes
pub struct CountingAdapter {
    inner: GeoAdapter,
    pub areas: Cell<usize>,
    pub overlaps: Cell<usize>,
    pub contains: Cell<usize>,
    pub buffers: Cell<usize>,
}

impl CountingAdapter {
    pub fn new(inner: GeoAdapter) -> Self {
        Self {
            inner,
            areas: Cell::new(0),
            overlaps: Cell::new(0),
            contains: Cell::new(0),
            buffers: Cell::new(0),
        }
    }

    pub fn total(&self) -> usize {
        self.areas.get() + self.overlaps.get() + self.contains.get() + self.buffers.get()
    }

    pub fn reset(&self) {
        self.areas.set(0);
        self.overlaps.set(0);
        self.contains.set(0);
        self.buffers.set(0);
    }

    fn bump(counter: &Cell<usize>) {
        counter.set(counter.get() + 1);
    }
}

impl GeometryAdapter for CountingAdapter {
    fn area(&self, polygon: &Polygon<f64>) -> f64 {
        Self::bump(&self.areas);
        self.inner.area(polygon)
    }

    fn overlaps(&self, a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
        Self::bump(&self.overlaps);
        self.inner.overlaps(a, b)
    }

    fn contains(&self, outer: &Polygon<f64>, inner: &Polygon<f64>) -> bool {
        Self::bump(&self.contains);
        self.inner.contains(outer, inner)
    }

    fn buffer(&self, polygon: &Polygon<f64>, distance_m: f64) -> Polygon<f64> {
        Self::bump(&self.buffers);
        self.inner.buffer(polygon, distance_m)
    }

    fn bounding_box(&self, polygon: &Polygon<f64>) -> Option<BBox> {
        self.inner.bounding_box(polygon)
    }

    fn point_distance(&self, polygon: &Polygon<f64>, point: &Point<f64>) -> f64 {
        self.inner.point_distance(polygon, point)
    }

    fn projection(&self) -> &LocalProjection {
        self.inner.projection()
    }
}
