//! Axis-aligned bounding boxes and the overlap prefilter

use geo::BoundingRect;
use geo_types::Polygon;
use serde::{Deserialize, Serialize};

/// Bounding box in degrees, `[west, south, east, north]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Bounding box of a polygon, `None` when it has no vertices
    pub fn of_polygon(polygon: &Polygon<f64>) -> Option<Self> {
        polygon
            .bounding_rect()
            .map(|rect| Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    /// Grow the box by the given number of degrees on each side
    pub fn padded(&self, d_lng: f64, d_lat: f64) -> Self {
        Self {
            west: self.west - d_lng,
            south: self.south - d_lat,
            east: self.east + d_lng,
            north: self.north + d_lat,
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }
}

/// Cheap overlap prefilter.
///
/// `false` is authoritative: the boxes are disjoint and the exact test can
/// be skipped. `true` only means the exact test is required.
#[inline]
pub fn fast_may_overlap(a: &BBox, b: &BBox) -> bool {
    !(a.east < b.west || b.east < a.west || a.north < b.south || b.north < a.south)
}
