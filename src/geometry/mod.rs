//! Geometry capability, projection, bounding boxes and GeoJSON ingestion

pub mod adapter;
pub mod bbox;
pub mod ingest;
pub mod projection;

pub use adapter::{GeoAdapter, GeometryAdapter};
pub use bbox::{fast_may_overlap, BBox};
pub use projection::LocalProjection;

use serde::{Deserialize, Serialize};

/// Kind of a canonical geometry after ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPolygon,
}
