//! Geometry capability used by the rules and the cluster aggregator
//!
//! Every operation takes canonical single polygons in degrees (x = lng,
//! y = lat). Metric results (areas, distances, buffers) go through the
//! adapter's [`LocalProjection`].

use crate::geometry::bbox::BBox;
use crate::geometry::projection::LocalProjection;
use geo::{
    Area, BooleanOps, Contains, ConvexHull, EuclideanDistance, Intersects, IsConvex,
    TriangulateEarcut,
};
use geo_types::{Coord, MultiPoint, MultiPolygon, Point, Polygon};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Pure geometry operations over polygons
pub trait GeometryAdapter {
    /// Planar area in m²
    fn area(&self, polygon: &Polygon<f64>) -> f64;

    /// True overlap: the shapes share points but neither contains the other
    fn overlaps(&self, a: &Polygon<f64>, b: &Polygon<f64>) -> bool;

    /// `outer` fully contains `inner`
    fn contains(&self, outer: &Polygon<f64>, inner: &Polygon<f64>) -> bool;

    /// Polygon expanded outward by `distance_m` meters
    fn buffer(&self, polygon: &Polygon<f64>, distance_m: f64) -> Polygon<f64>;

    fn bounding_box(&self, polygon: &Polygon<f64>) -> Option<BBox>;

    /// Planar distance in meters from a point to a polygon, zero inside it
    fn point_distance(&self, polygon: &Polygon<f64>, point: &Point<f64>) -> f64;

    /// Projection used to convert meters to degrees for box padding
    fn projection(&self) -> &LocalProjection;
}

/// [`GeometryAdapter`] backed by the `geo` crate
#[derive(Debug, Clone)]
pub struct GeoAdapter {
    projection: LocalProjection,
    segments: usize,
}

impl GeoAdapter {
    pub fn new(projection: LocalProjection, segments: usize) -> Self {
        Self {
            projection,
            segments: segments.max(1),
        }
    }

    /// Vertices of a polygon circumscribing the disc of radius `distance`
    /// around `vertex`. Edge midpoints sit on the circle, so the polygon
    /// never falls inside it.
    fn corner_points(
        &self,
        vertex: Coord<f64>,
        distance: f64,
    ) -> impl Iterator<Item = Coord<f64>> {
        let segments = self.segments;
        let radius = distance / (FRAC_PI_4 / segments as f64).cos();
        (0..segments * 4).map(move |i| {
            let angle = i as f64 * FRAC_PI_2 / segments as f64;
            Coord {
                x: vertex.x + radius * angle.cos(),
                y: vertex.y + radius * angle.sin(),
            }
        })
    }

    /// Minkowski sum of a convex shape with a disc: the hull of every
    /// vertex's circle.
    fn hull_of_discs(
        &self,
        vertices: impl Iterator<Item = Coord<f64>>,
        distance: f64,
    ) -> Polygon<f64> {
        let points: Vec<Point<f64>> = vertices
            .flat_map(|c| self.corner_points(c, distance))
            .map(Point::from)
            .collect();
        MultiPoint::new(points).convex_hull()
    }

    /// Concave outlines (or ones with holes) are split into triangles, each
    /// triangle is buffered as a convex shape and the pieces are unioned.
    fn buffer_general(&self, polygon: &Polygon<f64>, distance: f64) -> Polygon<f64> {
        let mut pieces = polygon
            .earcut_triangles()
            .into_iter()
            .map(|t| self.hull_of_discs(t.to_array().into_iter(), distance));

        let Some(first) = pieces.next() else {
            return polygon.clone();
        };
        let merged = pieces.fold(MultiPolygon::new(vec![first]), |acc, piece| {
            acc.union(&MultiPolygon::new(vec![piece]))
        });

        // Adjacent triangles share an edge, so their buffers overlap and the
        // union is a single polygon. Keep the largest if rounding splits off
        // slivers.
        merged
            .into_iter()
            .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
            .unwrap_or_else(|| polygon.clone())
    }
}

impl GeometryAdapter for GeoAdapter {
    fn area(&self, polygon: &Polygon<f64>) -> f64 {
        self.projection.project(polygon).unsigned_area()
    }

    fn overlaps(&self, a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
        if a.exterior().0.is_empty() || b.exterior().0.is_empty() {
            return false;
        }
        a.intersects(b) && !a.contains(b) && !b.contains(a)
    }

    fn contains(&self, outer: &Polygon<f64>, inner: &Polygon<f64>) -> bool {
        if outer.exterior().0.is_empty() || inner.exterior().0.is_empty() {
            return false;
        }
        outer.contains(inner)
    }

    fn buffer(&self, polygon: &Polygon<f64>, distance_m: f64) -> Polygon<f64> {
        if polygon.exterior().0.is_empty() || distance_m <= 0.0 {
            return polygon.clone();
        }
        let projected = self.projection.project(polygon);
        let buffered = if projected.interiors().is_empty() && projected.exterior().is_convex() {
            self.hull_of_discs(projected.exterior().coords().copied(), distance_m)
        } else {
            self.buffer_general(&projected, distance_m)
        };
        self.projection.unproject(&buffered)
    }

    fn bounding_box(&self, polygon: &Polygon<f64>) -> Option<BBox> {
        BBox::of_polygon(polygon)
    }

    fn point_distance(&self, polygon: &Polygon<f64>, point: &Point<f64>) -> f64 {
        if polygon.exterior().0.is_empty() {
            return f64::INFINITY;
        }
        if polygon.contains(point) || polygon.intersects(point) {
            return 0.0;
        }
        let projected = self.projection.project(polygon);
        let p = Point::from(self.projection.to_meters(point.0));
        p.euclidean_distance(&projected)
    }

    fn projection(&self) -> &LocalProjection {
        &self.projection
    }
}
