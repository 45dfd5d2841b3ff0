//! Local planar projection around the venue
//!
//! An equirectangular projection centred on a fixed origin. Over the few
//! kilometers a venue spans the distortion is far below placement
//! tolerances, and it avoids geodesic math in every area and buffer call.

use geo::MapCoords;
use geo_types::{Coord, Polygon};

/// Meters per degree of latitude (and of longitude at the equator)
pub const METERS_PER_DEGREE: f64 = 111_320.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin: Coord<f64>,
    meters_per_deg_lng: f64,
    meters_per_deg_lat: f64,
}

impl LocalProjection {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            origin: Coord {
                x: longitude,
                y: latitude,
            },
            meters_per_deg_lng: METERS_PER_DEGREE * latitude.to_radians().cos(),
            meters_per_deg_lat: METERS_PER_DEGREE,
        }
    }

    pub fn origin(&self) -> Coord<f64> {
        self.origin
    }

    /// Degrees (x = lng, y = lat) to meters east/north of the origin
    #[inline]
    pub fn to_meters(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (c.x - self.origin.x) * self.meters_per_deg_lng,
            y: (c.y - self.origin.y) * self.meters_per_deg_lat,
        }
    }

    /// Meters east/north of the origin back to degrees
    #[inline]
    pub fn to_degrees(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.origin.x + c.x / self.meters_per_deg_lng,
            y: self.origin.y + c.y / self.meters_per_deg_lat,
        }
    }

    pub fn project(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        polygon.map_coords(|c| self.to_meters(c))
    }

    pub fn unproject(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        polygon.map_coords(|c| self.to_degrees(c))
    }

    /// Distance in meters expressed as (degrees of longitude, degrees of latitude)
    pub fn meters_to_degrees(&self, meters: f64) -> (f64, f64) {
        (
            meters / self.meters_per_deg_lng,
            meters / self.meters_per_deg_lat,
        )
    }

    /// Build a polygon in degrees from an outline given in local meters
    pub fn polygon_from_meters(&self, outline: &[(f64, f64)]) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = outline
            .iter()
            .map(|&(x, y)| self.to_degrees(Coord { x, y }))
            .collect();
        Polygon::new(coords.into(), vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let proj = LocalProjection::new(57.62, 14.92);
        let c = Coord { x: 14.925, y: 57.623 };
        let back = proj.to_degrees(proj.to_meters(c));
        assert!((back.x - c.x).abs() < 1e-12);
        assert!((back.y - c.y).abs() < 1e-12);
    }

    #[test]
    fn test_longitude_shrinks_with_latitude() {
        let proj = LocalProjection::new(60.0, 0.0);
        let (dlng, dlat) = proj.meters_to_degrees(100.0);
        // cos(60°) = 0.5, so a degree of longitude is half as long
        assert!((dlng / dlat - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_copied_projection_matches_source() {
        let proj = LocalProjection::new(57.62, 14.92);
        let copy = proj;
        assert_eq!(copy, proj);
        assert_eq!(copy.origin(), Coord { x: 14.92, y: 57.62 });
        let c = Coord { x: 30.0, y: -12.0 };
        assert_eq!(copy.to_degrees(c), proj.to_degrees(c));
    }
}
