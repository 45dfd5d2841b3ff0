//! GeoJSON ingestion
//!
//! Collaborators hand over bare geometries, single features or feature
//! collections. [`GeoJsonShape`] resolves the three shapes once, at the
//! boundary, so everything downstream only sees canonical [`Entity`] and
//! [`RegionFeature`] values.
//!
//! A malformed document fails the load. A malformed feature inside a valid
//! document is logged and skipped, and the rest of the load goes through.

use crate::core::error::{PlacementError, Result};
use crate::core::types::EntityId;
use crate::entity::{Entity, EntityProperties};
use crate::geometry::GeometryKind;
use crate::regions::{RegionFeature, RegionGeometry, RegionProperties};
use geo_types::{Coord, LineString, Point, Polygon};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

type Position = Vec<f64>;

/// GeoJSON geometry object, restricted to the kinds the venue data uses
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum RawGeometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

impl RawGeometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            RawGeometry::Point { .. } => GeometryKind::Point,
            RawGeometry::LineString { .. } => GeometryKind::LineString,
            RawGeometry::Polygon { .. } => GeometryKind::Polygon,
            RawGeometry::MultiPolygon { .. } => GeometryKind::MultiPolygon,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFeature {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Option<RawGeometry>,
    #[serde(default)]
    pub properties: Value,
}

/// The three shapes a collaborator may send
#[derive(Debug, Clone)]
pub enum GeoJsonShape {
    Geometry(RawGeometry),
    Feature(RawFeature),
    FeatureCollection(Vec<RawFeature>),
}

#[derive(Deserialize)]
struct RawCollection {
    features: Vec<RawFeature>,
}

impl GeoJsonShape {
    pub fn from_value(value: Value) -> Result<Self> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| PlacementError::InvalidGeoJson("missing \"type\" member".into()))?;

        match kind {
            "FeatureCollection" => {
                let collection: RawCollection = serde_json::from_value(value)?;
                Ok(GeoJsonShape::FeatureCollection(collection.features))
            }
            "Feature" => Ok(GeoJsonShape::Feature(serde_json::from_value(value)?)),
            _ => Ok(GeoJsonShape::Geometry(serde_json::from_value(value)?)),
        }
    }

    pub fn parse(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Flatten into features; a bare geometry becomes an anonymous feature
    pub fn into_features(self) -> Vec<RawFeature> {
        match self {
            GeoJsonShape::Geometry(geometry) => vec![RawFeature {
                id: None,
                geometry: Some(geometry),
                properties: Value::Null,
            }],
            GeoJsonShape::Feature(feature) => vec![feature],
            GeoJsonShape::FeatureCollection(features) => features,
        }
    }
}

fn coord(position: &[f64]) -> Result<Coord<f64>> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(PlacementError::InvalidGeoJson(format!(
            "position needs two numbers, got {}",
            position.len()
        ))),
    }
}

fn line(positions: &[Position]) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|p| coord(p))
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn polygon(rings: &[Vec<Position>]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter();
    let exterior = match rings.next() {
        Some(ring) => line(ring)?,
        None => LineString::new(vec![]),
    };
    let interiors = rings.map(|r| line(r)).collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn feature_id(feature: &RawFeature) -> Option<EntityId> {
    let raw = feature
        .id
        .as_ref()
        .or_else(|| feature.properties.get("id"))?;
    match raw {
        Value::String(s) if !s.is_empty() => Some(EntityId::from_external(s)),
        Value::Number(n) => Some(EntityId::from_external(&n.to_string())),
        _ => None,
    }
}

/// Feature id as sent, for log lines
fn feature_label(feature: &RawFeature) -> String {
    match &feature.id {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "<anonymous>".to_string(),
    }
}

fn properties<T: Default + for<'de> Deserialize<'de>>(value: &Value) -> Result<T> {
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(T::deserialize(value)?)
}

/// Canonical entity polygon from a raw geometry
pub fn entity_polygon(geometry: &RawGeometry) -> Result<Polygon<f64>> {
    match geometry {
        RawGeometry::Polygon { coordinates } => polygon(coordinates),
        RawGeometry::MultiPolygon { coordinates } if coordinates.len() == 1 => {
            polygon(&coordinates[0])
        }
        other => Err(PlacementError::UnsupportedGeometryKind {
            expected: GeometryKind::Polygon,
            found: other.kind(),
        }),
    }
}

/// Convert one feature into an entity.
///
/// A feature without geometry becomes a degenerate entity; the rules treat
/// it as non-violating instead of rejecting the whole load.
pub fn entity_from_feature(feature: &RawFeature) -> Result<Entity> {
    let id = feature_id(feature).unwrap_or_default();
    let geometry = match &feature.geometry {
        Some(geometry) => entity_polygon(geometry)?,
        None => {
            tracing::debug!("Feature {} has no geometry", id);
            Polygon::new(LineString::new(vec![]), vec![])
        }
    };
    let props: EntityProperties = properties(&feature.properties)?;
    Ok(Entity::new(id, geometry, props))
}

/// Convert every usable feature; the rest are logged and skipped
pub fn entities_from_shape(shape: GeoJsonShape) -> Result<Vec<Entity>> {
    let features = shape.into_features();
    let mut entities = Vec::with_capacity(features.len());
    for feature in &features {
        match entity_from_feature(feature) {
            Ok(entity) => entities.push(entity),
            Err(e) => tracing::warn!("Skipping feature {}: {}", feature_label(feature), e),
        }
    }
    Ok(entities)
}

pub fn entities_from_geojson(json: &str) -> Result<Vec<Entity>> {
    entities_from_shape(GeoJsonShape::parse(json)?)
}

/// Region features for one GeoJSON feature. Multi-polygons are split into
/// one region per member.
pub fn regions_from_feature(feature: &RawFeature) -> Result<Vec<RegionFeature>> {
    let props: RegionProperties = properties(&feature.properties)?;
    let Some(geometry) = &feature.geometry else {
        tracing::warn!("Skipping region feature without geometry ({:?})", props.name);
        return Ok(Vec::new());
    };

    let regions = match geometry {
        RawGeometry::Point { coordinates } => vec![RegionFeature::new(
            RegionGeometry::Point(Point::from(coord(coordinates)?)),
            props,
        )],
        RawGeometry::LineString { coordinates } => vec![RegionFeature::new(
            RegionGeometry::LineString(line(coordinates)?),
            props,
        )],
        RawGeometry::Polygon { coordinates } => vec![RegionFeature::new(
            RegionGeometry::Polygon(polygon(coordinates)?),
            props,
        )],
        RawGeometry::MultiPolygon { coordinates } => coordinates
            .iter()
            .map(|member| {
                polygon(member)
                    .map(|p| RegionFeature::new(RegionGeometry::Polygon(p), props.clone()))
            })
            .collect::<Result<Vec<_>>>()?,
    };
    Ok(regions)
}

/// Convert features into reference regions, skipping unusable ones
pub fn regions_from_shape(shape: GeoJsonShape) -> Result<Vec<RegionFeature>> {
    let mut regions = Vec::new();
    for feature in &shape.into_features() {
        match regions_from_feature(feature) {
            Ok(found) => regions.extend(found),
            Err(e) => tracing::warn!("Skipping region feature {}: {}", feature_label(feature), e),
        }
    }
    Ok(regions)
}

pub fn regions_from_geojson(json: &str) -> Result<Vec<RegionFeature>> {
    regions_from_shape(GeoJsonShape::parse(json)?)
}

pub fn load_entities(path: &Path) -> Result<Vec<Entity>> {
    let content = std::fs::read_to_string(path)?;
    entities_from_geojson(&content)
}

pub fn load_regions(path: &Path) -> Result<Vec<RegionFeature>> {
    let content = std::fs::read_to_string(path)?;
    regions_from_geojson(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str =
        r#"{"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]]]}"#;

    #[test]
    fn test_bare_feature_and_collection_resolve_alike() {
        let feature = format!(
            r#"{{"type": "Feature", "id": "camp-1", "geometry": {}, "properties": {{"name": "A"}}}}"#,
            SQUARE
        );
        let collection = format!(r#"{{"type": "FeatureCollection", "features": [{}]}}"#, feature);

        let bare = entities_from_geojson(SQUARE).unwrap();
        let single = entities_from_geojson(&feature).unwrap();
        let many = entities_from_geojson(&collection).unwrap();

        assert_eq!(bare.len(), 1);
        assert_eq!(bare[0].geometry(), single[0].geometry());
        assert_eq!(single[0].geometry(), many[0].geometry());
        assert_eq!(single[0].id, many[0].id);
        assert_eq!(single[0].id, EntityId::from_external("camp-1"));
        assert_eq!(many[0].properties.name, "A");
    }

    #[test]
    fn test_point_entity_rejected() {
        let json =
            r#"{"type": "Feature", "geometry": {"type": "Point", "coordinates": [14.9, 57.6]}}"#;
        let GeoJsonShape::Feature(feature) = GeoJsonShape::parse(json).unwrap() else {
            panic!("expected a feature");
        };
        assert!(matches!(
            entity_from_feature(&feature),
            Err(PlacementError::UnsupportedGeometryKind {
                found: GeometryKind::Point,
                ..
            })
        ));
        assert!(entities_from_geojson(json).unwrap().is_empty());
    }

    #[test]
    fn test_bad_feature_skipped_rest_kept() {
        let json = format!(
            r#"{{
                "type": "FeatureCollection",
                "features": [
                    {{"type": "Feature", "id": "good", "geometry": {}, "properties": {{"name": "Good"}}}},
                    {{"type": "Feature", "id": "spot", "geometry": {{"type": "Point", "coordinates": [0, 0]}}}},
                    {{"type": "Feature", "id": "bad-props", "geometry": {}, "properties": {{"nrOfPeople": "many"}}}}
                ]
            }}"#,
            SQUARE, SQUARE
        );
        let entities = entities_from_geojson(&json).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id, EntityId::from_external("good"));
        assert_eq!(entities[0].properties.name, "Good");
    }

    #[test]
    fn test_lenient_property_values() {
        let json = format!(
            r#"{{
                "type": "Feature",
                "id": 7,
                "geometry": {},
                "properties": {{
                    "name": "Loose",
                    "description": null,
                    "contactInfo": null,
                    "nrOfPeople": 12.0,
                    "nrOfVehicles": 2.4,
                    "supressWarnings": null
                }}
            }}"#,
            SQUARE
        );
        let entities = entities_from_geojson(&json).unwrap();
        assert_eq!(entities.len(), 1);
        let props = &entities[0].properties;
        assert_eq!(props.name, "Loose");
        assert_eq!(props.description, "");
        assert_eq!(props.contact_info, "");
        assert_eq!(props.people, Some(12));
        assert_eq!(props.vehicles, Some(2));
        assert!(!props.suppress_warnings);
    }

    #[test]
    fn test_bad_region_feature_skipped() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1]}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]},
                 "properties": {"name": "Stage", "soundLimit": 100, "radius": 20}}
            ]
        }"#;
        let regions = regions_from_geojson(json).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].label(), "Stage");
    }

    #[test]
    fn test_single_member_multipolygon_unwrapped() {
        let json =
            r#"{"type": "MultiPolygon", "coordinates": [[[[0, 0], [1, 0], [1, 1], [0, 0]]]]}"#;
        let entities = entities_from_geojson(json).unwrap();
        assert_eq!(entities[0].vertex_count(), 3);
    }

    #[test]
    fn test_region_multipolygon_split() {
        let json = r#"{
            "type": "Feature",
            "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[0, 0], [1, 0], [1, 1], [0, 0]]],
                [[[5, 5], [6, 5], [6, 6], [5, 5]]]
            ]},
            "properties": {"name": "Quiet", "soundLimit": 100}
        }"#;
        let regions = regions_from_geojson(json).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].properties.sound_limit, Some(100.0));
        assert_eq!(regions[0].label(), "Quiet");
    }

    #[test]
    fn test_feature_without_geometry_is_degenerate() {
        let json = r#"{"type": "Feature", "geometry": null, "properties": null}"#;
        let entities = entities_from_geojson(json).unwrap();
        assert!(entities[0].is_degenerate());
    }

    #[test]
    fn test_missing_type_is_invalid() {
        assert!(matches!(
            GeoJsonShape::parse(r#"{"coordinates": []}"#),
            Err(PlacementError::InvalidGeoJson(_))
        ));
    }
}
