//! Named reference region collections (border, fire roads, sound zones...)

use crate::core::error::{PlacementError, Result};
use crate::geometry::GeometryKind;
use ahash::AHashMap;
use geo_types::{LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference collections the rules can be parameterized with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    PropertyBorder,
    Neighborhoods,
    FireRoads,
    ForbiddenZones,
    SoundZones,
    PublicPlease,
    MinorRoads,
}

impl Layer {
    pub const ALL: [Layer; 7] = [
        Layer::PropertyBorder,
        Layer::Neighborhoods,
        Layer::FireRoads,
        Layer::ForbiddenZones,
        Layer::SoundZones,
        Layer::PublicPlease,
        Layer::MinorRoads,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::PropertyBorder => "property-border",
            Layer::Neighborhoods => "neighborhoods",
            Layer::FireRoads => "fire-roads",
            Layer::ForbiddenZones => "forbidden-zones",
            Layer::SoundZones => "sound-zones",
            Layer::PublicPlease => "public-please",
            Layer::MinorRoads => "minor-roads",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layer {
    type Err = PlacementError;

    fn from_str(s: &str) -> Result<Self> {
        Layer::ALL
            .into_iter()
            .find(|layer| layer.as_str() == s)
            .ok_or_else(|| PlacementError::Config(format!("unknown layer '{}'", s)))
    }
}

/// Canonical geometry of a reference feature
#[derive(Debug, Clone, PartialEq)]
pub enum RegionGeometry {
    Point(Point<f64>),
    LineString(LineString<f64>),
    Polygon(Polygon<f64>),
}

impl RegionGeometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            RegionGeometry::Point(_) => GeometryKind::Point,
            RegionGeometry::LineString(_) => GeometryKind::LineString,
            RegionGeometry::Polygon(_) => GeometryKind::Polygon,
        }
    }

    pub fn as_polygon(&self) -> Result<&Polygon<f64>> {
        match self {
            RegionGeometry::Polygon(polygon) => Ok(polygon),
            other => Err(PlacementError::UnsupportedGeometryKind {
                expected: GeometryKind::Polygon,
                found: other.kind(),
            }),
        }
    }
}

/// Per-feature properties the rules read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegionProperties {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Amplified sound ceiling (W) inside this zone or around this spot
    pub sound_limit: Option<f64>,
    /// Reach (m) of a point feature
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionFeature {
    pub geometry: RegionGeometry,
    pub properties: RegionProperties,
}

impl RegionFeature {
    pub fn new(geometry: RegionGeometry, properties: RegionProperties) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    pub fn polygon(polygon: Polygon<f64>) -> Self {
        Self::new(RegionGeometry::Polygon(polygon), RegionProperties::default())
    }

    pub fn label(&self) -> &str {
        self.properties
            .name
            .as_deref()
            .or(self.properties.kind.as_deref())
            .unwrap_or("unnamed")
    }
}

/// All loaded reference collections, keyed by layer
#[derive(Debug, Clone, Default)]
pub struct ReferenceLayers {
    layers: AHashMap<Layer, Vec<RegionFeature>>,
}

impl ReferenceLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: Layer, features: Vec<RegionFeature>) -> Self {
        self.insert(layer, features);
        self
    }

    pub fn insert(&mut self, layer: Layer, features: Vec<RegionFeature>) {
        self.layers.insert(layer, features);
    }

    pub fn remove(&mut self, layer: Layer) -> Option<Vec<RegionFeature>> {
        self.layers.remove(&layer)
    }

    pub fn get(&self, layer: Layer) -> Option<&[RegionFeature]> {
        self.layers.get(&layer).map(|v| v.as_slice())
    }

    /// Like [`get`](Self::get), but a missing layer is an error
    pub fn require(&self, layer: Layer) -> Result<&[RegionFeature]> {
        self.get(layer).ok_or(PlacementError::MissingLayer(layer))
    }

    pub fn loaded(&self) -> impl Iterator<Item = Layer> + '_ {
        self.layers.keys().copied()
    }
}
