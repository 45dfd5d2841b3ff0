//! Placed entities and the placed-entity set

mod set;

pub use set::EntitySet;

use crate::core::types::EntityId;
use geo_types::{Coord, Polygon};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Explicit `null` reads as the field's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Head counts arrive as integers or floats; floats are rounded
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(n) if n.is_finite() && n >= 0.0 && n <= u32::MAX as f64 => Ok(Some(n.round() as u32)),
        Some(n) => Err(D::Error::custom(format!("invalid count {}", n))),
    }
}

/// Declared properties of a placed camp
///
/// Keys follow the camelCase names collaborators send in GeoJSON feature
/// properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntityProperties {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub contact_info: String,
    /// Declared power need (W)
    pub power_need: Option<f64>,
    /// Declared amplified sound (W)
    pub amplified_sound: Option<f64>,
    #[serde(alias = "nrOfPeople", deserialize_with = "lenient_count")]
    pub people: Option<u32>,
    #[serde(
        alias = "nrOfVehicles",
        alias = "nrOfVechiles",
        deserialize_with = "lenient_count"
    )]
    pub vehicles: Option<u32>,
    /// Extra area (m²) on top of what people and vehicles need
    #[serde(alias = "additionalSqm")]
    pub additional_area: Option<f64>,
    /// Hide every warning below High severity
    #[serde(alias = "supressWarnings", deserialize_with = "null_as_default")]
    pub suppress_warnings: bool,
    /// The area is expected to draw power
    #[serde(deserialize_with = "null_as_default")]
    pub needs_power: bool,
}

/// A placed polygon with identity and declared properties.
///
/// Area and buffered outline are always derived from `geometry` (see
/// [`crate::spatial::SpatialCache`]), never stored alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    geometry: Polygon<f64>,
    pub properties: EntityProperties,
}

impl Entity {
    pub fn new(id: EntityId, geometry: Polygon<f64>, properties: EntityProperties) -> Self {
        Self {
            id,
            geometry,
            properties,
        }
    }

    pub fn geometry(&self) -> &Polygon<f64> {
        &self.geometry
    }

    pub fn set_geometry(&mut self, geometry: Polygon<f64>) {
        self.geometry = geometry;
    }

    /// Fewer than three distinct vertices: no area, nothing to test
    pub fn is_degenerate(&self) -> bool {
        let ring = &self.geometry.exterior().0;
        let distinct = match (ring.first(), ring.last()) {
            (Some(first), Some(last)) if first == last => ring.len() - 1,
            _ => ring.len(),
        };
        distinct < 3
    }

    /// Vertex count of the outer ring, closing vertex excluded
    pub fn vertex_count(&self) -> usize {
        self.geometry.exterior().0.len().saturating_sub(1)
    }

    /// Rings in order (exterior first) used for change detection
    pub fn rings(&self) -> impl Iterator<Item = &[Coord<f64>]> {
        std::iter::once(self.geometry.exterior())
            .chain(self.geometry.interiors())
            .map(|ring| ring.0.as_slice())
    }

    pub fn display_name(&self) -> String {
        if self.properties.name.trim().is_empty() {
            self.id.to_string()
        } else {
            self.properties.name.clone()
        }
    }
}
