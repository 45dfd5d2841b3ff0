use thiserror::Error;

use crate::core::types::EntityId;
use crate::geometry::GeometryKind;
use crate::regions::Layer;

#[derive(Error, Debug)]
pub enum PlacementError {
    #[error("Unsupported geometry kind: expected {expected:?}, found {found:?}")]
    UnsupportedGeometryKind {
        expected: GeometryKind,
        found: GeometryKind,
    },

    #[error("Degenerate geometry for entity {0}")]
    DegenerateGeometry(EntityId),

    #[error("Reference layer not loaded: {0}")]
    MissingLayer(Layer),

    #[error("Entity not found: {0}")]
    UnknownEntity(EntityId),

    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PlacementError>;
