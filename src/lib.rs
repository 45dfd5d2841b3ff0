//! Camp Placement - Rule validation for camps placed on a venue map
//!
//! Placed camps are polygons with declared needs. Rules check them against
//! reference layers (property border, fire roads, sound zones, ...) and
//! against each other through fire-safety clusters.

pub mod core;
pub mod entity;
pub mod geometry;
pub mod regions;
pub mod rules;
pub mod session;
pub mod spatial;
pub mod validation;

pub use crate::core::{EntityId, PlacementConfig, PlacementError, Result, Severity};
pub use crate::session::PlacementSession;
