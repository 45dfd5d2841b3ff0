//! Placement configuration with documented constants
//!
//! All thresholds the rules and the cluster aggregator depend on are
//! collected here. Values can be overridden from a TOML file; any field
//! missing from the file keeps its default.

use crate::core::error::{PlacementError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for placement validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    // === FIRE SAFETY ===
    /// Largest total area (m²) a fire-buffer-connected cluster may cover
    pub max_cluster_area_sqm: f64,

    /// Clearance (meters) each camp's outline is expanded by before
    /// testing whether two camps belong to the same cluster
    pub fire_buffer_m: f64,

    /// Extra padding (meters) added to bounding boxes on top of the fire
    /// buffer.
    ///
    /// Boxes are padded using the planar projection rather than the exact
    /// buffer, so a small margin keeps the prefilter from rejecting pairs
    /// the exact test would accept.
    pub bbox_margin_m: f64,

    /// Number of segments per quarter circle when approximating buffer
    /// corners
    pub buffer_segments: usize,

    // === NUMERIC THRESHOLDS ===
    /// Declared power need (W) above which the camp is flagged for review
    pub max_power_watts: f64,

    /// Outline vertex count above which a shape is flagged as overly complex
    pub max_vertices: usize,

    // === AREA NEED ===
    /// Area (m²) each declared person needs
    pub area_per_person_sqm: f64,

    /// Area (m²) each declared vehicle needs
    pub area_per_vehicle_sqm: f64,

    /// Scale `a` of the slack curve `clamp(a * need^b, 0, a)`
    ///
    /// Also the largest slack any camp gets: at 1.0 a tiny camp may be up
    /// to twice its calculated need.
    pub margin_scale: f64,

    /// Exponent `b` of the slack curve. Negative, so larger camps get
    /// proportionally less slack.
    pub margin_exponent: f64,

    // === PROJECTION ===
    /// Latitude (degrees) of the venue, origin of the planar projection
    pub venue_latitude: f64,

    /// Longitude (degrees) of the venue, origin of the planar projection
    pub venue_longitude: f64,

    // === SCHEDULING ===
    /// Entities evaluated per scheduler tick before yielding
    pub chunk_size: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_cluster_area_sqm: 1250.0,
            fire_buffer_m: 5.0,
            bbox_margin_m: 1.0,
            buffer_segments: 8,

            max_power_watts: 8000.0,
            max_vertices: 20,

            area_per_person_sqm: 10.0,
            area_per_vehicle_sqm: 70.0,
            margin_scale: 1.0,
            margin_exponent: -0.3,

            venue_latitude: 57.62,
            venue_longitude: 14.92,

            chunk_size: 50,
        }
    }
}

impl PlacementConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML, falling back to defaults per field
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PlacementConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.max_cluster_area_sqm <= 0.0 {
            return Err(PlacementError::Config(format!(
                "max_cluster_area_sqm ({}) must be positive",
                self.max_cluster_area_sqm
            )));
        }

        if self.fire_buffer_m < 0.0 || self.bbox_margin_m < 0.0 {
            return Err(PlacementError::Config(
                "fire_buffer_m and bbox_margin_m must not be negative".into(),
            ));
        }

        if self.buffer_segments == 0 {
            return Err(PlacementError::Config(
                "buffer_segments must be at least 1".into(),
            ));
        }

        if self.margin_scale < 0.0 || self.margin_exponent > 0.0 {
            return Err(PlacementError::Config(format!(
                "slack curve needs margin_scale >= 0 and margin_exponent <= 0 (got {}, {})",
                self.margin_scale, self.margin_exponent
            )));
        }

        if !(-80.0..=80.0).contains(&self.venue_latitude) {
            return Err(PlacementError::Config(format!(
                "venue_latitude ({}) is outside the range the planar projection supports",
                self.venue_latitude
            )));
        }

        if self.chunk_size == 0 {
            return Err(PlacementError::Config("chunk_size must be at least 1".into()));
        }

        Ok(())
    }

    /// Area (m²) a camp needs for its declared people, vehicles and extras
    pub fn calculated_need(&self, people: u32, vehicles: u32, extra_sqm: f64) -> f64 {
        people as f64 * self.area_per_person_sqm
            + vehicles as f64 * self.area_per_vehicle_sqm
            + extra_sqm.max(0.0)
    }

    /// Largest area (m²) still considered reasonable for a calculated need
    pub fn max_reasonable_area(&self, need: f64) -> f64 {
        if need <= 0.0 {
            return 0.0;
        }
        let margin = (self.margin_scale * need.powf(self.margin_exponent))
            .clamp(0.0, self.margin_scale);
        (need * (1.0 + margin)).min(self.max_cluster_area_sqm)
    }
}
