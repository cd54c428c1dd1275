//! # Engine Configuration
//!
//! Tuning knobs of the engine, loaded from TOML. Every field has a default,
//! so an empty document is a valid configuration.
//!
//! ## Example
//!
//! ```rust
//! use deck_core::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     include_rebar_solids = true
//!
//!     [placement]
//!     x = 100.0
//! "#).unwrap();
//!
//! assert!(config.include_rebar_solids);
//! assert_eq!(config.placement.x, 100.0);
//! assert_eq!(config.rebar_sections, 16);
//! ```

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::errors::{DeckError, DeckResult};
use crate::load_zones::DEFAULT_WIDTH_TOLERANCE;
use crate::reinforcement::DEFAULT_CLEAR_SPACING_MM;

/// Final translation of the 3D assembly (m)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Placement {
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tolerance of the load-zone overflow check (m)
    pub width_tolerance_m: f64,

    /// Clear spacing between a primary bar layer and its secondary layer (mm)
    pub bar_clear_spacing_mm: f64,

    /// Facets of a generated bar cylinder
    pub rebar_sections: usize,

    /// Add bar cylinders to the 3D assembly
    pub include_rebar_solids: bool,

    pub placement: Placement,

    /// Distance of dimension labels from the outline they annotate (m)
    pub label_offset_m: f64,

    /// Load-zone widths below this get no label (m)
    pub min_label_width_m: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width_tolerance_m: DEFAULT_WIDTH_TOLERANCE,
            bar_clear_spacing_mm: DEFAULT_CLEAR_SPACING_MM,
            rebar_sections: 16,
            include_rebar_solids: false,
            placement: Placement::default(),
            label_offset_m: 0.5,
            min_label_width_m: 0.01,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> DeckResult<Self> {
        let config: EngineConfig =
            toml::from_str(text).map_err(|e| DeckError::config_error(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> DeckResult<()> {
        let non_negative = [
            ("width_tolerance_m", self.width_tolerance_m),
            ("bar_clear_spacing_mm", self.bar_clear_spacing_mm),
            ("label_offset_m", self.label_offset_m),
            ("min_label_width_m", self.min_label_width_m),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(DeckError::config_error(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.rebar_sections < 3 {
            return Err(DeckError::config_error(format!(
                "rebar_sections must be at least 3, got {}",
                self.rebar_sections
            )));
        }
        let p = self.placement;
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return Err(DeckError::config_error("placement must be finite"));
        }
        Ok(())
    }
}
