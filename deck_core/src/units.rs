//! # Unit Types
//!
//! Type-safe wrappers for the two length units the engine deals with.
//!
//! Deck dimensions (zone widths, thicknesses, segment lengths) are entered in
//! meters, reinforcement dimensions (cover, bar diameter, spacing, bend radius)
//! in millimeters. Input structs keep plain `f64` fields with a unit suffix for
//! clean JSON; these wrappers make the conversion at the boundary explicit.
//!
//! ## Example
//!
//! ```rust
//! use deck_core::units::{Meters, Millimeters};
//!
//! let cover = Millimeters(35.0);
//! let cover_m: Meters = cover.into();
//! assert!((cover_m.0 - 0.035).abs() < 1e-12);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Self {
        Meters(mm.0 / 1000.0)
    }
}

impl From<Meters> for Millimeters {
    fn from(m: Meters) -> Self {
        Millimeters(m.0 * 1000.0)
    }
}

impl fmt::Display for Meters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}m", self.0)
    }
}

impl fmt::Display for Millimeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}mm", self.0)
    }
}

/// Convert a millimeter value to meters.
pub fn mm_to_m(mm: f64) -> f64 {
    Meters::from(Millimeters(mm)).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_m() {
        let m: Meters = Millimeters(1250.0).into();
        assert!((m.0 - 1.25).abs() < 1e-12);
        assert!((mm_to_m(25.0) - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_m_to_mm() {
        let mm: Millimeters = Meters(0.4).into();
        assert!((mm.0 - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_display() {
        assert_eq!(Meters(2.5).to_string(), "2.50m");
        assert_eq!(Millimeters(12.0).to_string(), "12mm");
    }

    #[test]
    fn test_serialization() {
        let width = Meters(12.5);
        let json = serde_json::to_string(&width).unwrap();
        assert_eq!(json, "12.5");

        let roundtrip: Meters = serde_json::from_str(&json).unwrap();
        assert_eq!(width, roundtrip);
    }
}
