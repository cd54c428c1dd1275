//! # Load Zones
//!
//! Load zones are bands of a usage type (pedestrian, cyclist, vehicle, verge)
//! stacked transversely from the zone 1 edge of the deck toward the zone 3
//! edge. Each zone has a width per active cross-section. The last zone is
//! special: it always extends to the far structural edge, whatever width was
//! stored for it.
//!
//! Validation is advisory. Overflows are reported as flags and messages on
//! [`LoadZoneReport`]; only malformed input (negative or non-finite widths)
//! is an error.
//!
//! ## Example
//!
//! ```rust
//! use deck_core::cross_sections::CrossSectionIndex;
//! use deck_core::load_zones::{LoadZone, LoadZoneType, LoadZoneValidator};
//! use deck_core::segments::{BridgeSegment, SegmentTable};
//!
//! let table = SegmentTable::new(vec![
//!     BridgeSegment::first(5.0, 20.0, 5.0, 0.8, 1.0),
//!     BridgeSegment::next(5.0, 20.0, 5.0, 0.8, 1.0, 10.0),
//! ]);
//! let index = CrossSectionIndex::build(&table).unwrap();
//!
//! let zones = vec![
//!     LoadZone::uniform(LoadZoneType::Pedestrian, 1.5, 2),
//!     LoadZone::uniform(LoadZoneType::Cyclist, 3.0, 2),
//!     LoadZone::uniform(LoadZoneType::Verge, 0.5, 2),
//!     LoadZone::uniform(LoadZoneType::Vehicle, 10.5, 2),
//! ];
//!
//! let report = LoadZoneValidator::default().validate(&zones, &index).unwrap();
//! assert!(report.passes());
//! ```

use serde::{Deserialize, Serialize};

use crate::cross_sections::{CrossSectionIndex, MAX_CROSS_SECTIONS};
use crate::errors::{DeckError, DeckResult};

/// Default tolerance on width comparisons (m)
pub const DEFAULT_WIDTH_TOLERANCE: f64 = 1e-3;

/// Usage type of a load zone.
///
/// The Dutch names used by existing parameter files are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadZoneType {
    #[serde(alias = "Voetgangers")]
    Pedestrian,
    #[serde(alias = "Fietsers")]
    Cyclist,
    #[serde(alias = "Auto")]
    Vehicle,
    #[serde(alias = "Berm")]
    Verge,
}

impl LoadZoneType {
    /// All zone types
    pub const ALL: [LoadZoneType; 4] = [
        LoadZoneType::Pedestrian,
        LoadZoneType::Cyclist,
        LoadZoneType::Vehicle,
        LoadZoneType::Verge,
    ];

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            LoadZoneType::Pedestrian => "Pedestrians",
            LoadZoneType::Cyclist => "Cyclists",
            LoadZoneType::Vehicle => "Vehicles",
            LoadZoneType::Verge => "Verge",
        }
    }
}

/// One transversely stacked band with a width per cross-section.
///
/// ## JSON Example
///
/// ```json
/// { "zone_type": "pedestrian", "widths": [1.5, 1.5, null] }
/// ```
///
/// `widths[k]` belongs to cross-section `D(k+1)`. Missing or `null` entries
/// count as zero; entries beyond the active cross-sections are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadZone {
    /// Usage type
    pub zone_type: LoadZoneType,

    /// Width at each cross-section (m)
    #[serde(default)]
    pub widths: Vec<Option<f64>>,
}

impl LoadZone {
    /// Create a zone with explicit widths
    pub fn new(zone_type: LoadZoneType, widths: Vec<f64>) -> Self {
        LoadZone {
            zone_type,
            widths: widths.into_iter().map(Some).collect(),
        }
    }

    /// Create a zone with the same width at `count` cross-sections
    pub fn uniform(zone_type: LoadZoneType, width: f64, count: usize) -> Self {
        LoadZone::new(zone_type, vec![width; count])
    }

    /// Stored width at cross-section `index`, zero when absent
    pub fn width_at(&self, index: usize) -> f64 {
        self.widths.get(index).copied().flatten().unwrap_or(0.0)
    }

    /// Reject negative or non-finite widths.
    pub fn validate(&self, zone_index: usize) -> DeckResult<()> {
        if self.widths.len() > MAX_CROSS_SECTIONS {
            tracing::debug!(
                zone_index,
                entries = self.widths.len(),
                "Load zone has more width entries than supported cross-sections; extras ignored"
            );
        }
        for (k, width) in self.widths.iter().enumerate() {
            if let Some(w) = width {
                if !w.is_finite() || *w < 0.0 {
                    return Err(DeckError::invalid_input(
                        format!("load_zones[{}].widths[{}]", zone_index, k),
                        w.to_string(),
                        "Load zone width must not be negative",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Width budget at one cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionCheck {
    /// Cross-section name (e.g., "D1")
    pub name: String,

    /// 0-based cross-section index
    pub index: usize,

    /// Available deck width (m)
    pub deck_width: f64,

    /// Sum of explicit widths of all zones except the last (m)
    pub explicit_sum: f64,

    /// True when `explicit_sum` exceeds the deck width beyond tolerance
    pub overflow: bool,

    /// Amount by which the explicit sum exceeds the deck width (m, 0 if none)
    pub overrun: f64,
}

/// Stacked position of one zone at one cross-section, measured from the
/// zone 1 edge of the deck.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneBand {
    /// Offset of the band's near side (m)
    pub start: f64,

    /// Offset of the band's far side (m)
    pub end: f64,
}

impl ZoneBand {
    /// Band width (m)
    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Result for one load zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneCheck {
    /// 0-based zone index
    pub zone_index: usize,

    /// Usage type
    pub zone_type: LoadZoneType,

    /// True for the last zone, which extends to the far edge
    pub is_last_zone: bool,

    /// Stacked band per active cross-section
    pub bands: Vec<ZoneBand>,

    /// Cross-section indices where this zone lies beyond the deck edge
    pub offending_sections: Vec<usize>,
}

impl ZoneCheck {
    /// True when the zone exceeds the deck at any cross-section
    pub fn exceeds_limits(&self) -> bool {
        !self.offending_sections.is_empty()
    }
}

/// Advisory validation result for all load zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadZoneReport {
    /// One entry per active cross-section
    pub sections: Vec<CrossSectionCheck>,

    /// One entry per load zone, in input order
    pub zones: Vec<ZoneCheck>,

    /// Human-readable warning per flagged cross-section
    pub messages: Vec<String>,
}

impl LoadZoneReport {
    /// True when no cross-section and no zone is flagged
    pub fn passes(&self) -> bool {
        self.sections.iter().all(|s| !s.overflow) && self.zones.iter().all(|z| !z.exceeds_limits())
    }

    /// Names of flagged cross-sections
    pub fn flagged_sections(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|s| s.overflow)
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Indices of zones that exceed the deck somewhere
    pub fn offending_zones(&self) -> Vec<usize> {
        self.zones
            .iter()
            .filter(|z| z.exceeds_limits())
            .map(|z| z.zone_index)
            .collect()
    }
}

/// Checks load zones against the deck width at every active cross-section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadZoneValidator {
    /// Width tolerance (m)
    pub tolerance: f64,
}

impl Default for LoadZoneValidator {
    fn default() -> Self {
        LoadZoneValidator {
            tolerance: DEFAULT_WIDTH_TOLERANCE,
        }
    }
}

impl LoadZoneValidator {
    /// Create a validator with a custom tolerance
    pub fn new(tolerance: f64) -> Self {
        LoadZoneValidator { tolerance }
    }

    /// Validate `zones` against the widths in `index`.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::InvalidInput` for a negative or non-finite width.
    /// Overflows are never errors.
    pub fn validate(&self, zones: &[LoadZone], index: &CrossSectionIndex) -> DeckResult<LoadZoneReport> {
        for (zone_index, zone) in zones.iter().enumerate() {
            zone.validate(zone_index)?;
        }

        let zone_count = zones.len();
        let mut checks: Vec<ZoneCheck> = zones
            .iter()
            .enumerate()
            .map(|(zone_index, zone)| ZoneCheck {
                zone_index,
                zone_type: zone.zone_type,
                is_last_zone: zone_index + 1 == zone_count,
                bands: Vec::with_capacity(index.len()),
                offending_sections: Vec::new(),
            })
            .collect();

        let mut sections = Vec::with_capacity(index.len());
        let mut messages = Vec::new();

        for section in index.sections() {
            let deck_width = section.width;
            let mut cursor = 0.0;
            let mut explicit_sum = 0.0;

            for (zone, check) in zones.iter().zip(checks.iter_mut()) {
                let start = cursor;
                let end = if check.is_last_zone {
                    deck_width.max(start)
                } else {
                    let width = zone.width_at(section.index);
                    explicit_sum += width;
                    start + width
                };

                let beyond_edge = if check.is_last_zone {
                    start > deck_width + self.tolerance
                } else {
                    end > deck_width + self.tolerance
                };
                if beyond_edge {
                    check.offending_sections.push(section.index);
                }

                check.bands.push(ZoneBand { start, end });
                cursor = end;
            }

            let overflow = explicit_sum > deck_width + self.tolerance;
            let overrun = (explicit_sum - deck_width).max(0.0);
            if overflow {
                messages.push(format!(
                    "At {}: total zone width ({:.2}m) exceeds deck width ({:.2}m) by {:.2}m.",
                    section.name, explicit_sum, deck_width, overrun
                ));
            }

            sections.push(CrossSectionCheck {
                name: section.name.clone(),
                index: section.index,
                deck_width,
                explicit_sum,
                overflow,
                overrun: if overflow { overrun } else { 0.0 },
            });
        }

        for check in checks.iter().filter(|c| c.exceeds_limits()) {
            tracing::debug!(
                zone_index = check.zone_index,
                zone_type = check.zone_type.display_name(),
                sections = check.offending_sections.len(),
                "Load zone exceeds deck edge"
            );
        }

        let report = LoadZoneReport {
            sections,
            zones: checks,
            messages,
        };
        if !report.passes() {
            tracing::warn!(
                flagged_sections = report.flagged_sections().len(),
                offending_zones = report.offending_zones().len(),
                "Load zone widths exceed the deck"
            );
        }
        Ok(report)
    }
}
