//! # Reinforcement Zones
//!
//! Reinforcement is configured per zone, where a zone is one transverse
//! location (1, 2, 3) on one row of the segment table. Zones are keyed by the
//! identifier `"<location>-<segment>"`, e.g. `"2-3"` for the middle zone of
//! the third row, and the set is regenerated by key whenever the row count
//! changes (see [`reconcile`]).
//!
//! The [`ReinforcementZoneMapper`] turns zone attributes into bar layers:
//! vertical layer positions from cover and bar diameters, bar positions
//! distributed symmetrically over the available width, and bend-radius
//! compliance against a [`BendRadiusTable`].
//!
//! ## Layer stacking
//!
//! ```text
//! longitudinal outside           longitudinal inside
//!   top   : L  (cover + r)         top   : T  (cover + r)
//!           T                              L
//!   bottom: T                      bottom: L
//!           L  (cover + r)                 T  (cover + r)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use deck_core::reinforcement::{reconcile, ReinforcementZoneMapper, ZoneId};
//! use deck_core::segments::{BridgeSegment, SegmentTable};
//!
//! let table = SegmentTable::new(vec![
//!     BridgeSegment::first(2.0, 10.0, 2.0, 0.8, 1.0),
//!     BridgeSegment::next(2.0, 10.0, 2.0, 0.8, 1.0, 10.0),
//! ]);
//! let zones = reconcile(&[], table.len());
//! assert_eq!(zones.len(), 6);
//! assert_eq!(zones[4].zone_id, "2-2");
//!
//! let layout = ReinforcementZoneMapper::default().map(&zones, &table).unwrap();
//! assert!(layout.passes());
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{DeckError, DeckResult};
use crate::segments::{SegmentTable, ZoneLocation};
use crate::units::mm_to_m;

/// Default bar diameter for new zones (mm)
pub const DEFAULT_BAR_DIAMETER_MM: f64 = 12.0;

/// Default center-to-center spacing for new zones (mm)
pub const DEFAULT_BAR_SPACING_MM: f64 = 150.0;

/// Default clear spacing between a primary layer and its secondary layer (mm)
pub const DEFAULT_CLEAR_SPACING_MM: f64 = 25.0;

/// Default concrete cover (mm)
pub const DEFAULT_COVER_MM: f64 = 55.0;

/// Upper bound on the bars of one layer
pub const MAX_BARS_PER_LAYER: usize = 100_000;

// ============================================================================
// Zone identifiers
// ============================================================================

/// Composite key `location-segment` of a reinforcement zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ZoneId {
    /// Transverse location
    pub location: ZoneLocation,

    /// 1-based row index
    pub segment: usize,
}

impl ZoneId {
    /// Create an identifier
    pub fn new(location: ZoneLocation, segment: usize) -> Self {
        ZoneId { location, segment }
    }

    /// Identifier for a flat 0-based index: location cycles fastest.
    ///
    /// ```rust
    /// use deck_core::reinforcement::ZoneId;
    ///
    /// assert_eq!(ZoneId::from_flat_index(0).to_string(), "1-1");
    /// assert_eq!(ZoneId::from_flat_index(4).to_string(), "2-2");
    /// ```
    pub fn from_flat_index(index: usize) -> Self {
        let location = match index % 3 {
            0 => ZoneLocation::Zone1,
            1 => ZoneLocation::Zone2,
            _ => ZoneLocation::Zone3,
        };
        ZoneId {
            location,
            segment: index / 3 + 1,
        }
    }

    /// Flat 0-based index, inverse of [`ZoneId::from_flat_index`]
    pub fn flat_index(&self) -> usize {
        (self.segment - 1) * 3 + (self.location.number() as usize - 1)
    }

    /// Every identifier for a table with `row_count` rows, in flat order
    pub fn all_for(row_count: usize) -> Vec<ZoneId> {
        (0..row_count * 3).map(ZoneId::from_flat_index).collect()
    }

    /// Parse an identifier such as `"3-12"`.
    pub fn parse(text: &str) -> DeckResult<Self> {
        let trimmed = text.trim();
        let (location, segment) = trimmed
            .split_once('-')
            .ok_or_else(|| DeckError::invalid_zone_id(text, "Expected the form 'location-segment'"))?;

        let location: u8 = location
            .trim()
            .parse()
            .map_err(|_| DeckError::invalid_zone_id(text, "Location is not a number"))?;
        let location = ZoneLocation::from_number(location)
            .ok_or_else(|| DeckError::invalid_zone_id(text, "Location must be 1, 2 or 3"))?;

        let segment: usize = segment
            .trim()
            .parse()
            .map_err(|_| DeckError::invalid_zone_id(text, "Segment is not a positive integer"))?;
        if segment == 0 {
            return Err(DeckError::invalid_zone_id(text, "Segment numbering starts at 1"));
        }

        Ok(ZoneId { location, segment })
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.location.number(), self.segment)
    }
}

impl FromStr for ZoneId {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ZoneId::parse(s)
    }
}

impl From<ZoneId> for String {
    fn from(id: ZoneId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ZoneId {
    type Error = DeckError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ZoneId::parse(&value)
    }
}

// ============================================================================
// Zone attributes
// ============================================================================

/// Whether longitudinal bars sit outside or inside the transverse bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarPlacement {
    /// Longitudinal bars nearest the concrete faces
    #[default]
    LongitudinalOutside,
    /// Transverse bars nearest the concrete faces
    LongitudinalInside,
}

impl BarPlacement {
    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            BarPlacement::LongitudinalOutside => "Longitudinal outside",
            BarPlacement::LongitudinalInside => "Longitudinal inside",
        }
    }
}

/// Diameter and spacing of one set of bars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarSet {
    /// Nominal bar diameter (mm)
    pub diameter_mm: f64,

    /// Center-to-center spacing (mm)
    pub spacing_mm: f64,

    /// Bend radius used on site (mm). `None` means the table minimum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bend_radius_mm: Option<f64>,
}

impl Default for BarSet {
    fn default() -> Self {
        BarSet::new(DEFAULT_BAR_DIAMETER_MM, DEFAULT_BAR_SPACING_MM)
    }
}

impl BarSet {
    /// Create a bar set without an explicit bend radius
    pub fn new(diameter_mm: f64, spacing_mm: f64) -> Self {
        BarSet {
            diameter_mm,
            spacing_mm,
            bend_radius_mm: None,
        }
    }

    /// Set an explicit bend radius
    pub fn with_bend_radius(mut self, radius_mm: f64) -> Self {
        self.bend_radius_mm = Some(radius_mm);
        self
    }

    fn validate(&self, field: &str) -> DeckResult<()> {
        if !self.diameter_mm.is_finite() || self.diameter_mm <= 0.0 {
            return Err(DeckError::invalid_input(
                format!("{}.diameter_mm", field),
                self.diameter_mm.to_string(),
                "Bar diameter must be positive",
            ));
        }
        if !self.spacing_mm.is_finite() || self.spacing_mm <= 0.0 {
            return Err(DeckError::invalid_input(
                format!("{}.spacing_mm", field),
                self.spacing_mm.to_string(),
                "Bar spacing must be positive",
            ));
        }
        if self.spacing_mm < self.diameter_mm {
            return Err(DeckError::invalid_input(
                format!("{}.spacing_mm", field),
                self.spacing_mm.to_string(),
                format!("Bar spacing must not be less than the bar diameter ({}mm)", self.diameter_mm),
            ));
        }
        if let Some(radius) = self.bend_radius_mm {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(DeckError::invalid_input(
                    format!("{}.bend_radius_mm", field),
                    radius.to_string(),
                    "Bend radius must be positive",
                ));
            }
        }
        Ok(())
    }
}

/// Reinforcement configuration of one zone.
///
/// ## JSON Example
///
/// ```json
/// {
///   "zone_id": "2-1",
///   "longitudinal_top": { "diameter_mm": 16.0, "spacing_mm": 150.0 },
///   "longitudinal_bottom": { "diameter_mm": 25.0, "spacing_mm": 125.0 },
///   "transverse": { "diameter_mm": 12.0, "spacing_mm": 200.0 },
///   "secondary_longitudinal_bottom": { "diameter_mm": 20.0, "spacing_mm": 250.0 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReinforcementZone {
    /// Identifier `location-segment`, kept as entered so malformed values
    /// can be reported instead of failing deserialization
    pub zone_id: String,

    /// Main longitudinal bars at the top face
    #[serde(default)]
    pub longitudinal_top: BarSet,

    /// Main longitudinal bars at the bottom face
    #[serde(default)]
    pub longitudinal_bottom: BarSet,

    /// Main transverse bars, used at both faces
    #[serde(default)]
    pub transverse: BarSet,

    /// Secondary longitudinal bars at the top face
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_longitudinal_top: Option<BarSet>,

    /// Secondary longitudinal bars at the bottom face
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_longitudinal_bottom: Option<BarSet>,

    /// Secondary transverse bars, used at both faces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_transverse: Option<BarSet>,

    /// Per-zone override of the bridge-wide placement mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<BarPlacement>,
}

impl ReinforcementZone {
    /// Zone with default bars for the given identifier
    pub fn with_defaults(id: ZoneId) -> Self {
        ReinforcementZone {
            zone_id: id.to_string(),
            longitudinal_top: BarSet::default(),
            longitudinal_bottom: BarSet::default(),
            transverse: BarSet::default(),
            secondary_longitudinal_top: None,
            secondary_longitudinal_bottom: None,
            secondary_transverse: None,
            placement: None,
        }
    }

    /// Parse the zone identifier
    pub fn id(&self) -> DeckResult<ZoneId> {
        ZoneId::parse(&self.zone_id)
    }

    /// Validate bar dimensions; field names carry the zone identifier.
    pub fn validate(&self) -> DeckResult<()> {
        let prefix = format!("reinforcement_zones[{}]", self.zone_id);
        self.longitudinal_top.validate(&format!("{}.longitudinal_top", prefix))?;
        self.longitudinal_bottom.validate(&format!("{}.longitudinal_bottom", prefix))?;
        self.transverse.validate(&format!("{}.transverse", prefix))?;
        if let Some(bars) = &self.secondary_longitudinal_top {
            bars.validate(&format!("{}.secondary_longitudinal_top", prefix))?;
        }
        if let Some(bars) = &self.secondary_longitudinal_bottom {
            bars.validate(&format!("{}.secondary_longitudinal_bottom", prefix))?;
        }
        if let Some(bars) = &self.secondary_transverse {
            bars.validate(&format!("{}.secondary_transverse", prefix))?;
        }
        Ok(())
    }
}

/// Regenerate the zone set for `row_count` rows.
///
/// Zones whose identifier survives keep their attributes; the rest are
/// default-initialized. Matching is by key, never by position, so inserting
/// or removing a row in the middle keeps the data of unaffected zones.
/// Entries with malformed or duplicate identifiers are dropped.
pub fn reconcile(existing: &[ReinforcementZone], row_count: usize) -> Vec<ReinforcementZone> {
    let mut by_id: HashMap<ZoneId, &ReinforcementZone> = HashMap::new();
    for zone in existing {
        match zone.id() {
            Ok(id) => {
                by_id.entry(id).or_insert(zone);
            }
            Err(e) => tracing::warn!(zone_id = %zone.zone_id, error = %e, "Dropping reinforcement zone"),
        }
    }

    let zones: Vec<ReinforcementZone> = ZoneId::all_for(row_count)
        .into_iter()
        .map(|id| match by_id.get(&id) {
            Some(zone) => ReinforcementZone {
                zone_id: id.to_string(),
                ..(*zone).clone()
            },
            None => ReinforcementZone::with_defaults(id),
        })
        .collect();

    tracing::debug!(
        previous = existing.len(),
        current = zones.len(),
        "Reconciled reinforcement zones"
    );
    zones
}

// ============================================================================
// Bend radius table
// ============================================================================

/// Minimum bending radius per nominal bar diameter (both in mm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BendRadiusTable {
    entries: BTreeMap<u32, f64>,
}

/// Built-in table: mandrel diameter 4φ for φ ≤ 16 mm and 7φ above.
static DEFAULT_BEND_TABLE: Lazy<BendRadiusTable> = Lazy::new(|| {
    let entries = [6u32, 8, 10, 12, 14, 16, 20, 25, 28, 32, 40]
        .into_iter()
        .map(|d| {
            let factor = if d <= 16 { 2.0 } else { 3.5 };
            (d, factor * d as f64)
        })
        .collect();
    BendRadiusTable { entries }
});

impl Default for BendRadiusTable {
    fn default() -> Self {
        BendRadiusTable::builtin().clone()
    }
}

impl BendRadiusTable {
    /// The built-in table for 6 to 40 mm bars
    pub fn builtin() -> &'static BendRadiusTable {
        &DEFAULT_BEND_TABLE
    }

    /// Build a table from `(diameter_mm, min_radius_mm)` pairs
    pub fn from_entries(entries: impl IntoIterator<Item = (u32, f64)>) -> Self {
        BendRadiusTable {
            entries: entries.into_iter().collect(),
        }
    }

    /// Parse a table from CSV text.
    ///
    /// Each line holds `diameter;min_radius` (a comma also works as
    /// separator). Blank lines, `#` comments and a non-numeric header line
    /// are skipped.
    pub fn from_csv_str(text: &str) -> DeckResult<Self> {
        let mut entries = BTreeMap::new();
        for (line_num, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split([';', ',']).map(str::trim).collect();
            if fields.len() < 2 {
                return Err(DeckError::invalid_input(
                    format!("bend_radius_table line {}", line_num + 1),
                    line,
                    "Expected 'diameter;min_radius'",
                ));
            }
            let diameter = fields[0].parse::<f64>();
            let radius = fields[1].parse::<f64>();
            match (diameter, radius) {
                (Ok(d), Ok(r)) if d > 0.0 && r > 0.0 => {
                    entries.insert(d.round() as u32, r);
                }
                (Err(_), _) if entries.is_empty() && line_num == 0 => continue,
                _ => {
                    return Err(DeckError::invalid_input(
                        format!("bend_radius_table line {}", line_num + 1),
                        line,
                        "Diameter and radius must be positive numbers",
                    ))
                }
            }
        }
        if entries.is_empty() {
            return Err(DeckError::invalid_input("bend_radius_table", "", "Table has no entries"));
        }
        Ok(BendRadiusTable { entries })
    }

    /// Minimum radius for a nominal diameter, `None` if not tabulated
    pub fn min_radius_mm(&self, diameter_mm: f64) -> Option<f64> {
        if !diameter_mm.is_finite() || diameter_mm <= 0.0 {
            return None;
        }
        let nominal = diameter_mm.round();
        if (diameter_mm - nominal).abs() > 1e-6 {
            return None;
        }
        self.entries.get(&(nominal as u32)).copied()
    }

    /// Tabulated diameters in ascending order
    pub fn diameters(&self) -> Vec<u32> {
        self.entries.keys().copied().collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check one bar set against the table
    pub fn check(&self, role: BarRole, bars: &BarSet) -> BendCheck {
        let min_radius_mm = self.min_radius_mm(bars.diameter_mm);
        let status = match (min_radius_mm, bars.bend_radius_mm) {
            (None, _) => BendStatus::UnknownDiameter,
            (Some(min), Some(actual)) if actual + 1e-9 < min => BendStatus::BelowMinimum,
            (Some(_), _) => BendStatus::Compliant,
        };
        BendCheck {
            role,
            diameter_mm: bars.diameter_mm,
            bend_radius_mm: bars.bend_radius_mm.or(min_radius_mm),
            min_radius_mm,
            status,
        }
    }
}

/// Outcome of a bend-radius check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BendStatus {
    Compliant,
    /// Bent tighter than the table allows
    BelowMinimum,
    /// Diameter not in the table
    UnknownDiameter,
}

/// Bend-radius check for one bar set of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BendCheck {
    pub role: BarRole,
    pub diameter_mm: f64,
    /// Radius used: explicit value or the table minimum
    pub bend_radius_mm: Option<f64>,
    pub min_radius_mm: Option<f64>,
    pub status: BendStatus,
}

impl BendCheck {
    /// True unless the check failed or the diameter is unknown
    pub fn is_compliant(&self) -> bool {
        self.status == BendStatus::Compliant
    }
}

// ============================================================================
// Mapper output
// ============================================================================

/// Function of a bar layer within a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarRole {
    LongitudinalBottom,
    LongitudinalTop,
    TransverseBottom,
    TransverseTop,
    SecondaryLongitudinalBottom,
    SecondaryLongitudinalTop,
    SecondaryTransverseBottom,
    SecondaryTransverseTop,
}

impl BarRole {
    /// True for bars running along the bridge axis
    pub fn is_longitudinal(&self) -> bool {
        matches!(
            self,
            BarRole::LongitudinalBottom
                | BarRole::LongitudinalTop
                | BarRole::SecondaryLongitudinalBottom
                | BarRole::SecondaryLongitudinalTop
        )
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            BarRole::LongitudinalBottom => "Longitudinal bottom",
            BarRole::LongitudinalTop => "Longitudinal top",
            BarRole::TransverseBottom => "Transverse bottom",
            BarRole::TransverseTop => "Transverse top",
            BarRole::SecondaryLongitudinalBottom => "Secondary longitudinal bottom",
            BarRole::SecondaryLongitudinalTop => "Secondary longitudinal top",
            BarRole::SecondaryTransverseBottom => "Secondary transverse bottom",
            BarRole::SecondaryTransverseTop => "Secondary transverse top",
        }
    }

    /// Field of [`ReinforcementZone`] the layer's bars come from
    pub fn field_name(&self) -> &'static str {
        match self {
            BarRole::LongitudinalBottom => "longitudinal_bottom",
            BarRole::LongitudinalTop => "longitudinal_top",
            BarRole::TransverseBottom | BarRole::TransverseTop => "transverse",
            BarRole::SecondaryLongitudinalBottom => "secondary_longitudinal_bottom",
            BarRole::SecondaryLongitudinalTop => "secondary_longitudinal_top",
            BarRole::SecondaryTransverseBottom | BarRole::SecondaryTransverseTop => "secondary_transverse",
        }
    }
}

/// One layer of parallel bars.
///
/// Longitudinal bars run along x; `positions` are their y coordinates.
/// Transverse bars run along y; `positions` are their x coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarLayer {
    pub role: BarRole,

    /// Height of the bar axes (m)
    pub z: f64,

    pub diameter_mm: f64,

    /// Requested center-to-center spacing (mm)
    pub spacing_mm: f64,

    /// Spacing after distributing bars evenly over the width (mm)
    pub actual_spacing_mm: f64,

    /// Bar axis coordinates (m), ascending
    pub positions: Vec<f64>,

    /// Start and end of every bar along its own axis (m)
    pub run: (f64, f64),
}

impl BarLayer {
    /// Number of bars
    pub fn count(&self) -> usize {
        self.positions.len()
    }
}

/// Computed reinforcement of one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedZone {
    pub id: ZoneId,

    /// 1-based span the zone covers; `None` for zones of the last row
    pub span: Option<usize>,

    /// Longitudinal start and end of the span (m)
    pub x_range: (f64, f64),

    /// Transverse extent of the zone at its row (m)
    pub y_range: (f64, f64),

    /// Bottom and top faces of the zone (m)
    pub z_range: (f64, f64),

    pub placement: BarPlacement,

    /// Center-to-center distance between the top and bottom transverse layers (m)
    pub transverse_height: f64,

    pub layers: Vec<BarLayer>,

    pub bend_checks: Vec<BendCheck>,
}

impl MappedZone {
    /// Layer by role
    pub fn layer(&self, role: BarRole) -> Option<&BarLayer> {
        self.layers.iter().find(|layer| layer.role == role)
    }

    /// True when every bend check passes
    pub fn bends_compliant(&self) -> bool {
        self.bend_checks.iter().all(BendCheck::is_compliant)
    }
}

/// Result of mapping all zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReinforcementLayout {
    pub zones: Vec<MappedZone>,

    /// Advisory findings (bend radius, layers that do not fit)
    pub warnings: Vec<String>,
}

impl ReinforcementLayout {
    /// Zone by identifier
    pub fn zone(&self, id: &ZoneId) -> Option<&MappedZone> {
        self.zones.iter().find(|zone| &zone.id == id)
    }

    /// All failing bend checks with their zone
    pub fn non_compliant(&self) -> Vec<(ZoneId, &BendCheck)> {
        self.zones
            .iter()
            .flat_map(|zone| {
                zone.bend_checks
                    .iter()
                    .filter(|check| !check.is_compliant())
                    .map(move |check| (zone.id, check))
            })
            .collect()
    }

    /// True when there are no advisory findings
    pub fn passes(&self) -> bool {
        self.warnings.is_empty()
    }
}

// ============================================================================
// Mapper
// ============================================================================

/// Distribute bars symmetrically about 0 over `width` at roughly `spacing`.
///
/// The count is rounded down so the requested spacing is never undercut;
/// the actual spacing is `width / count`. Returns the offsets and the actual
/// spacing, or no bars when `width < spacing`. `None` when the layer would
/// need more than [`MAX_BARS_PER_LAYER`] bars.
pub fn symmetric_positions(width: f64, spacing: f64) -> Option<(Vec<f64>, f64)> {
    if width <= 0.0 || spacing <= 0.0 {
        return Some((Vec::new(), 0.0));
    }
    let ratio = width / spacing + 1e-9;
    if !ratio.is_finite() || ratio >= (MAX_BARS_PER_LAYER + 1) as f64 {
        return None;
    }
    let count = ratio.floor() as usize;
    if count == 0 {
        return Some((Vec::new(), 0.0));
    }
    let actual = width / count as f64;
    let mut offsets = Vec::with_capacity(count);
    if count % 2 == 0 {
        for i in 0..count / 2 {
            let offset = (i as f64 + 0.5) * actual;
            offsets.push(-offset);
            offsets.push(offset);
        }
    } else {
        offsets.push(0.0);
        for i in 1..=count / 2 {
            let offset = i as f64 * actual;
            offsets.push(-offset);
            offsets.push(offset);
        }
    }
    offsets.sort_by(f64::total_cmp);
    Some((offsets, actual))
}

/// Computes bar layers and bend compliance for reinforcement zones.
#[derive(Debug, Clone)]
pub struct ReinforcementZoneMapper<'a> {
    /// Cover to the top face (mm)
    pub cover_top_mm: f64,

    /// Cover to the bottom face (mm)
    pub cover_bottom_mm: f64,

    /// Placement used by zones without an override
    pub placement: BarPlacement,

    /// Clear spacing between a primary and its secondary layer (mm)
    pub clear_spacing_mm: f64,

    table: &'a BendRadiusTable,
}

impl Default for ReinforcementZoneMapper<'static> {
    fn default() -> Self {
        ReinforcementZoneMapper::new(DEFAULT_COVER_MM, DEFAULT_COVER_MM, BarPlacement::default())
    }
}

impl ReinforcementZoneMapper<'static> {
    /// Mapper using the built-in bend radius table
    pub fn new(cover_top_mm: f64, cover_bottom_mm: f64, placement: BarPlacement) -> Self {
        ReinforcementZoneMapper {
            cover_top_mm,
            cover_bottom_mm,
            placement,
            clear_spacing_mm: DEFAULT_CLEAR_SPACING_MM,
            table: BendRadiusTable::builtin(),
        }
    }
}

impl<'a> ReinforcementZoneMapper<'a> {
    /// Use a different bend radius table
    pub fn with_table<'b>(self, table: &'b BendRadiusTable) -> ReinforcementZoneMapper<'b> {
        ReinforcementZoneMapper {
            cover_top_mm: self.cover_top_mm,
            cover_bottom_mm: self.cover_bottom_mm,
            placement: self.placement,
            clear_spacing_mm: self.clear_spacing_mm,
            table,
        }
    }

    /// Set the primary/secondary clear spacing
    pub fn with_clear_spacing(mut self, clear_spacing_mm: f64) -> Self {
        self.clear_spacing_mm = clear_spacing_mm;
        self
    }

    fn validate(&self) -> DeckResult<()> {
        for (field, value) in [
            ("cover_top_mm", self.cover_top_mm),
            ("cover_bottom_mm", self.cover_bottom_mm),
            ("clear_spacing_mm", self.clear_spacing_mm),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DeckError::invalid_input(field, value.to_string(), "Must not be negative"));
            }
        }
        Ok(())
    }

    /// Map every zone onto the segment table.
    ///
    /// # Errors
    ///
    /// * `DeckError::InvalidZoneId` - malformed, duplicate, or pointing past the last row
    /// * `DeckError::InvalidInput` - non-positive bar dimensions or negative cover
    pub fn map(&self, zones: &[ReinforcementZone], table: &SegmentTable) -> DeckResult<ReinforcementLayout> {
        self.validate()?;
        table.validate()?;

        let positions = table.positions();
        let mut seen = HashSet::new();
        let mut mapped = Vec::with_capacity(zones.len());
        let mut warnings = Vec::new();

        for zone in zones {
            let id = zone.id()?;
            if id.segment > table.len() {
                return Err(DeckError::invalid_zone_id(
                    &zone.zone_id,
                    format!("Segment {} does not exist (table has {} rows)", id.segment, table.len()),
                ));
            }
            if !seen.insert(id) {
                return Err(DeckError::invalid_zone_id(&zone.zone_id, "Duplicate zone identifier"));
            }
            zone.validate()?;

            let result = self.map_zone(id, zone, table, &positions)?;
            for check in result.bend_checks.iter().filter(|c| !c.is_compliant()) {
                let message = match check.status {
                    BendStatus::BelowMinimum => format!(
                        "Zone {}: {} bars ø{} bent at r = {:.0}mm, minimum is {:.0}mm.",
                        id,
                        check.role.display_name().to_lowercase(),
                        check.diameter_mm,
                        check.bend_radius_mm.unwrap_or_default(),
                        check.min_radius_mm.unwrap_or_default()
                    ),
                    _ => format!(
                        "Zone {}: no minimum bend radius known for ø{} ({}).",
                        id,
                        check.diameter_mm,
                        check.role.display_name().to_lowercase()
                    ),
                };
                tracing::warn!("{}", message);
                warnings.push(message);
            }
            if result.transverse_height <= 0.0 {
                let message = format!("Zone {}: bar layers do not fit within the slab thickness.", id);
                tracing::warn!("{}", message);
                warnings.push(message);
            }
            mapped.push(result);
        }

        tracing::debug!(zones = mapped.len(), warnings = warnings.len(), "Mapped reinforcement zones");
        Ok(ReinforcementLayout {
            zones: mapped,
            warnings,
        })
    }

    fn map_zone(
        &self,
        id: ZoneId,
        zone: &ReinforcementZone,
        table: &SegmentTable,
        positions: &[f64],
    ) -> DeckResult<MappedZone> {
        let row_index = id.segment - 1;
        let row = &table.rows()[row_index];
        let location = id.location;
        let placement = zone.placement.unwrap_or(self.placement);

        let has_span = row_index + 1 < table.len();
        let x_start = positions[row_index];
        let x_end = if has_span { positions[row_index + 1] } else { x_start };
        let (y_min, y_max) = row.zone_y_range(location);
        let (z_bottom, z_top) = row.zone_z_range(location);
        let zone_width = y_max - y_min;
        let y_center = (y_min + y_max) / 2.0;
        let span_length = x_end - x_start;
        let x_center = (x_start + x_end) / 2.0;

        let cover_top = mm_to_m(self.cover_top_mm);
        let cover_bottom = mm_to_m(self.cover_bottom_mm);
        let clear = mm_to_m(self.clear_spacing_mm);
        let d_long_top = mm_to_m(zone.longitudinal_top.diameter_mm);
        let d_long_bottom = mm_to_m(zone.longitudinal_bottom.diameter_mm);
        let d_trans = mm_to_m(zone.transverse.diameter_mm);

        let (z_long_bottom, z_trans_bottom, z_long_top, z_trans_top) = match placement {
            BarPlacement::LongitudinalOutside => {
                let long_bottom = z_bottom + cover_bottom + d_long_bottom / 2.0;
                let long_top = z_top - cover_top - d_long_top / 2.0;
                (
                    long_bottom,
                    long_bottom + (d_long_bottom + d_trans) / 2.0,
                    long_top,
                    long_top - (d_long_top + d_trans) / 2.0,
                )
            }
            BarPlacement::LongitudinalInside => {
                let trans_bottom = z_bottom + cover_bottom + d_trans / 2.0;
                let trans_top = z_top - cover_top - d_trans / 2.0;
                (
                    trans_bottom + (d_trans + d_long_bottom) / 2.0,
                    trans_bottom,
                    trans_top - (d_trans + d_long_top) / 2.0,
                    trans_top,
                )
            }
        };

        let too_many_bars = |role: BarRole, bars: &BarSet| {
            DeckError::invalid_input(
                format!("reinforcement_zones[{}].{}.spacing_mm", id, role.field_name()),
                bars.spacing_mm.to_string(),
                format!("Layer would need more than {} bars", MAX_BARS_PER_LAYER),
            )
        };
        let longitudinal = |role: BarRole, bars: &BarSet, z: f64, cover: f64| -> DeckResult<BarLayer> {
            let d = mm_to_m(bars.diameter_mm);
            let (offsets, actual) = symmetric_positions(zone_width - 2.0 * cover - d, mm_to_m(bars.spacing_mm))
                .ok_or_else(|| too_many_bars(role, bars))?;
            Ok(BarLayer {
                role,
                z,
                diameter_mm: bars.diameter_mm,
                spacing_mm: bars.spacing_mm,
                actual_spacing_mm: actual * 1000.0,
                positions: offsets.into_iter().map(|o| y_center + o).collect(),
                run: (x_start, x_end),
            })
        };
        let transverse = |role: BarRole, bars: &BarSet, z: f64, cover: f64| -> DeckResult<BarLayer> {
            let d = mm_to_m(bars.diameter_mm);
            let (offsets, actual) = if has_span {
                symmetric_positions(span_length - 2.0 * cover - d, mm_to_m(bars.spacing_mm))
                    .ok_or_else(|| too_many_bars(role, bars))?
            } else {
                (Vec::new(), 0.0)
            };
            Ok(BarLayer {
                role,
                z,
                diameter_mm: bars.diameter_mm,
                spacing_mm: bars.spacing_mm,
                actual_spacing_mm: actual * 1000.0,
                positions: offsets.into_iter().map(|o| x_center + o).collect(),
                run: (y_min, y_max),
            })
        };

        let mut layers = vec![
            longitudinal(BarRole::LongitudinalBottom, &zone.longitudinal_bottom, z_long_bottom, cover_bottom)?,
            longitudinal(BarRole::LongitudinalTop, &zone.longitudinal_top, z_long_top, cover_top)?,
            transverse(BarRole::TransverseBottom, &zone.transverse, z_trans_bottom, cover_bottom)?,
            transverse(BarRole::TransverseTop, &zone.transverse, z_trans_top, cover_top)?,
        ];

        // Secondary layers sit one primary diameter plus the clear spacing further inward.
        if let Some(bars) = &zone.secondary_longitudinal_bottom {
            let z = z_long_bottom + d_long_bottom + clear;
            layers.push(longitudinal(BarRole::SecondaryLongitudinalBottom, bars, z, cover_bottom)?);
        }
        if let Some(bars) = &zone.secondary_longitudinal_top {
            let z = z_long_top - d_long_top - clear;
            layers.push(longitudinal(BarRole::SecondaryLongitudinalTop, bars, z, cover_top)?);
        }
        if let Some(bars) = &zone.secondary_transverse {
            layers.push(transverse(
                BarRole::SecondaryTransverseBottom,
                bars,
                z_trans_bottom + d_trans + clear,
                cover_bottom,
            )?);
            layers.push(transverse(
                BarRole::SecondaryTransverseTop,
                bars,
                z_trans_top - d_trans - clear,
                cover_top,
            )?);
        }

        let mut bend_checks = vec![
            self.table.check(BarRole::LongitudinalBottom, &zone.longitudinal_bottom),
            self.table.check(BarRole::LongitudinalTop, &zone.longitudinal_top),
            self.table.check(BarRole::TransverseBottom, &zone.transverse),
        ];
        if let Some(bars) = &zone.secondary_longitudinal_bottom {
            bend_checks.push(self.table.check(BarRole::SecondaryLongitudinalBottom, bars));
        }
        if let Some(bars) = &zone.secondary_longitudinal_top {
            bend_checks.push(self.table.check(BarRole::SecondaryLongitudinalTop, bars));
        }
        if let Some(bars) = &zone.secondary_transverse {
            bend_checks.push(self.table.check(BarRole::SecondaryTransverseBottom, bars));
        }

        Ok(MappedZone {
            id,
            span: has_span.then_some(id.segment),
            x_range: (x_start, x_end),
            y_range: (y_min, y_max),
            z_range: (z_bottom, z_top),
            placement,
            transverse_height: z_trans_top - z_trans_bottom,
            layers,
            bend_checks,
        })
    }
}
