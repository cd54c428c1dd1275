//! # Segment Table
//!
//! The ordered list of bridge rows. Each row describes the deck at one
//! cross-section: three transverse zone widths, the zone 1/3 thickness `dz`,
//! the zone 2 thickness `dz_2` and the distance `l` to the previous row.
//! A span is the slab between two consecutive rows, so N spans need N+1 rows.
//!
//! ## Transverse layout
//!
//! ```text
//!            y
//!            ^   zone 1   bz2/2 .. bz2/2 + bz1      top  z = 0
//!            |   zone 2   -bz2/2 .. bz2/2           top  z = dz_2 - dz
//!            |   zone 3   -bz2/2 - bz3 .. -bz2/2    top  z = 0
//!            +----> x (longitudinal)
//! ```
//!
//! All zones share the bottom face `z = -dz`; zone 2 rises above the
//! others when `dz_2 > dz`.
//!
//! ## Example
//!
//! ```rust
//! use deck_core::segments::{BridgeSegment, SegmentTable};
//!
//! let table = SegmentTable::new(vec![
//!     BridgeSegment::first(2.0, 10.0, 2.0, 0.8, 1.0),
//!     BridgeSegment::next(2.0, 10.0, 2.0, 0.8, 1.0, 10.0),
//! ]);
//!
//! table.validate().unwrap();
//! assert_eq!(table.span_count(), 1);
//! assert_eq!(table.positions(), vec![0.0, 10.0]);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{DeckError, DeckResult};

/// One of the three fixed transverse divisions of the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ZoneLocation {
    /// Edge zone on the +y side
    Zone1,
    /// Middle zone, centred on the reference axis
    Zone2,
    /// Edge zone on the -y side
    Zone3,
}

impl ZoneLocation {
    /// All locations in transverse order
    pub const ALL: [ZoneLocation; 3] = [ZoneLocation::Zone1, ZoneLocation::Zone2, ZoneLocation::Zone3];

    /// 1-based location number used in zone identifiers
    pub fn number(&self) -> u8 {
        match self {
            ZoneLocation::Zone1 => 1,
            ZoneLocation::Zone2 => 2,
            ZoneLocation::Zone3 => 3,
        }
    }

    /// Parse a 1-based location number
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(ZoneLocation::Zone1),
            2 => Some(ZoneLocation::Zone2),
            3 => Some(ZoneLocation::Zone3),
            _ => None,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ZoneLocation::Zone1 => "Zone 1",
            ZoneLocation::Zone2 => "Zone 2",
            ZoneLocation::Zone3 => "Zone 3",
        }
    }

    /// True for the middle zone, which uses `dz_2`
    pub fn is_middle(&self) -> bool {
        matches!(self, ZoneLocation::Zone2)
    }
}

/// One row of the segment table.
///
/// ## JSON Example
///
/// ```json
/// { "bz1": 2.0, "bz2": 10.0, "bz3": 2.0, "dz": 0.8, "dz_2": 1.0, "l": 10.0, "is_first_segment": false }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeSegment {
    /// Width of zone 1 (m)
    pub bz1: f64,

    /// Width of zone 2 (m)
    pub bz2: f64,

    /// Width of zone 3 (m)
    pub bz3: f64,

    /// Thickness of zones 1 and 3 (m)
    pub dz: f64,

    /// Thickness of zone 2 (m)
    pub dz_2: f64,

    /// Distance to the previous row (m), ignored for the first row
    #[serde(default)]
    pub l: f64,

    /// Marks the first row of the table
    #[serde(default)]
    pub is_first_segment: bool,
}

impl BridgeSegment {
    /// Create the first row of a table (`l` is zero).
    pub fn first(bz1: f64, bz2: f64, bz3: f64, dz: f64, dz_2: f64) -> Self {
        BridgeSegment {
            bz1,
            bz2,
            bz3,
            dz,
            dz_2,
            l: 0.0,
            is_first_segment: true,
        }
    }

    /// Create a follow-up row at distance `l` from the previous one.
    pub fn next(bz1: f64, bz2: f64, bz3: f64, dz: f64, dz_2: f64, l: f64) -> Self {
        BridgeSegment {
            bz1,
            bz2,
            bz3,
            dz,
            dz_2,
            l,
            is_first_segment: false,
        }
    }

    /// Total deck width `bz1 + bz2 + bz3` (m)
    pub fn total_width(&self) -> f64 {
        self.bz1 + self.bz2 + self.bz3
    }

    /// Width of a transverse zone (m)
    pub fn zone_width(&self, location: ZoneLocation) -> f64 {
        match location {
            ZoneLocation::Zone1 => self.bz1,
            ZoneLocation::Zone2 => self.bz2,
            ZoneLocation::Zone3 => self.bz3,
        }
    }

    /// Slab thickness of a transverse zone (m)
    pub fn zone_thickness(&self, location: ZoneLocation) -> f64 {
        if location.is_middle() {
            self.dz_2
        } else {
            self.dz
        }
    }

    /// Transverse extent `(y_min, y_max)` of a zone relative to the reference axis
    pub fn zone_y_range(&self, location: ZoneLocation) -> (f64, f64) {
        let half = self.bz2 / 2.0;
        match location {
            ZoneLocation::Zone1 => (half, half + self.bz1),
            ZoneLocation::Zone2 => (-half, half),
            ZoneLocation::Zone3 => (-half - self.bz3, -half),
        }
    }

    /// Vertical extent `(z_bottom, z_top)` of a zone
    pub fn zone_z_range(&self, location: ZoneLocation) -> (f64, f64) {
        (-self.dz, self.zone_thickness(location) - self.dz)
    }

    /// The deck edge on the zone 1 side, where load zones start stacking
    pub fn top_edge_y(&self) -> f64 {
        self.bz2 / 2.0 + self.bz1
    }

    /// The deck edge on the zone 3 side
    pub fn bottom_edge_y(&self) -> f64 {
        -self.bz2 / 2.0 - self.bz3
    }

    /// Validate the row's own dimensions.
    ///
    /// `index` is the 0-based row index used in error field names.
    pub fn validate(&self, index: usize) -> DeckResult<()> {
        let dims = [
            ("bz1", self.bz1, "Zone width must be positive"),
            ("bz2", self.bz2, "Zone width must be positive"),
            ("bz3", self.bz3, "Zone width must be positive"),
            ("dz", self.dz, "Thickness must be positive"),
            ("dz_2", self.dz_2, "Thickness must be positive"),
        ];
        for (name, value, reason) in dims {
            if !value.is_finite() || value <= 0.0 {
                return Err(DeckError::invalid_input(
                    format!("segments[{}].{}", index, name),
                    value.to_string(),
                    reason,
                ));
            }
        }
        if index > 0 && (!self.l.is_finite() || self.l < 0.0) {
            return Err(DeckError::invalid_input(
                format!("segments[{}].l", index),
                self.l.to_string(),
                "Distance to previous cross-section must not be negative",
            ));
        }
        Ok(())
    }
}

/// Ordered list of bridge rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentTable {
    rows: Vec<BridgeSegment>,
}

impl SegmentTable {
    /// Create a table from rows in longitudinal order
    pub fn new(rows: Vec<BridgeSegment>) -> Self {
        SegmentTable { rows }
    }

    /// All rows
    pub fn rows(&self) -> &[BridgeSegment] {
        &self.rows
    }

    /// Row by 0-based index
    pub fn get(&self, index: usize) -> Option<&BridgeSegment> {
        self.rows.get(index)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of spans between consecutive rows
    pub fn span_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// Validate every row and the first-row flag invariant.
    ///
    /// # Errors
    ///
    /// * `DeckError::EmptyBridge` - no rows
    /// * `DeckError::InvalidInput` - non-positive dimension, negative `l`, or
    ///   `is_first_segment` set on any row but the first (or missing on it)
    pub fn validate(&self) -> DeckResult<()> {
        if self.rows.is_empty() {
            return Err(DeckError::EmptyBridge);
        }
        for (index, row) in self.rows.iter().enumerate() {
            let expected_first = index == 0;
            if row.is_first_segment != expected_first {
                return Err(DeckError::invalid_input(
                    format!("segments[{}].is_first_segment", index),
                    row.is_first_segment.to_string(),
                    "Exactly the first row must be marked as first segment",
                ));
            }
            row.validate(index)?;
        }
        Ok(())
    }

    /// Validate and additionally require at least one span with positive length.
    ///
    /// Solid geometry cannot be built from a single row or from zero-length spans.
    pub fn validate_spans(&self) -> DeckResult<()> {
        self.validate()?;
        if self.rows.len() < 2 {
            return Err(DeckError::invalid_input(
                "segments",
                self.rows.len().to_string(),
                "At least two rows are needed to form one span",
            ));
        }
        for (index, row) in self.rows.iter().enumerate().skip(1) {
            if row.l <= 0.0 {
                return Err(DeckError::invalid_input(
                    format!("segments[{}].l", index),
                    row.l.to_string(),
                    "Span length must be positive",
                ));
            }
        }
        Ok(())
    }

    /// Cumulative longitudinal position of every row (first row at 0).
    pub fn positions(&self) -> Vec<f64> {
        let mut x = 0.0;
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                if index > 0 {
                    x += row.l;
                }
                x
            })
            .collect()
    }

    /// Total length from the first to the last row (m)
    pub fn total_length(&self) -> f64 {
        self.rows.iter().skip(1).map(|row| row.l).sum()
    }

    /// Deck width at row `index`, if the row exists
    pub fn total_width(&self, index: usize) -> Option<f64> {
        self.rows.get(index).map(BridgeSegment::total_width)
    }

    /// Rows bounding span `span` (0-based): `(start, end)`
    pub fn span(&self, span: usize) -> Option<(&BridgeSegment, &BridgeSegment)> {
        Some((self.rows.get(span)?, self.rows.get(span + 1)?))
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<BridgeSegment> {
        &mut self.rows
    }

    /// Force the first-row flag onto row 0 only and zero its `l`.
    pub fn normalize_first_flags(&mut self) {
        for (index, row) in self.rows.iter_mut().enumerate() {
            row.is_first_segment = index == 0;
            if index == 0 {
                row.l = 0.0;
            }
        }
    }
}

impl From<Vec<BridgeSegment>> for SegmentTable {
    fn from(rows: Vec<BridgeSegment>) -> Self {
        SegmentTable::new(rows)
    }
}
