//! # Cross-Section Index
//!
//! Maps the named cross-sections `D1`..`D15` onto longitudinal positions.
//! Every row of the segment table defines one cross-section, up to a fixed
//! maximum of [`MAX_CROSS_SECTIONS`]. Rows beyond the cap get no
//! cross-section; the index records how many were omitted so callers can
//! surface it instead of silently losing data.
//!
//! ## Example
//!
//! ```rust
//! use deck_core::cross_sections::CrossSectionIndex;
//! use deck_core::segments::{BridgeSegment, SegmentTable};
//!
//! let table = SegmentTable::new(vec![
//!     BridgeSegment::first(2.0, 10.0, 2.0, 0.8, 1.0),
//!     BridgeSegment::next(2.0, 10.0, 2.0, 0.8, 1.0, 10.0),
//! ]);
//! let index = CrossSectionIndex::build(&table).unwrap();
//!
//! assert_eq!(index.len(), 2);
//! assert_eq!(index.sections()[1].name, "D2");
//! assert!((index.sections()[1].position - 10.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::DeckResult;
use crate::segments::SegmentTable;

/// Design limit on the number of named cross-sections
pub const MAX_CROSS_SECTIONS: usize = 15;

/// A named transverse reference plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    /// Name, `D1`..`D15`
    pub name: String,

    /// 0-based index, equal to the defining row index
    pub index: usize,

    /// Longitudinal coordinate (m)
    pub position: f64,

    /// Total deck width at this cross-section (m)
    pub width: f64,
}

/// Name of the cross-section at 0-based `index`
pub fn cross_section_name(index: usize) -> String {
    format!("D{}", index + 1)
}

/// Active cross-sections derived from a segment table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionIndex {
    sections: Vec<CrossSection>,

    /// Rows that did not get a cross-section because of the cap
    pub omitted_count: usize,
}

impl CrossSectionIndex {
    /// Build the index from a validated segment table.
    ///
    /// The width at a cross-section is taken from the row that defines it,
    /// i.e. the segment immediately following the boundary.
    pub fn build(table: &SegmentTable) -> DeckResult<Self> {
        table.validate()?;

        let positions = table.positions();
        let sections: Vec<CrossSection> = table
            .rows()
            .iter()
            .zip(positions)
            .take(MAX_CROSS_SECTIONS)
            .enumerate()
            .map(|(index, (row, position))| CrossSection {
                name: cross_section_name(index),
                index,
                position,
                width: row.total_width(),
            })
            .collect();

        let omitted_count = table.len().saturating_sub(sections.len());
        if omitted_count > 0 {
            tracing::warn!(
                omitted_count,
                max = MAX_CROSS_SECTIONS,
                "Segment table exceeds the cross-section limit; trailing rows have no cross-section"
            );
        }

        Ok(CrossSectionIndex {
            sections,
            omitted_count,
        })
    }

    /// Active cross-sections in longitudinal order
    pub fn sections(&self) -> &[CrossSection] {
        &self.sections
    }

    /// Number of active cross-sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// True when there are no active cross-sections
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// True when the cap cut off rows
    pub fn is_truncated(&self) -> bool {
        self.omitted_count > 0
    }

    /// Look up a cross-section by name (case-insensitive, e.g. "d3")
    pub fn by_name(&self, name: &str) -> Option<&CrossSection> {
        self.sections
            .iter()
            .find(|section| section.name.eq_ignore_ascii_case(name))
    }

    /// Deck width at the cross-section with 0-based `index`
    pub fn width_at(&self, index: usize) -> Option<f64> {
        self.sections.get(index).map(|section| section.width)
    }

    /// The cross-section nearest to a longitudinal coordinate
    pub fn nearest(&self, x: f64) -> Option<&CrossSection> {
        self.sections.iter().min_by(|a, b| {
            (a.position - x)
                .abs()
                .total_cmp(&(b.position - x).abs())
        })
    }

    /// Message describing the truncation, if any
    pub fn truncation_message(&self) -> Option<String> {
        if self.is_truncated() {
            Some(format!(
                "Only the first {} cross-sections are supported; {} further row(s) have no cross-section.",
                MAX_CROSS_SECTIONS, self.omitted_count
            ))
        } else {
            None
        }
    }
}
