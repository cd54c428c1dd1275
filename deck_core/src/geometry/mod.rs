//! # Deck Geometry
//!
//! Builds the 3D solid of the deck from the segment table and cuts the 2D
//! silhouettes the drawings are made from.
//!
//! Every transverse zone of every span becomes one [`ZoneBlock`]. Blocks are
//! authored around the reference axis (x along the bridge starting at the
//! first row, y = 0 in the middle of zone 2, z = 0 at the top of zones 1
//! and 3). The block meshes, plus optional bar cylinders, are merged into a
//! single assembly which is translated once by the configured placement.
//!
//! Silhouettes are computed from the blocks, so they are expressed in the
//! reference frame regardless of placement.
//!
//! ## Example
//!
//! ```rust
//! use deck_core::geometry::{GeometryBuilder, SectionPlane, ViewSettings};
//! use deck_core::segments::{BridgeSegment, SegmentTable};
//!
//! let table = SegmentTable::new(vec![
//!     BridgeSegment::first(2.0, 10.0, 2.0, 0.8, 1.0),
//!     BridgeSegment::next(2.0, 10.0, 2.0, 0.8, 1.0, 10.0),
//! ]);
//!
//! let geometry = GeometryBuilder::new().build(&table, &ViewSettings::default(), None).unwrap();
//! assert_eq!(geometry.blocks.len(), 3);
//! assert!(geometry.solid.is_closed());
//!
//! let cross = geometry.view(&SectionPlane::Cross { x: 5.0 }).unwrap();
//! assert_eq!(cross.silhouettes.len(), 3);
//! ```

pub mod block;
pub mod mesh;
pub mod section;

pub use block::{Linear, ZoneBlock};
pub use mesh::{Bounds, SolidMesh};
pub use section::{SectionPlane, Silhouette, ViewSettings};

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::errors::{DeckError, DeckResult};
use crate::reinforcement::ReinforcementLayout;
use crate::segments::{SegmentTable, ZoneLocation};
use crate::units::mm_to_m;

const EPS: f64 = 1e-9;

/// Silhouettes of all blocks in one plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionView {
    pub plane: SectionPlane,
    pub silhouettes: Vec<Silhouette>,
}

/// Output of [`GeometryBuilder::build`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckGeometry {
    /// Zone blocks in span order, zones 1, 2, 3 within a span
    pub blocks: Vec<ZoneBlock>,

    /// The placed assembly: slab blocks followed by bar cylinders
    pub solid: SolidMesh,

    /// Offset applied to `solid`
    pub placement: Vector3<f64>,

    /// Number of bar cylinders in `solid`
    pub bar_count: usize,

    /// Silhouettes for the requested planes
    pub views: Vec<SectionView>,
}

impl DeckGeometry {
    /// Cut every block with a plane.
    pub fn section(&self, plane: &SectionPlane) -> Vec<Silhouette> {
        let silhouette = |block: &ZoneBlock, outline| Silhouette {
            zone: block.zone,
            outline,
        };
        match *plane {
            SectionPlane::Plan => self
                .blocks
                .iter()
                .map(|b| silhouette(b, b.plan_outline()))
                .collect(),
            SectionPlane::Horizontal { z } => self
                .blocks
                .iter()
                .filter_map(|b| b.horizontal_section(z).map(|o| silhouette(b, o)))
                .collect(),
            SectionPlane::Longitudinal { y } => self
                .blocks
                .iter()
                .filter_map(|b| b.longitudinal_section(y).map(|o| silhouette(b, o)))
                .collect(),
            SectionPlane::Cross { x } => {
                // A boundary belongs to the span that starts there, the far end to the last span.
                let deck_end = self.blocks.last().map(|b| b.x.1).unwrap_or_default();
                self.blocks
                    .iter()
                    .filter(|b| {
                        let inside = x >= b.x.0 - EPS && x < b.x.1 - EPS;
                        let at_end = (x - deck_end).abs() <= EPS && (b.x.1 - deck_end).abs() <= EPS;
                        inside || at_end
                    })
                    .filter_map(|b| b.parameter(x).map(|t| silhouette(b, b.cross_section_at(t))))
                    .collect()
            }
        }
    }

    /// A requested view by plane
    pub fn view(&self, plane: &SectionPlane) -> Option<&SectionView> {
        self.views.iter().find(|v| &v.plane == plane)
    }

    /// Total volume of the slab blocks (m³), excluding bars
    pub fn slab_volume(&self) -> f64 {
        self.blocks.iter().map(|b| b.mesh().volume()).sum()
    }

    /// Bounds of the placed assembly
    pub fn bounds(&self) -> Option<Bounds> {
        self.solid.bounds()
    }
}

/// Builds [`DeckGeometry`] from a segment table.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryBuilder {
    /// Final translation of the assembly
    pub placement: Vector3<f64>,

    /// Add a cylinder per bar when a reinforcement layout is given
    pub include_rebar: bool,

    /// Facets per bar cylinder
    pub rebar_sections: usize,
}

impl Default for GeometryBuilder {
    fn default() -> Self {
        Self {
            placement: Vector3::zeros(),
            include_rebar: false,
            rebar_sections: 16,
        }
    }
}

impl GeometryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            placement: config.placement.to_vector(),
            include_rebar: config.include_rebar_solids,
            rebar_sections: config.rebar_sections,
        }
    }

    pub fn with_placement(mut self, placement: Vector3<f64>) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_rebar(mut self, sections: usize) -> Self {
        self.include_rebar = true;
        self.rebar_sections = sections;
        self
    }

    /// Build the assembly and the silhouettes for the planes in `view`.
    ///
    /// # Errors
    ///
    /// * `DeckError::EmptyBridge` - no rows
    /// * `DeckError::InvalidInput` - a single row, non-positive dimensions or a zero-length span
    /// * `DeckError::ConfigError` - rebar requested with fewer than 3 facets
    pub fn build(
        &self,
        table: &SegmentTable,
        view: &ViewSettings,
        rebar: Option<&ReinforcementLayout>,
    ) -> DeckResult<DeckGeometry> {
        table.validate_spans()?;
        if self.include_rebar && self.rebar_sections < 3 {
            return Err(DeckError::config_error(format!(
                "rebar_sections must be at least 3, got {}",
                self.rebar_sections
            )));
        }

        let positions = table.positions();
        let mut blocks = Vec::with_capacity(table.span_count() * 3);
        for span in 0..table.span_count() {
            let (start, end) = (&table.rows()[span], &table.rows()[span + 1]);
            let x = (positions[span], positions[span + 1]);
            for location in ZoneLocation::ALL {
                blocks.push(ZoneBlock::between(location, span + 1, start, end, x));
            }
        }

        let mut solid = SolidMesh::new();
        for block in &blocks {
            solid.merge(&block.mesh());
        }

        let mut bar_count = 0;
        if let Some(layout) = rebar.filter(|_| self.include_rebar) {
            let bars = self.bar_solids(layout);
            bar_count = bars.len();
            for bar in &bars {
                solid.merge(bar);
            }
        }

        solid.translate(self.placement);

        let mut geometry = DeckGeometry {
            blocks,
            solid,
            placement: self.placement,
            bar_count,
            views: Vec::new(),
        };
        geometry.views = view
            .planes()
            .into_iter()
            .map(|plane| SectionView {
                silhouettes: geometry.section(&plane),
                plane,
            })
            .collect();

        tracing::debug!(
            blocks = geometry.blocks.len(),
            bars = bar_count,
            vertices = geometry.solid.vertex_count(),
            faces = geometry.solid.face_count(),
            "Built deck geometry"
        );
        Ok(geometry)
    }

    fn bar_solids(&self, layout: &ReinforcementLayout) -> Vec<SolidMesh> {
        let mut bars = Vec::new();
        for zone in layout.zones.iter().filter(|z| z.span.is_some()) {
            for layer in &zone.layers {
                let radius = mm_to_m(layer.diameter_mm) / 2.0;
                let (a, b) = layer.run;
                for &p in &layer.positions {
                    let (start, end) = if layer.role.is_longitudinal() {
                        (Point3::new(a, p, layer.z), Point3::new(b, p, layer.z))
                    } else {
                        (Point3::new(p, a, layer.z), Point3::new(p, b, layer.z))
                    };
                    let bar = SolidMesh::cylinder(start, end, radius, self.rebar_sections);
                    if !bar.is_empty() {
                        bars.push(bar);
                    }
                }
            }
        }
        bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reinforcement::{reconcile, ReinforcementZoneMapper, ZoneId};
    use crate::segments::BridgeSegment;
    use approx::assert_relative_eq;

    fn two_span_table() -> SegmentTable {
        SegmentTable::new(vec![
            BridgeSegment::first(2.0, 10.0, 3.0, 0.8, 1.2),
            BridgeSegment::next(2.0, 10.0, 3.0, 0.8, 1.2, 10.0),
            BridgeSegment::next(1.0, 8.0, 1.0, 0.6, 1.0, 5.0),
        ])
    }

    #[test]
    fn test_prism_volume() {
        let table = SegmentTable::new(vec![
            BridgeSegment::first(2.0, 10.0, 3.0, 0.8, 1.2),
            BridgeSegment::next(2.0, 10.0, 3.0, 0.8, 1.2, 10.0),
        ]);
        let geometry = GeometryBuilder::new().build(&table, &ViewSettings::default(), None).unwrap();
        let expected = 10.0 * (2.0 * 0.8 + 10.0 * 1.2 + 3.0 * 0.8);
        assert_relative_eq!(geometry.solid.signed_volume(), expected, epsilon = 1e-9);
        assert_relative_eq!(geometry.slab_volume(), expected, epsilon = 1e-9);
        assert!(geometry.solid.is_closed());
    }

    #[test]
    fn test_blocks_follow_spans() {
        let geometry = GeometryBuilder::new()
            .build(&two_span_table(), &ViewSettings::default(), None)
            .unwrap();
        assert_eq!(geometry.blocks.len(), 6);
        assert_eq!(geometry.blocks[4].zone, ZoneId::new(ZoneLocation::Zone2, 2));
        assert_eq!(geometry.blocks[4].x, (10.0, 15.0));
        let bounds = geometry.bounds().unwrap();
        assert_relative_eq!(bounds.max.x, 15.0, epsilon = 1e-12);
        assert_relative_eq!(bounds.min.y, -8.0, epsilon = 1e-12);
        assert_relative_eq!(bounds.max.z, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_single_translation() {
        let table = two_span_table();
        let offset = Vector3::new(100.0, -20.0, 5.0);
        let reference = GeometryBuilder::new().build(&table, &ViewSettings::default(), None).unwrap();
        let placed = GeometryBuilder::new()
            .with_placement(offset)
            .build(&table, &ViewSettings::default(), None)
            .unwrap();
        for (a, b) in reference.solid.vertices.iter().zip(&placed.solid.vertices) {
            assert_eq!(*a + offset, *b);
        }
        // silhouettes stay in the reference frame
        assert_eq!(reference.views, placed.views);
    }

    #[test]
    fn test_build_is_deterministic() {
        let table = two_span_table();
        let view = ViewSettings {
            longitudinal_section_y: 1.5,
            cross_section_x: 12.0,
            horizontal_section_z: Some(-0.3),
        };
        let a = GeometryBuilder::new().build(&table, &view, None).unwrap();
        let b = GeometryBuilder::new().build(&table, &view, None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.views.len(), 4);
    }

    #[test]
    fn test_cross_section_at_boundary_uses_following_span() {
        let geometry = GeometryBuilder::new()
            .build(&two_span_table(), &ViewSettings::default(), None)
            .unwrap();
        let silhouettes = geometry.section(&SectionPlane::Cross { x: 10.0 });
        assert_eq!(silhouettes.len(), 3);
        assert!(silhouettes.iter().all(|s| s.zone.segment == 2));

        let end = geometry.section(&SectionPlane::Cross { x: 15.0 });
        assert_eq!(end.len(), 3);
        let zone2 = end.iter().find(|s| s.zone.location == ZoneLocation::Zone2).unwrap();
        assert_relative_eq!(zone2.area(), 8.0 * 1.0, epsilon = 1e-9);

        assert!(geometry.section(&SectionPlane::Cross { x: 20.0 }).is_empty());
    }

    #[test]
    fn test_longitudinal_section_on_axis() {
        let geometry = GeometryBuilder::new()
            .build(&two_span_table(), &ViewSettings::default(), None)
            .unwrap();
        let view = geometry.view(&SectionPlane::Longitudinal { y: 0.0 }).unwrap();
        assert_eq!(view.silhouettes.len(), 2);
        assert!(view.silhouettes.iter().all(|s| s.zone.location == ZoneLocation::Zone2));
        assert_relative_eq!(view.silhouettes[0].area(), 12.0, epsilon = 1e-9);
    }

    #[test]
    fn test_plan_covers_deck_area() {
        let geometry = GeometryBuilder::new()
            .build(&two_span_table(), &ViewSettings::default(), None)
            .unwrap();
        let plan = geometry.view(&SectionPlane::Plan).unwrap();
        let area: f64 = plan.silhouettes.iter().map(Silhouette::area).sum();
        assert_relative_eq!(area, 15.0 * 10.0 + 5.0 * (15.0 + 10.0) / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_degenerate_tables() {
        let builder = GeometryBuilder::new();
        let view = ViewSettings::default();
        assert_eq!(
            builder.build(&SegmentTable::default(), &view, None),
            Err(DeckError::EmptyBridge)
        );
        let single = SegmentTable::new(vec![BridgeSegment::first(2.0, 10.0, 3.0, 0.8, 1.2)]);
        assert!(builder.build(&single, &view, None).is_err());

        let mut rows = two_span_table().rows().to_vec();
        rows[1].dz_2 = -1.0;
        match builder.build(&SegmentTable::new(rows), &view, None) {
            Err(DeckError::InvalidInput { field, .. }) => assert_eq!(field, "segments[1].dz_2"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_rebar_solids() {
        let table = SegmentTable::new(vec![
            BridgeSegment::first(2.0, 10.0, 3.0, 0.8, 1.2),
            BridgeSegment::next(2.0, 10.0, 3.0, 0.8, 1.2, 10.0),
        ]);
        let zones = reconcile(&[], table.len());
        let layout = ReinforcementZoneMapper::default().map(&zones, &table).unwrap();
        let expected_bars: usize = layout
            .zones
            .iter()
            .filter(|z| z.span.is_some())
            .flat_map(|z| z.layers.iter().map(|l| l.count()))
            .sum();

        let plain = GeometryBuilder::new()
            .build(&table, &ViewSettings::default(), Some(&layout))
            .unwrap();
        assert_eq!(plain.bar_count, 0);

        let with_bars = GeometryBuilder::new()
            .with_rebar(8)
            .build(&table, &ViewSettings::default(), Some(&layout))
            .unwrap();
        assert_eq!(with_bars.bar_count, expected_bars);
        assert!(with_bars.solid.is_closed());
        assert_eq!(with_bars.solid.vertex_count(), 3 * 8 + expected_bars * (2 * 8 + 2));
    }

    #[test]
    fn test_rebar_needs_three_sections() {
        let table = two_span_table();
        let result = GeometryBuilder::new()
            .with_rebar(2)
            .build(&table, &ViewSettings::default(), None);
        assert!(matches!(result, Err(DeckError::ConfigError { .. })));
    }
}
