//! # View Projection
//!
//! Turns the geometry, the load-zone report and the reinforcement layout
//! into 2D drawing primitives for three views:
//!
//! - **Plan** (x, y): zone outlines, span and width dimensions, `D{k}`
//!   markers, zone numbers and the load-zone bands.
//! - **Longitudinal section** (x, z): the cut outline with thickness labels
//!   and the longitudinal bar layers.
//! - **Cross-section** (y, z): zone outlines with width and thickness
//!   labels, bar markers and bend-radius warnings.
//!
//! Findings are drawn, never raised: a load zone that runs past the deck
//! edge gets a highlighted outline, a cross-section whose total overflows
//! gets a general warning annotation.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::cross_sections::CrossSectionIndex;
use crate::geometry::{DeckGeometry, SectionPlane, Silhouette, ViewSettings};
use crate::load_zones::{LoadZoneReport, LoadZoneType, ZoneCheck};
use crate::reinforcement::{BarRole, MappedZone, ReinforcementLayout};
use crate::segments::{SegmentTable, ZoneLocation};
use crate::units::mm_to_m;

const POSITION_EPS: f64 = 1e-6;

/// Which drawing a primitive belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Plan,
    Longitudinal,
    Cross,
}

impl ViewKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ViewKind::Plan => "Plan",
            ViewKind::Longitudinal => "Longitudinal section",
            ViewKind::Cross => "Cross-section",
        }
    }
}

/// Drawing layer of a primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Outline,
    Section,
    Dimension,
    CrossSection,
    ZoneNumber,
    LoadZone,
    Reinforcement,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hatch {
    Diagonal,
    Cross,
    Dots,
}

/// Stroke and fill of a primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Line colour as `#rrggbb`
    pub stroke: String,

    pub line_width: f64,

    #[serde(default)]
    pub dashed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hatch: Option<Hatch>,
}

impl Style {
    fn solid(stroke: &str, line_width: f64) -> Self {
        Style {
            stroke: stroke.to_string(),
            line_width,
            dashed: false,
            fill: None,
            hatch: None,
        }
    }

    pub fn outline() -> Self {
        Style::solid("#000000", 1.0)
    }

    pub fn reference() -> Self {
        Style {
            dashed: true,
            ..Style::solid("#757575", 0.5)
        }
    }

    pub fn reinforcement() -> Self {
        Style::solid("#1565c0", 0.75)
    }

    /// Highlight of an element with a finding
    pub fn highlight() -> Self {
        Style::solid("#d50000", 2.5)
    }

    /// Band style of a load-zone type
    pub fn load_zone(zone_type: LoadZoneType) -> Self {
        let (stroke, fill, hatch) = match zone_type {
            LoadZoneType::Pedestrian => ("#2e7d32", "#a5d6a7", Some(Hatch::Diagonal)),
            LoadZoneType::Cyclist => ("#6a1b9a", "#ce93d8", Some(Hatch::Cross)),
            LoadZoneType::Vehicle => ("#455a64", "#cfd8dc", None),
            LoadZoneType::Verge => ("#827717", "#e6ee9c", Some(Hatch::Dots)),
        };
        Style {
            fill: Some(fill.to_string()),
            hatch,
            ..Style::solid(stroke, 1.0)
        }
    }
}

/// Open or closed line through a list of points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub layer: Layer,
    pub points: Vec<Point2<f64>>,
    pub closed: bool,
    pub style: Style,

    /// Zone identifier or load-zone reference the line belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub layer: Layer,
    pub position: Point2<f64>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Cross-cut of a bar, drawn as a circle of `size` diameter
    Bar,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub position: Point2<f64>,
    pub size: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// All primitives of one view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub kind: ViewKind,
    pub title: String,
    pub polylines: Vec<Polyline>,
    pub labels: Vec<Label>,
    pub markers: Vec<Marker>,

    /// Findings shown as general annotations
    pub warnings: Vec<String>,
}

impl Drawing {
    fn new(kind: ViewKind, title: impl Into<String>) -> Self {
        Drawing {
            kind,
            title: title.into(),
            polylines: Vec::new(),
            labels: Vec::new(),
            markers: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn line(&mut self, layer: Layer, points: Vec<Point2<f64>>, closed: bool, style: Style, tag: Option<String>) {
        self.polylines.push(Polyline {
            layer,
            points,
            closed,
            style,
            tag,
        });
    }

    fn label(&mut self, layer: Layer, position: Point2<f64>, text: impl Into<String>) {
        self.labels.push(Label {
            layer,
            position,
            text: text.into(),
        });
    }

    fn warn(&mut self, position: Point2<f64>, text: String, tag: Option<String>) {
        self.markers.push(Marker {
            kind: MarkerKind::Warning,
            position,
            size: 0.0,
            text: Some(text),
            tag,
        });
    }

    /// Texts of all labels on a layer
    pub fn label_texts(&self, layer: Layer) -> Vec<&str> {
        self.labels
            .iter()
            .filter(|l| l.layer == layer)
            .map(|l| l.text.as_str())
            .collect()
    }

    /// Polylines on a layer
    pub fn polylines_on(&self, layer: Layer) -> impl Iterator<Item = &Polyline> {
        self.polylines.iter().filter(move |p| p.layer == layer)
    }

    /// Highlighted outlines of elements with findings
    pub fn highlighted(&self) -> Vec<&Polyline> {
        let highlight = Style::highlight();
        self.polylines.iter().filter(|p| p.style == highlight).collect()
    }

    pub fn markers_of(&self, kind: MarkerKind) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(move |m| m.kind == kind)
    }
}

/// The three drawings of a bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSet {
    pub plan: Drawing,
    pub longitudinal: Drawing,
    pub cross: Drawing,
}

impl ViewSet {
    pub fn all(&self) -> [&Drawing; 3] {
        [&self.plan, &self.longitudinal, &self.cross]
    }
}

/// Upstream results a projection is computed from
#[derive(Debug, Clone, Copy)]
pub struct ProjectionInput<'a> {
    pub table: &'a SegmentTable,
    pub index: &'a CrossSectionIndex,
    pub geometry: &'a DeckGeometry,
    pub load_zones: &'a LoadZoneReport,
    pub reinforcement: &'a ReinforcementLayout,
    pub view: &'a ViewSettings,
}

impl<'a> ProjectionInput<'a> {
    fn silhouettes(&self, plane: SectionPlane) -> Vec<Silhouette> {
        match self.geometry.view(&plane) {
            Some(view) => view.silhouettes.clone(),
            None => self.geometry.section(&plane),
        }
    }

    /// Zone 1 edge of the row defining cross-section `index`
    fn top_edge(&self, index: usize) -> Option<f64> {
        self.table.get(index).map(|row| row.top_edge_y())
    }
}

/// Format a length in metres with at most two decimals
fn metres(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0 + 0.0;
    format!("{}", rounded)
}

fn vertical_extent(silhouettes: &[Silhouette]) -> Option<(f64, f64)> {
    silhouettes
        .iter()
        .filter_map(Silhouette::extent)
        .map(|(lo, hi)| (lo.y, hi.y))
        .reduce(|(a, b), (c, d)| (a.min(c), b.max(d)))
}

/// Produces the plan, longitudinal and cross-section drawings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewProjector {
    /// Distance of dimension labels from their outline (m)
    pub label_offset: f64,

    /// Load-zone widths below this get no width label (m)
    pub min_label_width: f64,
}

impl Default for ViewProjector {
    fn default() -> Self {
        ViewProjector {
            label_offset: 0.5,
            min_label_width: 0.01,
        }
    }
}

impl ViewProjector {
    pub fn from_config(config: &EngineConfig) -> Self {
        ViewProjector {
            label_offset: config.label_offset_m,
            min_label_width: config.min_label_width_m,
        }
    }

    /// Build all three drawings
    pub fn project(&self, input: &ProjectionInput) -> ViewSet {
        let views = ViewSet {
            plan: self.plan(input),
            longitudinal: self.longitudinal(input),
            cross: self.cross(input),
        };
        tracing::debug!(
            plan = views.plan.polylines.len(),
            longitudinal = views.longitudinal.polylines.len(),
            cross = views.cross.polylines.len(),
            warnings = views.all().iter().map(|d| d.warnings.len()).sum::<usize>(),
            "Projected views"
        );
        views
    }

    pub fn plan(&self, input: &ProjectionInput) -> Drawing {
        let mut drawing = Drawing::new(ViewKind::Plan, ViewKind::Plan.display_name());
        let offset = self.label_offset;
        let positions = input.table.positions();
        let rows = input.table.rows();

        let silhouettes = input.silhouettes(SectionPlane::Plan);
        for silhouette in &silhouettes {
            let tag = Some(silhouette.zone.to_string());
            drawing.line(Layer::Outline, silhouette.outline.clone(), true, Style::outline(), tag);
            if let Some(anchor) = silhouette.anchor() {
                drawing.label(Layer::ZoneNumber, anchor, silhouette.zone.to_string());
            }
        }

        if let Some(z) = input.view.horizontal_section_z {
            drawing.title = format!("{} with section at z = {}m", drawing.title, metres(z));
            for silhouette in input.silhouettes(SectionPlane::Horizontal { z }) {
                let tag = Some(silhouette.zone.to_string());
                drawing.line(Layer::Section, silhouette.outline, true, Style::reference(), tag);
            }
        }

        for span in 0..input.table.span_count() {
            let (start, end) = (&rows[span], &rows[span + 1]);
            let x = (positions[span] + positions[span + 1]) / 2.0;
            let y = start.bottom_edge_y().min(end.bottom_edge_y()) - offset;
            drawing.label(Layer::Dimension, Point2::new(x, y), format!("l = {}m", metres(end.l)));
        }

        for (row, &x) in rows.iter().zip(&positions) {
            for (name, width, location) in [
                ("bz1", row.bz1, ZoneLocation::Zone1),
                ("bz2", row.bz2, ZoneLocation::Zone2),
                ("bz3", row.bz3, ZoneLocation::Zone3),
            ] {
                let (y_min, y_max) = row.zone_y_range(location);
                drawing.label(
                    Layer::Dimension,
                    Point2::new(x, (y_min + y_max) / 2.0),
                    format!("{} = {}m", name, metres(width)),
                );
            }
        }

        for section in input.index.sections() {
            if let Some(row) = input.table.get(section.index) {
                let x = section.position;
                drawing.line(
                    Layer::CrossSection,
                    vec![Point2::new(x, row.bottom_edge_y()), Point2::new(x, row.top_edge_y())],
                    false,
                    Style::reference(),
                    Some(section.name.clone()),
                );
                drawing.label(Layer::CrossSection, Point2::new(x, row.top_edge_y() + offset), section.name.clone());
            }
        }
        if let Some(message) = input.index.truncation_message() {
            drawing.warnings.push(message);
        }

        self.plan_load_zones(input, &mut drawing);
        drawing
    }

    fn plan_load_zones(&self, input: &ProjectionInput, drawing: &mut Drawing) {
        let sections = input.index.sections();
        for check in &input.load_zones.zones {
            let tag = Some(format!("load_zones[{}]", check.zone_index));
            let near: Vec<Point2<f64>> = sections
                .iter()
                .zip(&check.bands)
                .filter_map(|(s, band)| Some(Point2::new(s.position, input.top_edge(s.index)? - band.start)))
                .collect();
            let far: Vec<Point2<f64>> = sections
                .iter()
                .zip(&check.bands)
                .filter_map(|(s, band)| Some(Point2::new(s.position, input.top_edge(s.index)? - band.end)))
                .collect();
            if near.is_empty() {
                continue;
            }

            let mut outline = near.clone();
            outline.extend(far.iter().rev());
            drawing.line(
                Layer::LoadZone,
                outline.clone(),
                true,
                Style::load_zone(check.zone_type),
                tag.clone(),
            );
            if check.exceeds_limits() {
                drawing.line(Layer::Warning, outline, true, Style::highlight(), tag.clone());
            }

            let mid = near.len() / 2;
            let type_anchor = Point2::new(near[mid].x, (near[mid].y + far[mid].y) / 2.0);
            drawing.label(Layer::LoadZone, type_anchor, check.zone_type.display_name());

            for ((section, band), (n, f)) in sections.iter().zip(&check.bands).zip(near.iter().zip(&far)) {
                if band.width() >= self.min_label_width {
                    let at = Point2::new(n.x + self.label_offset, (n.y + f.y) / 2.0);
                    drawing.label(Layer::Dimension, at, format!("{}m", metres(band.width())));
                }
                if check.offending_sections.contains(&section.index) {
                    let text = format!(
                        "{} zone extends beyond the deck edge at {}.",
                        check.zone_type.display_name(),
                        section.name
                    );
                    drawing.warn(Point2::new(n.x, (n.y + f.y) / 2.0), text, tag.clone());
                }
            }
        }

        for check in input.load_zones.sections.iter().filter(|s| s.overflow) {
            let Some(section) = sections.get(check.index) else {
                continue;
            };
            let Some(row) = input.table.get(check.index) else {
                continue;
            };
            let message = format!(
                "At {}: total zone width ({}m) exceeds deck width ({}m) by {}m.",
                check.name,
                metres(check.explicit_sum),
                metres(check.deck_width),
                metres(check.overrun)
            );
            drawing.label(
                Layer::Warning,
                Point2::new(section.position, row.bottom_edge_y() - 2.0 * self.label_offset),
                message.clone(),
            );
            drawing.warnings.push(message);
        }
    }

    pub fn longitudinal(&self, input: &ProjectionInput) -> Drawing {
        let y = input.view.longitudinal_section_y;
        let mut drawing = Drawing::new(
            ViewKind::Longitudinal,
            format!("{} at y = {}m", ViewKind::Longitudinal.display_name(), metres(y)),
        );
        let offset = self.label_offset;

        let silhouettes = input.silhouettes(SectionPlane::Longitudinal { y });
        let Some((z_low, z_high)) = vertical_extent(&silhouettes) else {
            drawing.warnings.push(format!("Longitudinal section at y = {}m does not cut the deck.", metres(y)));
            return drawing;
        };

        for (i, silhouette) in silhouettes.iter().enumerate() {
            let tag = Some(silhouette.zone.to_string());
            drawing.line(Layer::Outline, silhouette.outline.clone(), true, Style::outline(), tag);
            if let Some(anchor) = silhouette.anchor() {
                drawing.label(Layer::ZoneNumber, anchor, silhouette.zone.to_string());
            }

            // outline order: near bottom, far bottom, far top, near top
            if let [near_bottom, far_bottom, far_top, near_top] = silhouette.outline.as_slice() {
                let h = near_top.y - near_bottom.y;
                drawing.label(
                    Layer::Dimension,
                    Point2::new(near_bottom.x + offset, (near_bottom.y + near_top.y) / 2.0),
                    format!("h = {}m", metres(h)),
                );
                if i + 1 == silhouettes.len() {
                    let h = far_top.y - far_bottom.y;
                    drawing.label(
                        Layer::Dimension,
                        Point2::new(far_bottom.x - offset, (far_bottom.y + far_top.y) / 2.0),
                        format!("h = {}m", metres(h)),
                    );
                }
            }
        }

        let positions = input.table.positions();
        for span in 0..input.table.span_count() {
            let x = (positions[span] + positions[span + 1]) / 2.0;
            let l = input.table.rows()[span + 1].l;
            drawing.label(Layer::Dimension, Point2::new(x, z_low - offset), format!("l = {}m", metres(l)));
        }

        for section in input.index.sections() {
            let x = section.position;
            drawing.line(
                Layer::CrossSection,
                vec![Point2::new(x, z_low), Point2::new(x, z_high)],
                false,
                Style::reference(),
                Some(section.name.clone()),
            );
            drawing.label(Layer::CrossSection, Point2::new(x, z_high + offset), section.name.clone());
        }

        for silhouette in &silhouettes {
            let Some(zone) = input.reinforcement.zone(&silhouette.zone) else {
                continue;
            };
            if y < zone.y_range.0 || y > zone.y_range.1 {
                continue;
            }
            for layer in zone.layers.iter().filter(|l| l.role.is_longitudinal() && l.count() > 0) {
                drawing.line(
                    Layer::Reinforcement,
                    vec![Point2::new(layer.run.0, layer.z), Point2::new(layer.run.1, layer.z)],
                    false,
                    Style::reinforcement(),
                    Some(zone.id.to_string()),
                );
            }
        }
        drawing
    }

    pub fn cross(&self, input: &ProjectionInput) -> Drawing {
        let x = input.view.cross_section_x;
        let section = input
            .index
            .sections()
            .iter()
            .find(|s| (s.position - x).abs() < POSITION_EPS);
        let title = match section {
            Some(s) => format!("{} {}", ViewKind::Cross.display_name(), s.name),
            None => format!("{} at x = {}m", ViewKind::Cross.display_name(), metres(x)),
        };
        let mut drawing = Drawing::new(ViewKind::Cross, title);
        let offset = self.label_offset;

        let silhouettes = input.silhouettes(SectionPlane::Cross { x });
        let Some((z_low, z_high)) = vertical_extent(&silhouettes) else {
            drawing.warnings.push(format!(
                "Cross-section position x = {}m lies outside the deck (0 to {}m).",
                metres(x),
                metres(input.table.total_length())
            ));
            return drawing;
        };

        for silhouette in &silhouettes {
            let tag = Some(silhouette.zone.to_string());
            let mapped = input.reinforcement.zone(&silhouette.zone);
            let flagged = mapped.is_some_and(|z| !z.bends_compliant() || z.transverse_height <= 0.0);
            let style = if flagged { Style::highlight() } else { Style::outline() };
            drawing.line(Layer::Outline, silhouette.outline.clone(), true, style, tag);

            if let Some((lo, hi)) = silhouette.extent() {
                let center = Point2::new((lo.x + hi.x) / 2.0, (lo.y + hi.y) / 2.0);
                drawing.label(Layer::ZoneNumber, center, silhouette.zone.to_string());
                drawing.label(
                    Layer::Dimension,
                    Point2::new(center.x, z_low - offset),
                    format!("b = {}m", metres(hi.x - lo.x)),
                );
                drawing.label(
                    Layer::Dimension,
                    Point2::new(lo.x + offset, hi.y - offset / 2.0),
                    format!("h = {}m", metres(hi.y - lo.y)),
                );
            }

            if let Some(zone) = mapped {
                self.cross_reinforcement(zone, silhouette, &mut drawing);
            }
        }

        if let Some(section) = section {
            self.cross_load_zones(input, section.index, z_high + offset, &mut drawing);
        }
        drawing
    }

    fn cross_reinforcement(&self, zone: &MappedZone, silhouette: &Silhouette, drawing: &mut Drawing) {
        let tag = Some(zone.id.to_string());
        for layer in &zone.layers {
            if layer.role.is_longitudinal() {
                for &y in &layer.positions {
                    drawing.markers.push(Marker {
                        kind: MarkerKind::Bar,
                        position: Point2::new(y, layer.z),
                        size: mm_to_m(layer.diameter_mm),
                        text: None,
                        tag: tag.clone(),
                    });
                }
            } else if layer.count() > 0 {
                drawing.line(
                    Layer::Reinforcement,
                    vec![Point2::new(layer.run.0, layer.z), Point2::new(layer.run.1, layer.z)],
                    false,
                    Style::reinforcement(),
                    tag.clone(),
                );
            }
        }

        if let Some(bottom) = zone.layer(BarRole::LongitudinalBottom) {
            if let Some(&y) = bottom.positions.first() {
                let text = format!("ø{}-{}", bottom.diameter_mm, bottom.spacing_mm);
                drawing.label(Layer::Reinforcement, Point2::new(y, bottom.z - self.label_offset / 2.0), text);
            }
        }

        let anchor = silhouette.anchor().unwrap_or_else(|| Point2::new(0.0, 0.0));
        for check in zone.bend_checks.iter().filter(|c| !c.is_compliant()) {
            let text = match check.min_radius_mm {
                Some(min) => format!(
                    "{}: ø{} bend radius below minimum {}mm",
                    check.role.display_name(),
                    check.diameter_mm,
                    min
                ),
                None => format!(
                    "{}: no minimum bend radius known for ø{}",
                    check.role.display_name(),
                    check.diameter_mm
                ),
            };
            drawing.warn(anchor, text.clone(), tag.clone());
            drawing.warnings.push(format!("Zone {}: {}", zone.id, text));
        }
        if zone.transverse_height <= 0.0 {
            let text = format!("Zone {}: bar layers do not fit within the slab thickness.", zone.id);
            drawing.warn(anchor, text.clone(), tag);
            drawing.warnings.push(text);
        }
    }

    fn cross_load_zones(&self, input: &ProjectionInput, section_index: usize, z: f64, drawing: &mut Drawing) {
        let Some(top_edge) = input.top_edge(section_index) else {
            return;
        };
        for check in &input.load_zones.zones {
            let Some(band) = check.bands.get(section_index) else {
                continue;
            };
            let tag = Some(format!("load_zones[{}]", check.zone_index));
            let points = vec![Point2::new(top_edge - band.start, z), Point2::new(top_edge - band.end, z)];
            let style = if offends_at(check, section_index) {
                Style::highlight()
            } else {
                Style::load_zone(check.zone_type)
            };
            drawing.line(Layer::LoadZone, points, false, style, tag);
            if band.width() >= self.min_label_width {
                let mid = top_edge - (band.start + band.end) / 2.0;
                drawing.label(
                    Layer::LoadZone,
                    Point2::new(mid, z + self.label_offset / 2.0),
                    format!("{} {}m", check.zone_type.display_name(), metres(band.width())),
                );
            }
        }

        if let Some(check) = input.load_zones.sections.get(section_index).filter(|s| s.overflow) {
            let message = format!(
                "At {}: total zone width ({}m) exceeds deck width ({}m) by {}m.",
                check.name,
                metres(check.explicit_sum),
                metres(check.deck_width),
                metres(check.overrun)
            );
            drawing.label(Layer::Warning, Point2::new(top_edge, z + self.label_offset), message.clone());
            drawing.warnings.push(message);
        }
    }
}

fn offends_at(check: &ZoneCheck, section_index: usize) -> bool {
    check.offending_sections.contains(&section_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryBuilder;
    use crate::load_zones::{LoadZone, LoadZoneValidator};
    use crate::reinforcement::{reconcile, BarSet, ReinforcementZoneMapper, ZoneId};
    use crate::segments::BridgeSegment;

    struct Fixture {
        table: SegmentTable,
        index: CrossSectionIndex,
        geometry: DeckGeometry,
        report: LoadZoneReport,
        layout: ReinforcementLayout,
        view: ViewSettings,
    }

    impl Fixture {
        fn new(pedestrian_width: f64, view: ViewSettings) -> Self {
            // 30 m wide deck, two spans
            let table = SegmentTable::new(vec![
                BridgeSegment::first(5.0, 20.0, 5.0, 0.8, 1.0),
                BridgeSegment::next(5.0, 20.0, 5.0, 0.8, 1.0, 10.0),
                BridgeSegment::next(5.0, 20.0, 5.0, 0.8, 1.0, 12.0),
            ]);
            let index = CrossSectionIndex::build(&table).unwrap();
            let geometry = GeometryBuilder::new().build(&table, &view, None).unwrap();
            let zones = vec![
                LoadZone::uniform(LoadZoneType::Pedestrian, pedestrian_width, 3),
                LoadZone::uniform(LoadZoneType::Cyclist, 3.0, 3),
                LoadZone::uniform(LoadZoneType::Verge, 0.5, 3),
                LoadZone::uniform(LoadZoneType::Vehicle, 10.5, 3),
            ];
            let report = LoadZoneValidator::default().validate(&zones, &index).unwrap();
            let mut rebar = reconcile(&[], table.len());
            rebar[1].longitudinal_bottom = BarSet::new(40.0, 150.0).with_bend_radius(60.0);
            let layout = ReinforcementZoneMapper::default().map(&rebar, &table).unwrap();
            Fixture {
                table,
                index,
                geometry,
                report,
                layout,
                view,
            }
        }

        fn input(&self) -> ProjectionInput<'_> {
            ProjectionInput {
                table: &self.table,
                index: &self.index,
                geometry: &self.geometry,
                load_zones: &self.report,
                reinforcement: &self.layout,
                view: &self.view,
            }
        }
    }

    #[test]
    fn test_metres_format() {
        assert_eq!(metres(10.0), "10");
        assert_eq!(metres(12.5), "12.5");
        assert_eq!(metres(0.3333), "0.33");
        assert_eq!(metres(-0.0001), "0");
    }

    #[test]
    fn test_plan_labels() {
        let fixture = Fixture::new(1.5, ViewSettings::default());
        let plan = ViewProjector::default().plan(&fixture.input());

        assert_eq!(plan.label_texts(Layer::CrossSection), vec!["D1", "D2", "D3"]);
        let dims = plan.label_texts(Layer::Dimension);
        assert!(dims.contains(&"l = 10m"));
        assert!(dims.contains(&"l = 12m"));
        assert!(dims.contains(&"bz2 = 20m"));
        assert_eq!(
            plan.label_texts(Layer::ZoneNumber),
            vec!["1-1", "2-1", "3-1", "1-2", "2-2", "3-2"]
        );
        assert_eq!(plan.polylines_on(Layer::Outline).count(), 6);
        assert!(plan.warnings.is_empty());
        assert!(plan.highlighted().is_empty());
    }

    #[test]
    fn test_plan_load_zone_bands() {
        let fixture = Fixture::new(1.5, ViewSettings::default());
        let plan = ViewProjector::default().plan(&fixture.input());

        let bands: Vec<&Polyline> = plan.polylines_on(Layer::LoadZone).collect();
        assert_eq!(bands.len(), 4);
        // pedestrian band starts at the zone 1 edge (y = 15)
        assert!((bands[0].points[0].y - 15.0).abs() < 1e-9);
        assert!((bands[0].points.last().unwrap().y - 13.5).abs() < 1e-9);
        // the vehicle band reaches the zone 3 edge
        assert!(bands[3].points.iter().any(|p| (p.y + 15.0).abs() < 1e-9));
        assert_eq!(bands[0].style, Style::load_zone(LoadZoneType::Pedestrian));
        assert!(plan.label_texts(Layer::LoadZone).contains(&"Cyclists"));
    }

    #[test]
    fn test_overflow_is_highlighted_and_annotated() {
        let fixture = Fixture::new(28.0, ViewSettings::default());
        let plan = ViewProjector::default().plan(&fixture.input());

        let highlighted = plan.highlighted();
        assert!(!highlighted.is_empty());
        assert!(highlighted.iter().any(|p| p.tag.as_deref() == Some("load_zones[1]")));
        assert!(highlighted.iter().all(|p| p.tag.as_deref() != Some("load_zones[0]")));

        assert_eq!(plan.warnings.len(), 3);
        assert!(plan.warnings[0].starts_with("At D1: total zone width (31.5m) exceeds deck width (30m)"));
        assert!(plan.markers_of(MarkerKind::Warning).count() >= 3);
    }

    #[test]
    fn test_longitudinal_view() {
        let fixture = Fixture::new(1.5, ViewSettings::default());
        let drawing = ViewProjector::default().longitudinal(&fixture.input());

        assert_eq!(drawing.polylines_on(Layer::Outline).count(), 2);
        let dims = drawing.label_texts(Layer::Dimension);
        assert_eq!(dims.iter().filter(|t| **t == "h = 1m").count(), 3);
        assert!(dims.contains(&"l = 12m"));
        assert_eq!(drawing.label_texts(Layer::CrossSection), vec!["D1", "D2", "D3"]);
        assert!(drawing.polylines_on(Layer::Reinforcement).count() >= 4);
    }

    #[test]
    fn test_longitudinal_outside_deck() {
        let view = ViewSettings {
            longitudinal_section_y: 40.0,
            ..Default::default()
        };
        let fixture = Fixture::new(1.5, view);
        let drawing = ViewProjector::default().longitudinal(&fixture.input());
        assert!(drawing.polylines.is_empty());
        assert_eq!(drawing.warnings.len(), 1);
    }

    #[test]
    fn test_cross_view_with_bend_warning() {
        let fixture = Fixture::new(1.5, ViewSettings::default());
        let drawing = ViewProjector::default().cross(&fixture.input());

        assert_eq!(drawing.title, "Cross-section D1");
        assert_eq!(drawing.label_texts(Layer::ZoneNumber), vec!["1-1", "2-1", "3-1"]);
        let dims = drawing.label_texts(Layer::Dimension);
        assert!(dims.contains(&"b = 20m"));
        assert!(dims.contains(&"h = 0.8m"));

        assert!(drawing.markers_of(MarkerKind::Bar).count() > 0);
        let zone_2_1 = ZoneId::new(ZoneLocation::Zone2, 1).to_string();
        let highlighted = drawing.highlighted();
        assert_eq!(highlighted.len(), 1);
        assert_eq!(highlighted[0].tag.as_deref(), Some(zone_2_1.as_str()));
        assert!(drawing.warnings.iter().any(|w| w.starts_with("Zone 2-1:")));
        assert!(drawing.label_texts(Layer::LoadZone).contains(&"Vehicles 25m"));
    }

    #[test]
    fn test_cross_view_between_sections() {
        let view = ViewSettings {
            cross_section_x: 15.0,
            ..Default::default()
        };
        let fixture = Fixture::new(1.5, view);
        let drawing = ViewProjector::default().cross(&fixture.input());
        assert_eq!(drawing.title, "Cross-section at x = 15m");
        assert_eq!(drawing.label_texts(Layer::ZoneNumber), vec!["1-2", "2-2", "3-2"]);
        assert!(drawing.polylines_on(Layer::LoadZone).next().is_none());
    }

    #[test]
    fn test_horizontal_section_in_plan() {
        let view = ViewSettings {
            horizontal_section_z: Some(0.1),
            ..Default::default()
        };
        let fixture = Fixture::new(1.5, view);
        let plan = ViewProjector::default().plan(&fixture.input());
        // only zone 2 rises above z = 0
        let cuts: Vec<&Polyline> = plan.polylines_on(Layer::Section).collect();
        assert_eq!(cuts.len(), 2);
        assert!(cuts.iter().all(|p| p.tag.as_deref().is_some_and(|t| t.starts_with("2-"))));
        assert!(plan.title.contains("z = 0.1m"));
    }

    #[test]
    fn test_projection_is_deterministic() {
        let fixture = Fixture::new(28.0, ViewSettings::default());
        let projector = ViewProjector::default();
        assert_eq!(projector.project(&fixture.input()), projector.project(&fixture.input()));
    }
}
