//! Section planes and the 2D silhouettes cut from the deck solid.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::reinforcement::ZoneId;

/// A plane through the deck, in reference-axis coordinates.
///
/// The 2D axes of the resulting silhouettes are (x, y) for plan and
/// horizontal cuts, (x, z) for longitudinal cuts and (y, z) for cross cuts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plane", rename_all = "snake_case")]
pub enum SectionPlane {
    /// Projection of the deck seen from above
    Plan,
    /// Horizontal cut at height `z`
    Horizontal { z: f64 },
    /// Vertical cut along the bridge at transverse offset `y`
    Longitudinal { y: f64 },
    /// Vertical cut across the bridge at longitudinal position `x`
    Cross { x: f64 },
}

impl SectionPlane {
    /// Names of the horizontal and vertical drawing axes
    pub fn axes(&self) -> (&'static str, &'static str) {
        match self {
            SectionPlane::Plan | SectionPlane::Horizontal { .. } => ("x", "y"),
            SectionPlane::Longitudinal { .. } => ("x", "z"),
            SectionPlane::Cross { .. } => ("y", "z"),
        }
    }
}

/// Closed outline of one zone block in a section plane, counter-clockwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Silhouette {
    pub zone: ZoneId,
    pub outline: Vec<Point2<f64>>,
}

impl Silhouette {
    /// Enclosed area by the shoelace formula
    pub fn area(&self) -> f64 {
        let n = self.outline.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let a = self.outline[i];
                let b = self.outline[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice.abs() / 2.0
    }

    /// Lower-left and upper-right corners of the outline
    pub fn extent(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let first = *self.outline.first()?;
        Some(self.outline.iter().fold((first, first), |(lo, hi), p| {
            (
                Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }

    /// Centroid of the outline vertices, used to anchor labels
    pub fn anchor(&self) -> Option<Point2<f64>> {
        if self.outline.is_empty() {
            return None;
        }
        let n = self.outline.len() as f64;
        let (sx, sy) = self.outline.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point2::new(sx / n, sy / n))
    }
}

/// View-control scalars: where the section planes are placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Transverse offset of the longitudinal section (m)
    pub longitudinal_section_y: f64,

    /// Longitudinal position of the cross-section view (m)
    pub cross_section_x: f64,

    /// Height of an optional horizontal cut (m)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_section_z: Option<f64>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        ViewSettings {
            longitudinal_section_y: 0.0,
            cross_section_x: 0.0,
            horizontal_section_z: None,
        }
    }
}

impl ViewSettings {
    /// The planes to cut, plan first
    pub fn planes(&self) -> Vec<SectionPlane> {
        let mut planes = vec![
            SectionPlane::Plan,
            SectionPlane::Longitudinal {
                y: self.longitudinal_section_y,
            },
            SectionPlane::Cross {
                x: self.cross_section_x,
            },
        ];
        if let Some(z) = self.horizontal_section_z {
            planes.push(SectionPlane::Horizontal { z });
        }
        planes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::ZoneLocation;

    #[test]
    fn test_silhouette_area_and_extent() {
        let silhouette = Silhouette {
            zone: ZoneId::new(ZoneLocation::Zone2, 1),
            outline: vec![
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 2.0),
                Point2::new(0.0, 2.0),
            ],
        };
        assert!((silhouette.area() - 8.0).abs() < 1e-12);
        let (lo, hi) = silhouette.extent().unwrap();
        assert_eq!((lo.x, hi.y), (0.0, 2.0));
        let anchor = silhouette.anchor().unwrap();
        assert!((anchor.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_planes_from_settings() {
        let mut settings = ViewSettings::default();
        assert_eq!(settings.planes().len(), 3);
        settings.horizontal_section_z = Some(-0.4);
        assert_eq!(settings.planes().last(), Some(&SectionPlane::Horizontal { z: -0.4 }));
    }

    #[test]
    fn test_plane_serialization() {
        let json = serde_json::to_string(&SectionPlane::Cross { x: 10.0 }).unwrap();
        assert!(json.contains("\"plane\":\"cross\""));
        let settings: ViewSettings = serde_json::from_str("{\"cross_section_x\": 5.0}").unwrap();
        assert_eq!(settings.cross_section_x, 5.0);
        assert_eq!(settings.longitudinal_section_y, 0.0);
    }
}
