//! Zone blocks: the convex solid occupied by one transverse zone over one span.
//!
//! Within a span every bounding face varies linearly from the start row to
//! the end row, and y only depends on x for the side faces and z only
//! depends on x for the top and bottom faces. Each face is therefore planar
//! and the block is convex, so every plane cut is a single quadrilateral
//! that can be computed in closed form.

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

use super::mesh::SolidMesh;
use crate::reinforcement::ZoneId;
use crate::segments::{BridgeSegment, ZoneLocation};

const EPS: f64 = 1e-9;

/// A value that varies linearly over the span parameter `t ∈ [0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Linear {
    pub start: f64,
    pub end: f64,
}

impl Linear {
    pub fn new(start: f64, end: f64) -> Self {
        Linear { start, end }
    }

    pub fn at(&self, t: f64) -> f64 {
        self.start + (self.end - self.start) * t
    }

    fn negated(self) -> Self {
        Linear::new(-self.start, -self.end)
    }
}

/// Narrow `range` to the parameters where `profile(t) <= level`.
fn clip_below(range: (f64, f64), profile: Linear, level: f64) -> Option<(f64, f64)> {
    let (lo, hi) = range;
    let slope = profile.end - profile.start;
    let (lo, hi) = if slope.abs() < EPS {
        if profile.start > level + EPS {
            return None;
        }
        (lo, hi)
    } else {
        let t = (level - profile.start) / slope;
        if slope > 0.0 {
            (lo, hi.min(t))
        } else {
            (lo.max(t), hi)
        }
    };
    (hi - lo > EPS).then_some((lo, hi))
}

/// Narrow `range` to the parameters where `profile(t) >= level`.
fn clip_above(range: (f64, f64), profile: Linear, level: f64) -> Option<(f64, f64)> {
    clip_below(range, profile.negated(), -level)
}

/// Solid of one zone over one span, in reference-axis coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneBlock {
    /// Zone of the start row that owns this block
    pub zone: ZoneId,

    /// Longitudinal start and end (m)
    pub x: (f64, f64),

    pub y_min: Linear,
    pub y_max: Linear,
    pub z_bottom: Linear,
    pub z_top: Linear,
}

impl ZoneBlock {
    /// Block of `location` between two consecutive rows.
    ///
    /// `segment` is the 1-based number of the start row.
    pub fn between(
        location: ZoneLocation,
        segment: usize,
        start: &BridgeSegment,
        end: &BridgeSegment,
        x: (f64, f64),
    ) -> Self {
        let (y0_min, y0_max) = start.zone_y_range(location);
        let (y1_min, y1_max) = end.zone_y_range(location);
        let (z0_bottom, z0_top) = start.zone_z_range(location);
        let (z1_bottom, z1_top) = end.zone_z_range(location);
        ZoneBlock {
            zone: ZoneId::new(location, segment),
            x,
            y_min: Linear::new(y0_min, y1_min),
            y_max: Linear::new(y0_max, y1_max),
            z_bottom: Linear::new(z0_bottom, z1_bottom),
            z_top: Linear::new(z0_top, z1_top),
        }
    }

    pub fn length(&self) -> f64 {
        self.x.1 - self.x.0
    }

    fn x_at(&self, t: f64) -> f64 {
        self.x.0 + self.length() * t
    }

    /// Span parameter of a longitudinal coordinate, `None` outside the block
    pub fn parameter(&self, x: f64) -> Option<f64> {
        if x < self.x.0 - EPS || x > self.x.1 + EPS || self.length() <= 0.0 {
            return None;
        }
        Some(((x - self.x.0) / self.length()).clamp(0.0, 1.0))
    }

    /// The 8 corners, ordered for [`SolidMesh::hexahedron`]
    pub fn corners(&self) -> [Point3<f64>; 8] {
        let corner = |t: f64, y: Linear, z: Linear| Point3::new(self.x_at(t), y.at(t), z.at(t));
        [
            corner(0.0, self.y_min, self.z_bottom),
            corner(0.0, self.y_max, self.z_bottom),
            corner(0.0, self.y_max, self.z_top),
            corner(0.0, self.y_min, self.z_top),
            corner(1.0, self.y_min, self.z_bottom),
            corner(1.0, self.y_max, self.z_bottom),
            corner(1.0, self.y_max, self.z_top),
            corner(1.0, self.y_min, self.z_top),
        ]
    }

    pub fn mesh(&self) -> SolidMesh {
        SolidMesh::hexahedron(self.corners())
    }

    /// Footprint seen from above, in (x, y)
    pub fn plan_outline(&self) -> Vec<Point2<f64>> {
        vec![
            Point2::new(self.x.0, self.y_min.start),
            Point2::new(self.x.1, self.y_min.end),
            Point2::new(self.x.1, self.y_max.end),
            Point2::new(self.x.0, self.y_max.start),
        ]
    }

    /// Cut by the plane `x = const` at span parameter `t`, in (y, z)
    pub fn cross_section_at(&self, t: f64) -> Vec<Point2<f64>> {
        let (y0, y1) = (self.y_min.at(t), self.y_max.at(t));
        let (z0, z1) = (self.z_bottom.at(t), self.z_top.at(t));
        vec![
            Point2::new(y0, z0),
            Point2::new(y1, z0),
            Point2::new(y1, z1),
            Point2::new(y0, z1),
        ]
    }

    /// Cut by the plane `y = const`, in (x, z)
    pub fn longitudinal_section(&self, y: f64) -> Option<Vec<Point2<f64>>> {
        let range = clip_below((0.0, 1.0), self.y_min, y)?;
        let (ta, tb) = clip_above(range, self.y_max, y)?;
        Some(vec![
            Point2::new(self.x_at(ta), self.z_bottom.at(ta)),
            Point2::new(self.x_at(tb), self.z_bottom.at(tb)),
            Point2::new(self.x_at(tb), self.z_top.at(tb)),
            Point2::new(self.x_at(ta), self.z_top.at(ta)),
        ])
    }

    /// Cut by the plane `z = const`, in (x, y)
    pub fn horizontal_section(&self, z: f64) -> Option<Vec<Point2<f64>>> {
        let range = clip_below((0.0, 1.0), self.z_bottom, z)?;
        let (ta, tb) = clip_above(range, self.z_top, z)?;
        Some(vec![
            Point2::new(self.x_at(ta), self.y_min.at(ta)),
            Point2::new(self.x_at(tb), self.y_min.at(tb)),
            Point2::new(self.x_at(tb), self.y_max.at(tb)),
            Point2::new(self.x_at(ta), self.y_max.at(ta)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tapered_block() -> ZoneBlock {
        // zone 2 narrows from 10 m to 8 m and thins from 1.0 m to 0.8 m
        let start = BridgeSegment::first(2.0, 10.0, 2.0, 0.8, 1.0);
        let end = BridgeSegment::next(2.0, 8.0, 2.0, 0.6, 0.8, 10.0);
        ZoneBlock::between(ZoneLocation::Zone2, 1, &start, &end, (0.0, 10.0))
    }

    #[test]
    fn test_block_mesh_volume() {
        let start = BridgeSegment::first(2.0, 10.0, 2.0, 0.8, 1.0);
        let end = BridgeSegment::next(2.0, 8.0, 2.0, 0.8, 1.0, 10.0);
        let block = ZoneBlock::between(ZoneLocation::Zone2, 1, &start, &end, (0.0, 10.0));
        let mesh = block.mesh();
        assert!(mesh.is_closed());
        // trapezoidal plan, constant thickness
        assert_relative_eq!(mesh.signed_volume(), 10.0 * 9.0 * 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cross_section_interpolates() {
        let block = tapered_block();
        let t = block.parameter(5.0).unwrap();
        let outline = block.cross_section_at(t);
        assert_relative_eq!(outline[0].x, -4.5, epsilon = 1e-12);
        assert_relative_eq!(outline[1].x, 4.5, epsilon = 1e-12);
        assert_relative_eq!(outline[0].y, -0.7, epsilon = 1e-12);
        assert_relative_eq!(outline[2].y, 0.2, epsilon = 1e-12);
        assert!(block.parameter(10.5).is_none());
    }

    #[test]
    fn test_longitudinal_section_clips_to_taper() {
        let block = tapered_block();
        // y = 4.5 is inside the block only for x <= 5
        let outline = block.longitudinal_section(4.5).unwrap();
        assert_relative_eq!(outline[0].x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(outline[1].x, 5.0, epsilon = 1e-9);
        assert!(block.longitudinal_section(6.0).is_none());
    }

    #[test]
    fn test_horizontal_section() {
        let block = tapered_block();
        // top stays at 0.2, bottom rises from -0.8 to -0.6
        let outline = block.horizontal_section(-0.7).unwrap();
        assert_relative_eq!(outline[0].x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(outline[1].x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(outline[2].y, 4.5, epsilon = 1e-9);
        assert!(block.horizontal_section(0.5).is_none());
    }

    #[test]
    fn test_plan_outline() {
        let outline = tapered_block().plan_outline();
        assert_eq!(outline.len(), 4);
        assert_relative_eq!(outline[1].y, -4.0, epsilon = 1e-12);
        assert_relative_eq!(outline[3].y, 5.0, epsilon = 1e-12);
    }
}
