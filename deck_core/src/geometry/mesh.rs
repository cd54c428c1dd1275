//! Indexed triangle mesh used for the 3D deck assembly.

use std::collections::HashMap;
use std::f64::consts::PI;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Triangle indices of a hexahedron whose corners are ordered
/// `[x0: (y0,z0), (y1,z0), (y1,z1), (y0,z1), x1: same]`, CCW from outside.
const HEXAHEDRON_FACES: [[u32; 3]; 12] = [
    [0, 3, 2],
    [0, 2, 1],
    [4, 5, 6],
    [4, 6, 7],
    [0, 1, 5],
    [0, 5, 4],
    [3, 7, 6],
    [3, 6, 2],
    [0, 4, 7],
    [0, 7, 3],
    [1, 2, 6],
    [1, 6, 5],
];

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Bounds {
    /// Bounds of a point set, `None` when empty
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Bounds { min: first, max: first };
        for p in iter {
            bounds.min = Point3::new(bounds.min.x.min(p.x), bounds.min.y.min(p.y), bounds.min.z.min(p.z));
            bounds.max = Point3::new(bounds.max.x.max(p.x), bounds.max.y.max(p.y), bounds.max.z.max(p.z));
        }
        Some(bounds)
    }

    /// Edge lengths along x, y and z
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }
}

/// An indexed triangle mesh with counter-clockwise winding seen from outside.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolidMesh {
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<[u32; 3]>,
}

impl SolidMesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed hexahedron from 8 corners in [`HEXAHEDRON_FACES`] order
    pub fn hexahedron(corners: [Point3<f64>; 8]) -> Self {
        SolidMesh {
            vertices: corners.to_vec(),
            faces: HEXAHEDRON_FACES.to_vec(),
        }
    }

    /// Capped cylinder between two points with `sections` facets.
    ///
    /// Returns an empty mesh for a zero-length axis, a non-positive radius or
    /// fewer than 3 sections.
    pub fn cylinder(start: Point3<f64>, end: Point3<f64>, radius: f64, sections: usize) -> Self {
        let axis = end - start;
        let Some(direction) = axis.try_normalize(f64::EPSILON) else {
            return SolidMesh::new();
        };
        if radius <= 0.0 || sections < 3 {
            return SolidMesh::new();
        }

        let reference = if direction.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
        let u = direction.cross(&reference).normalize();
        let v = direction.cross(&u);

        let mut mesh = SolidMesh {
            vertices: Vec::with_capacity(2 * sections + 2),
            faces: Vec::with_capacity(4 * sections),
        };
        for center in [start, end] {
            for i in 0..sections {
                let angle = 2.0 * PI * i as f64 / sections as f64;
                mesh.vertices.push(center + (u * angle.cos() + v * angle.sin()) * radius);
            }
        }

        let n = sections as u32;
        for i in 0..n {
            let curr = i;
            let next_seg = (i + 1) % n;
            let next_ring = i + n;
            let next_both = (i + 1) % n + n;
            mesh.faces.push([curr, next_seg, next_ring]);
            mesh.faces.push([next_seg, next_both, next_ring]);
        }

        let start_center = mesh.vertices.len() as u32;
        mesh.vertices.push(start);
        let end_center = mesh.vertices.len() as u32;
        mesh.vertices.push(end);
        for i in 0..n {
            let next = (i + 1) % n;
            mesh.faces.push([start_center, next, i]);
            mesh.faces.push([end_center, i + n, next + n]);
        }
        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Append another mesh, offsetting its face indices.
    pub fn merge(&mut self, other: &SolidMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.faces
            .extend(other.faces.iter().map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]));
    }

    /// Translate every vertex.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for vertex in &mut self.vertices {
            *vertex += offset;
        }
    }

    /// Signed volume by the divergence theorem; positive for outward winding.
    pub fn signed_volume(&self) -> f64 {
        self.faces
            .iter()
            .map(|&[a, b, c]| {
                let v0 = self.vertices[a as usize].coords;
                let v1 = self.vertices[b as usize].coords;
                let v2 = self.vertices[c as usize].coords;
                v0.dot(&v1.cross(&v2))
            })
            .sum::<f64>()
            / 6.0
    }

    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.vertices)
    }

    /// True when every directed edge is matched by exactly one opposite edge,
    /// i.e. every shell in the mesh is closed and consistently wound.
    pub fn is_closed(&self) -> bool {
        let mut edges: HashMap<(u32, u32), i32> = HashMap::new();
        for face in &self.faces {
            for k in 0..3 {
                let (a, b) = (face[k], face[(k + 1) % 3]);
                *edges.entry((a, b)).or_insert(0) += 1;
            }
        }
        edges
            .iter()
            .all(|(&(a, b), &count)| count == 1 && edges.get(&(b, a)) == Some(&1))
    }
}
