// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Baked surface mesh buffers

use nalgebra::{Isometry3, Point3, Vector3};

use crate::error::{Error, Result};
use crate::line::Line;
use crate::ray::Aabb;

/// Triangle mesh as delivered by the sensing layer.
///
/// Flat buffers: positions and normals are `(x, y, z)` triples, indices are
/// `(i0, i1, i2)` triples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz), may be empty until recalculated
    pub normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Add a vertex with normal, returning its index
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, normal: Vector3<f64>) -> u32 {
        let index = self.vertex_count() as u32;
        self.positions
            .extend_from_slice(&[position.x as f32, position.y as f32, position.z as f32]);
        self.normals
            .extend_from_slice(&[normal.x as f32, normal.y as f32, normal.z as f32]);
        index
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.extend_from_slice(&[i0, i1, i2]);
    }

    /// Merge another mesh into this one
    pub fn merge(&mut self, other: &MeshBuffers) {
        if other.is_empty() {
            return;
        }
        let vertex_offset = self.vertex_count() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// True when every vertex carries a normal.
    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.positions.is_empty() && self.normals.len() == self.positions.len()
    }

    /// Checks buffer shapes and index bounds.
    pub fn validate(&self) -> Result<()> {
        if self.positions.len() % 3 != 0 {
            return Err(Error::InvalidMesh(format!(
                "position buffer length {} is not a multiple of 3",
                self.positions.len()
            )));
        }
        if !self.normals.is_empty() && self.normals.len() != self.positions.len() {
            return Err(Error::InvalidMesh(format!(
                "{} normal components for {} position components",
                self.normals.len(),
                self.positions.len()
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(Error::InvalidMesh(format!(
                "index buffer length {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        let count = self.vertex_count() as u32;
        if let Some(&bad) = self.indices.iter().find(|&&i| i >= count) {
            return Err(Error::InvalidMesh(format!(
                "index {bad} out of range for {count} vertices"
            )));
        }
        Ok(())
    }

    /// Vertex position widened to f64.
    #[inline]
    pub fn position(&self, index: usize) -> Point3<f64> {
        let c = &self.positions[index * 3..index * 3 + 3];
        Point3::new(c[0] as f64, c[1] as f64, c[2] as f64)
    }

    /// Vertex normal widened to f64, zero when normals are absent.
    #[inline]
    pub fn normal(&self, index: usize) -> Vector3<f64> {
        match self.normals.get(index * 3..index * 3 + 3) {
            Some(c) => Vector3::new(c[0] as f64, c[1] as f64, c[2] as f64),
            None => Vector3::zeros(),
        }
    }

    /// Iterates triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    /// Iterates triangles as corner positions.
    pub fn triangle_points(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.triangles().map(|[a, b, c]| {
            [
                self.position(a as usize),
                self.position(b as usize),
                self.position(c as usize),
            ]
        })
    }

    /// Recomputes vertex normals as area-weighted sums of adjacent face normals.
    pub fn recalculate_normals(&mut self) {
        let mut accum = vec![Vector3::<f64>::zeros(); self.vertex_count()];
        for [a, b, c] in self.triangles() {
            let (pa, pb, pc) = (
                self.position(a as usize),
                self.position(b as usize),
                self.position(c as usize),
            );
            // Unnormalized cross product is twice the area, which is the weight.
            let face = (pb - pa).cross(&(pc - pa));
            for i in [a, b, c] {
                accum[i as usize] += face;
            }
        }

        self.normals.clear();
        self.normals.reserve(accum.len() * 3);
        for n in accum {
            let n = n.try_normalize(1e-12).unwrap_or_else(Vector3::zeros);
            self.normals
                .extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
        }
    }

    /// Applies a rigid transform to positions and normals in place.
    pub fn transform(&mut self, iso: &Isometry3<f64>) {
        for chunk in self.positions.chunks_exact_mut(3) {
            let p = iso * Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            chunk.copy_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        }
        for chunk in self.normals.chunks_exact_mut(3) {
            let n = iso.rotation * Vector3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            chunk.copy_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
        }
    }

    /// Bounding box of all vertices, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Aabb> {
        let mut iter = (0..self.vertex_count()).map(|i| self.position(i));
        let first = iter.next()?;
        let mut aabb = Aabb::new(first, first);
        for p in iter {
            aabb.expand(&p);
        }
        Some(aabb)
    }

    /// One sample per vertex: position and normalized normal.
    ///
    /// Vertices whose normal has zero length are skipped.
    pub fn vertex_samples(&self) -> Vec<Line> {
        (0..self.vertex_count())
            .filter_map(|i| {
                let n = self.normal(i).try_normalize(1e-12)?;
                Some(Line::new(self.position(i), n))
            })
            .collect()
    }

    /// One sample per non-degenerate triangle: centroid and face normal.
    pub fn face_samples(&self) -> Vec<Line> {
        self.triangle_points()
            .filter_map(|[a, b, c]| {
                let n = (b - a).cross(&(c - a)).try_normalize(1e-12)?;
                let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
                Some(Line::new(centroid, n))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> MeshBuffers {
        // Unit square on the floor, wound so the face normal points up.
        let mut mesh = MeshBuffers::new();
        let n = Vector3::zeros();
        mesh.add_vertex(Point3::new(0.0, 0.0, 0.0), n);
        mesh.add_vertex(Point3::new(0.0, 0.0, 1.0), n);
        mesh.add_vertex(Point3::new(1.0, 0.0, 1.0), n);
        mesh.add_vertex(Point3::new(1.0, 0.0, 0.0), n);
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(0, 2, 3);
        mesh
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = MeshBuffers::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.bounds().is_none());
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut a = quad();
        let b = quad();
        a.merge(&b);
        assert_eq!(a.vertex_count(), 8);
        assert_eq!(a.triangle_count(), 4);
        assert_eq!(&a.indices[6..9], &[4, 5, 6]);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mut mesh = quad();
        mesh.add_triangle(0, 1, 9);
        assert!(matches!(mesh.validate(), Err(Error::InvalidMesh(_))));
    }

    #[test]
    fn test_recalculate_normals_points_up() {
        let mut mesh = quad();
        assert!(mesh.vertex_samples().is_empty());
        mesh.recalculate_normals();
        for i in 0..mesh.vertex_count() {
            assert_relative_eq!(mesh.normal(i), Vector3::y(), epsilon = 1e-6);
        }
        assert_eq!(mesh.vertex_samples().len(), 4);
    }

    #[test]
    fn test_face_samples() {
        let samples = quad().face_samples();
        assert_eq!(samples.len(), 2);
        for s in &samples {
            assert_relative_eq!(s.direction, Vector3::y(), epsilon = 1e-9);
            assert_relative_eq!(s.origin.y, 0.0);
        }
    }

    #[test]
    fn test_transform_moves_positions_and_rotates_normals() {
        let mut mesh = quad();
        mesh.recalculate_normals();
        let iso = Isometry3::new(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::x() * std::f64::consts::PI,
        );
        mesh.transform(&iso);
        let bounds = mesh.bounds().unwrap();
        assert_relative_eq!(bounds.min.y, 2.0, epsilon = 1e-6);
        assert_relative_eq!(mesh.normal(0), -Vector3::y(), epsilon = 1e-6);
    }
}
