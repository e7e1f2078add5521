// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Triangle soup ray target.

use nalgebra::Point3;

use roomscan_core::{ray_triangle, Aabb, MeshBuffers, Ray, RayTarget};

use crate::error::Result;

/// Triangles of one source mesh behind a bounding-box prefilter.
#[derive(Debug, Clone)]
struct ColliderPart {
    bounds: Aabb,
    triangles: Vec<[Point3<f64>; 3]>,
}

/// Double-sided triangle collider built from one or more meshes.
///
/// The same collider type serves scanned physical meshes and authored
/// reference boundaries, so both are probed identically.
#[derive(Debug, Clone, Default)]
pub struct TriangleCollider {
    parts: Vec<ColliderPart>,
}

impl TriangleCollider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_meshes<'a, I>(meshes: I) -> Self
    where
        I: IntoIterator<Item = &'a MeshBuffers>,
    {
        let mut collider = Self::new();
        for mesh in meshes {
            if let Err(err) = collider.add_mesh(mesh) {
                tracing::warn!(error = %err, "Skipping malformed mesh");
            }
        }
        collider
    }

    /// Adds a mesh. Empty meshes are ignored, malformed ones rejected.
    pub fn add_mesh(&mut self, mesh: &MeshBuffers) -> Result<()> {
        mesh.validate()?;
        let Some(bounds) = mesh.bounds() else {
            return Ok(());
        };
        let triangles: Vec<_> = mesh.triangle_points().collect();
        if !triangles.is_empty() {
            self.parts.push(ColliderPart { bounds, triangles });
        }
        Ok(())
    }

    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|p| p.triangles.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Bounds of everything in the collider.
    pub fn bounds(&self) -> Option<Aabb> {
        self.parts
            .iter()
            .map(|p| p.bounds)
            .reduce(|a, b| a.merged(&b))
    }
}

impl RayTarget for TriangleCollider {
    fn cast_ray(&self, ray: &Ray, max_distance: f64) -> Option<f64> {
        let mut nearest: Option<f64> = None;
        for part in &self.parts {
            let Some(entry) = part.bounds.cast_ray(ray, max_distance) else {
                continue;
            };
            if nearest.is_some_and(|n| entry > n) {
                continue;
            }
            for [a, b, c] in &part.triangles {
                if let Some(t) = ray_triangle(ray, a, b, c) {
                    if t <= max_distance && nearest.map_or(true, |n| t < n) {
                        nearest = Some(t);
                    }
                }
            }
        }
        nearest
    }
}
