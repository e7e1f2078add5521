// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Physical and reference rooms.
//!
//! Both kinds expose the same capability, [`RoomBoundary`]: canonically
//! ordered corners, dimensions and a ray test against the boundary. The
//! footprint probe only ever sees that trait.

use nalgebra::{Point3, Vector3};

use roomscan_core::shapes::box_walls;
use roomscan_core::{MeshBuffers, Ray, RayTarget};
use roomscan_geometry::{normalize_winding, RoomShape};

use crate::collider::TriangleCollider;
use crate::error::Result;
use crate::footprint::{Footprint, FootprintProbe};

/// Something a footprint can be probed from.
pub trait RoomBoundary {
    /// Eight corners: four floor corners starting along a long wall, then the
    /// four ceiling corners above them.
    fn corners(&self) -> &[Point3<f64>; 8];

    /// (width, height, depth)
    fn dimensions(&self) -> Vector3<f64>;

    /// True if the ray hits the boundary within `max_distance`.
    fn ray_test(&self, ray: &Ray, max_distance: f64) -> bool;
}

/// A room reconstructed from the scan, probed against the scanned meshes.
#[derive(Debug, Clone)]
pub struct PhysicalRoom {
    corners: [Point3<f64>; 8],
    dimensions: Vector3<f64>,
    collider: TriangleCollider,
}

impl PhysicalRoom {
    pub fn new<'a, I>(shape: &RoomShape, meshes: I) -> Self
    where
        I: IntoIterator<Item = &'a MeshBuffers>,
    {
        Self::from_parts(shape.corners, shape.dimensions, TriangleCollider::from_meshes(meshes))
    }

    pub fn from_parts(
        corners: [Point3<f64>; 8],
        dimensions: Vector3<f64>,
        collider: TriangleCollider,
    ) -> Self {
        Self {
            corners,
            dimensions,
            collider,
        }
    }
}

impl RoomBoundary for PhysicalRoom {
    fn corners(&self) -> &[Point3<f64>; 8] {
        &self.corners
    }

    fn dimensions(&self) -> Vector3<f64> {
        self.dimensions
    }

    fn ray_test(&self, ray: &Ray, max_distance: f64) -> bool {
        self.collider.ray_test(ray, max_distance)
    }
}

/// A pre-authored room layout with a known wall boundary.
///
/// The layout extends from `origin` towards `-X` (width) and `-Z` (depth),
/// and up by the height.
#[derive(Debug, Clone)]
pub struct ReferenceRoom {
    name: String,
    origin: Point3<f64>,
    corners: [Point3<f64>; 8],
    dimensions: Vector3<f64>,
    boundary: TriangleCollider,
}

impl ReferenceRoom {
    /// Box-shaped reference with four plain walls.
    pub fn new(name: impl Into<String>, origin: Point3<f64>, dimensions: Vector3<f64>) -> Self {
        let min = origin - Vector3::new(dimensions.x, 0.0, dimensions.z);
        let max = origin + Vector3::new(0.0, dimensions.y, 0.0);
        let boundary = TriangleCollider::from_meshes([&box_walls(min, max, 1)]);
        Self {
            name: name.into(),
            origin,
            corners: layout_corners(origin, dimensions),
            dimensions,
            boundary,
        }
    }

    /// Replaces the plain walls with an authored boundary (doors, niches,
    /// furniture against the walls).
    pub fn with_boundary<'a, I>(mut self, meshes: I) -> Self
    where
        I: IntoIterator<Item = &'a MeshBuffers>,
    {
        self.boundary = TriangleCollider::from_meshes(meshes);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }
}

impl RoomBoundary for ReferenceRoom {
    fn corners(&self) -> &[Point3<f64>; 8] {
        &self.corners
    }

    fn dimensions(&self) -> Vector3<f64> {
        self.dimensions
    }

    fn ray_test(&self, ray: &Ray, max_distance: f64) -> bool {
        self.boundary.ray_test(ray, max_distance)
    }
}

/// Corners of an origin-anchored layout in canonical order.
fn layout_corners(origin: Point3<f64>, dimensions: Vector3<f64>) -> [Point3<f64>; 8] {
    let dx = Vector3::new(dimensions.x, 0.0, 0.0);
    let dz = Vector3::new(0.0, 0.0, dimensions.z);
    let dy = Vector3::new(0.0, dimensions.y, 0.0);

    let mut floor = [origin, origin - dx, origin - dx - dz, origin - dz];
    if dimensions.x < dimensions.z {
        // walk the long side first
        floor.swap(1, 3);
    }

    let mut corners = [Point3::origin(); 8];
    for (i, c) in floor.iter().enumerate() {
        corners[i] = *c;
        corners[i + 4] = c + dy;
    }
    normalize_winding(&mut corners);
    corners
}

/// A probed room: dimensions, corners and footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub dimensions: Vector3<f64>,
    pub corners: [Point3<f64>; 8],
    pub footprint: Footprint,
}

impl Room {
    /// Probes a boundary and records the result.
    pub fn scan<B>(boundary: &B, probe: &FootprintProbe) -> Result<Self>
    where
        B: RoomBoundary + ?Sized,
    {
        Ok(Self {
            dimensions: boundary.dimensions(),
            corners: *boundary.corners(),
            footprint: probe.probe(boundary)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use roomscan_geometry::has_canonical_winding;

    #[test]
    fn reference_corners_start_on_long_wall() {
        for dims in [Vector3::new(4.0, 3.0, 3.0), Vector3::new(3.0, 3.0, 5.0)] {
            let room = ReferenceRoom::new("r", Point3::new(1.0, 0.0, 2.0), dims);
            let c = room.corners();
            let long = dims.x.max(dims.z);
            let short = dims.x.min(dims.z);
            assert_relative_eq!((c[1] - c[0]).norm(), long, epsilon = 1e-12);
            assert_relative_eq!((c[3] - c[0]).norm(), short, epsilon = 1e-12);
            assert_relative_eq!((c[5] - c[1]).y, dims.y, epsilon = 1e-12);
            assert!(has_canonical_winding(c));
        }
    }

    #[test]
    fn reference_boundary_is_hit_from_outside() {
        let room = ReferenceRoom::new("r", Point3::origin(), Vector3::new(4.0, 3.0, 3.0));
        // the +Z wall sits at z = 0
        let ray = Ray::new(Point3::new(-2.0, 1.5, 0.2), -Vector3::z()).unwrap();
        assert!(room.ray_test(&ray, 0.4));
        let beside = Ray::new(Point3::new(1.0, 1.5, 0.2), -Vector3::z()).unwrap();
        assert!(!room.ray_test(&beside, 0.4));
    }
}
