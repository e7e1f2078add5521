// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Infinite planes and their intersections.

use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};
use crate::line::Line;

/// Cross products / denominators smaller than this count as parallel.
const PARALLEL_EPSILON: f64 = 1e-9;

/// Infinite plane through `point` with unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneSurface {
    /// Point on the plane
    pub point: Point3<f64>,
    /// Unit normal
    pub normal: Vector3<f64>,
}

impl PlaneSurface {
    /// Create a plane, normalizing `normal`.
    pub fn new(point: Point3<f64>, normal: Vector3<f64>) -> Result<Self> {
        let normal = normal
            .try_normalize(PARALLEL_EPSILON)
            .ok_or(Error::DegenerateDirection("plane normal has zero length"))?;
        Ok(Self { point, normal })
    }

    /// Horizontal plane at height `y` facing `+Y` or `-Y`.
    pub fn horizontal(y: f64, facing_up: bool) -> Self {
        let normal = if facing_up { Vector3::y() } else { -Vector3::y() };
        Self {
            point: Point3::new(0.0, y, 0.0),
            normal,
        }
    }

    /// Signed distance from point to plane.
    /// Positive = in front (normal side), negative = behind.
    #[inline]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.point).dot(&self.normal)
    }

    /// Closest point on the plane.
    #[inline]
    pub fn closest_point(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.normal * self.signed_distance(point)
    }

    /// Intersection of a line with this plane (in either direction along the line).
    pub fn intersect_line(&self, line: &Line) -> Result<Point3<f64>> {
        let denom = self.normal.dot(&line.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return Err(Error::LineParallelToPlane);
        }
        let t = self.normal.dot(&(self.point - line.origin)) / denom;
        Ok(line.point_at(t))
    }

    /// Intersection line of two planes.
    ///
    /// Fails with [`Error::ParallelPlanes`] when the normals are parallel.
    pub fn intersect_plane(&self, other: &PlaneSurface) -> Result<Line> {
        let direction = self.normal.cross(&other.normal);
        if direction.norm() < PARALLEL_EPSILON {
            return Err(Error::ParallelPlanes);
        }

        // Walk inside `other` perpendicular to the line until we reach `self`.
        let in_other = other.normal.cross(&direction);
        let denom = self.normal.dot(&in_other);
        let t = self.normal.dot(&(self.point - other.point)) / denom;
        let origin = other.point + in_other * t;

        Ok(Line::new(origin, direction))
    }
}

/// Point shared by three planes: the line of `a`∩`b` intersected with `c`.
pub fn intersect_three(a: &PlaneSurface, b: &PlaneSurface, c: &PlaneSurface) -> Result<Point3<f64>> {
    let line = a.intersect_plane(b)?;
    c.intersect_line(&line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn plane(p: [f64; 3], n: [f64; 3]) -> PlaneSurface {
        PlaneSurface::new(Point3::new(p[0], p[1], p[2]), Vector3::new(n[0], n[1], n[2])).unwrap()
    }

    #[test]
    fn zero_normal_is_rejected() {
        let err = PlaneSurface::new(Point3::origin(), Vector3::zeros()).unwrap_err();
        assert!(err.is_degeneracy());
    }

    #[test]
    fn signed_distance_sign() {
        let p = plane([0.0, 1.0, 0.0], [0.0, 1.0, 0.0]);
        assert_relative_eq!(p.signed_distance(&Point3::new(5.0, 3.0, 2.0)), 2.0);
        assert_relative_eq!(p.signed_distance(&Point3::new(5.0, -1.0, 2.0)), -2.0);
    }

    #[test]
    fn closest_point_projects() {
        let p = plane([2.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let c = p.closest_point(&Point3::new(7.0, 1.0, -3.0));
        assert_relative_eq!(c, Point3::new(2.0, 1.0, -3.0), epsilon = 1e-12);
    }

    #[test]
    fn parallel_planes_fail() {
        let a = plane([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let b = plane([3.0, 0.0, 0.0], [-1.0, 0.0, 0.0]);
        assert_eq!(a.intersect_plane(&b).unwrap_err(), Error::ParallelPlanes);
    }

    #[test]
    fn two_walls_meet_in_vertical_line() {
        let a = plane([2.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let b = plane([0.0, 0.0, -1.5], [0.0, 0.0, 1.0]);
        let line = a.intersect_plane(&b).unwrap();
        assert_relative_eq!(line.origin.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(line.origin.z, -1.5, epsilon = 1e-12);
        assert_relative_eq!(line.direction.y.abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn three_planes_meet_in_corner() {
        let wall_a = plane([4.0, 0.0, 0.0], [-1.0, 0.0, 0.0]);
        let wall_b = plane([0.0, 0.0, 3.0], [0.0, 0.0, -1.0]);
        let floor = PlaneSurface::horizontal(0.25, true);
        let corner = intersect_three(&wall_a, &wall_b, &floor).unwrap();
        assert_relative_eq!(corner, Point3::new(4.0, 0.25, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn line_parallel_to_plane_fails() {
        let floor = PlaneSurface::horizontal(0.0, true);
        let line = Line::new(Point3::new(0.0, 1.0, 0.0), Vector3::x());
        assert_eq!(floor.intersect_line(&line).unwrap_err(), Error::LineParallelToPlane);
    }

    #[test]
    fn three_planes_with_parallel_pair_fail() {
        let floor = PlaneSurface::horizontal(0.0, true);
        let ceiling = PlaneSurface::horizontal(3.0, false);
        let wall = plane([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        assert!(intersect_three(&floor, &ceiling, &wall).is_err());
        // wall ∩ floor is horizontal, so it never meets the ceiling
        assert_eq!(
            intersect_three(&wall, &floor, &ceiling).unwrap_err(),
            Error::LineParallelToPlane
        );
    }
}
