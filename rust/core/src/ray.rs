// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rays, bounding boxes and ray/triangle intersection.

use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};

/// A half-line with unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Creates a ray, normalizing `direction`.
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Result<Self> {
        let direction = direction
            .try_normalize(1e-12)
            .ok_or(Error::DegenerateDirection("ray direction has zero length"))?;
        Ok(Self { origin, direction })
    }

    #[inline]
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }
}

/// Anything a ray can be cast against.
pub trait RayTarget {
    /// Distance to the nearest hit within `[0, max_distance]`, if any.
    fn cast_ray(&self, ray: &Ray, max_distance: f64) -> Option<f64>;

    /// True if the ray hits within `max_distance`.
    fn ray_test(&self, ray: &Ray, max_distance: f64) -> bool {
        self.cast_ray(ray, max_distance).is_some()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    /// Creates a box from two corners in any order.
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Tight box around a point set, `None` when empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut aabb = Self {
            min: first,
            max: first,
        };
        for p in iter {
            aabb.expand(p);
        }
        Some(aabb)
    }

    /// Grows the box to include `point`.
    #[inline]
    pub fn expand(&mut self, point: &Point3<f64>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Union of two boxes.
    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    #[inline]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    #[inline]
    pub fn extents(&self) -> Vector3<f64> {
        self.max - self.min
    }

    #[inline]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    /// Slab test. Returns the entry distance, or `0.0` when the origin is
    /// already inside the box.
    pub fn ray_entry(&self, ray: &Ray) -> Option<f64> {
        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            if dir.abs() < 1e-15 {
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let mut t0 = (self.min[axis] - origin) * inv;
            let mut t1 = (self.max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }
}

impl RayTarget for Aabb {
    fn cast_ray(&self, ray: &Ray, max_distance: f64) -> Option<f64> {
        self.ray_entry(ray).filter(|&t| t <= max_distance)
    }
}

/// Barycentric slack so rays through a shared edge hit at least one side.
const EDGE_EPSILON: f64 = 1e-9;

/// Möller–Trumbore ray/triangle intersection.
///
/// Double-sided: hits from either face count. Returns the distance along the
/// ray, only for hits in front of the origin.
pub fn ray_triangle(ray: &Ray, v0: &Point3<f64>, v1: &Point3<f64>, v2: &Point3<f64>) -> Option<f64> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray.direction.cross(&edge2);
    let a = edge1.dot(&h);

    if a.abs() < 1e-12 {
        return None; // ray parallel to triangle
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(&h);

    if !(-EDGE_EPSILON..=1.0 + EDGE_EPSILON).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * ray.direction.dot(&q);

    if v < -EDGE_EPSILON || u + v > 1.0 + EDGE_EPSILON {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t >= 0.0).then_some(t)
}
