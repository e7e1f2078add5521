// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Running-mean plane clusters.

use nalgebra::{Point3, Vector3};

use roomscan_core::{horizontal, orientation_equal, up, Line, PlaneSurface, Result};

use crate::cluster::ClusterConfig;

/// A group of samples believed coplanar.
///
/// `origin` and `normal` are running means over the members. The mean normal
/// is stored as accumulated and only normalized when read.
#[derive(Debug, Clone)]
pub struct Plane {
    origin: Point3<f64>,
    mean_normal: Vector3<f64>,
    members: Vec<Line>,
}

/// Vertical range and horizontal span of a wall cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallExtent {
    pub min_height: f64,
    pub max_height: f64,
    /// Span endpoints along the wall, at the height of the plane origin.
    pub start: Point3<f64>,
    pub end: Point3<f64>,
}

impl WallExtent {
    #[inline]
    pub fn width(&self) -> f64 {
        (self.end - self.start).norm()
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_height - self.min_height
    }
}

impl Plane {
    /// Starts a cluster from one sample.
    pub fn new(seed: Line) -> Self {
        Self {
            origin: seed.origin,
            mean_normal: seed.direction,
            members: vec![seed],
        }
    }

    /// Adds a sample and updates both running means.
    pub fn add(&mut self, sample: Line) {
        self.members.push(sample);
        let count = self.members.len() as f64;
        self.origin += (sample.origin - self.origin) / count;
        self.mean_normal += (sample.direction - self.mean_normal) / count;
    }

    /// Folds another cluster into this one.
    ///
    /// Equivalent to adding its members one by one: the means are combined
    /// weighted by member count.
    pub fn absorb(&mut self, other: Plane) {
        let n = self.members.len() as f64;
        let m = other.members.len() as f64;
        let total = n + m;
        if m == 0.0 {
            return;
        }
        self.origin = Point3::from((self.origin.coords * n + other.origin.coords * m) / total);
        self.mean_normal = (self.mean_normal * n + other.mean_normal * m) / total;
        self.members.extend(other.members);
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn members(&self) -> &[Line] {
        &self.members
    }

    #[inline]
    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// Accumulated mean normal, not normalized.
    #[inline]
    pub fn mean_normal(&self) -> Vector3<f64> {
        self.mean_normal
    }

    /// Unit normal. Falls back to the raw mean if it has collapsed to zero.
    #[inline]
    pub fn normal(&self) -> Vector3<f64> {
        self.mean_normal
            .try_normalize(1e-12)
            .unwrap_or(self.mean_normal)
    }

    /// Origin and unit normal as one sample.
    #[inline]
    pub fn representative(&self) -> Line {
        Line::new(self.origin, self.normal())
    }

    /// Signed distance from the plane through the mean origin.
    #[inline]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.origin).dot(&self.normal())
    }

    /// Membership predicate: orientation-equal and within distance.
    pub fn accepts(&self, sample: &Line, config: &ClusterConfig) -> bool {
        orientation_equal(
            &self.normal(),
            &sample.direction,
            config.max_orientation_difference_deg,
        ) && self.signed_distance(&sample.origin).abs() <= config.max_distance_to_plane
    }

    /// Infinite plane through the mean origin.
    pub fn surface(&self) -> Result<PlaneSurface> {
        PlaneSurface::new(self.origin, self.mean_normal)
    }

    /// Normal projected onto the horizontal plane, normalized.
    ///
    /// `None` for floor/ceiling clusters whose normal has no horizontal part.
    pub fn leveled_normal(&self) -> Option<Vector3<f64>> {
        horizontal(&self.mean_normal).try_normalize(1e-9)
    }

    /// Exactly vertical plane through the mean origin.
    pub fn leveled_surface(&self) -> Result<PlaneSurface> {
        PlaneSurface::new(self.origin, horizontal(&self.mean_normal))
    }

    /// Height range and horizontal span of the members of a wall cluster.
    pub fn wall_extent(&self) -> Option<WallExtent> {
        let normal = self.leveled_normal()?;
        let tangent = up().cross(&normal);

        let mut min_height = f64::INFINITY;
        let mut max_height = f64::NEG_INFINITY;
        let mut min_t = f64::INFINITY;
        let mut max_t = f64::NEG_INFINITY;
        for m in &self.members {
            min_height = min_height.min(m.origin.y);
            max_height = max_height.max(m.origin.y);
            let t = (m.origin - self.origin).dot(&tangent);
            min_t = min_t.min(t);
            max_t = max_t.max(t);
        }

        Some(WallExtent {
            min_height,
            max_height,
            start: self.origin + tangent * min_t,
            end: self.origin + tangent * max_t,
        })
    }
}
