// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Oriented surface samples.

use std::hash::{Hash, Hasher};

use nalgebra::{Point3, Vector3};

use crate::quantize::{QuantizedPoint, DEFAULT_QUANTUM};

/// One surface sample: a vertex position and its outward normal.
///
/// Also used as the representative (origin, mean normal) pair of a plane
/// cluster. Equality and hashing go through the millimetre grid so that
/// near-duplicate samples collapse inside hash sets.
#[derive(Debug, Clone, Copy)]
pub struct Line {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Line {
    /// Creates a sample. The direction is stored normalized when it has length.
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        let direction = direction.try_normalize(1e-12).unwrap_or(direction);
        Self { origin, direction }
    }

    /// Point at parameter `t` along the direction.
    #[inline]
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// Quantized identity of this sample.
    #[inline]
    pub fn key(&self) -> (QuantizedPoint, QuantizedPoint) {
        (
            QuantizedPoint::from_point(&self.origin, DEFAULT_QUANTUM),
            QuantizedPoint::from_vector(&self.direction, DEFAULT_QUANTUM),
        )
    }
}

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Line {}

impl Hash for Line {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn direction_is_normalized() {
        let line = Line::new(Point3::origin(), Vector3::new(0.0, 3.0, 4.0));
        assert!((line.direction.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn near_duplicates_collapse_in_sets() {
        let mut set = HashSet::new();
        set.insert(Line::new(Point3::new(1.0, 0.0, 0.0), Vector3::y()));
        set.insert(Line::new(Point3::new(1.0001, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0001)));
        set.insert(Line::new(Point3::new(1.5, 0.0, 0.0), Vector3::y()));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn point_along_line() {
        let line = Line::new(Point3::new(1.0, 1.0, 1.0), Vector3::x());
        assert_eq!(line.point_at(2.0), Point3::new(3.0, 1.0, 1.0));
    }
}
