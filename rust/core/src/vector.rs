// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Angular and fuzzy vector predicates.

use nalgebra::{Point3, Rotation3, Vector3};

/// Default angular tolerance in degrees for orientation comparisons.
pub const DEFAULT_ANGLE_EPSILON_DEG: f64 = 2.0;

/// Vectors shorter than this cannot be normalized.
const NORMALIZE_EPSILON: f64 = 1e-12;

/// World up direction.
#[inline]
pub fn up() -> Vector3<f64> {
    Vector3::y()
}

/// Angle between two directions in degrees, or `None` if either is
/// (numerically) the zero vector.
pub fn angle_between_deg(a: &Vector3<f64>, b: &Vector3<f64>) -> Option<f64> {
    let a = a.try_normalize(NORMALIZE_EPSILON)?;
    let b = b.try_normalize(NORMALIZE_EPSILON)?;
    // exactly 0 for parallel inputs
    Some(a.cross(&b).norm().atan2(a.dot(&b)).to_degrees())
}

/// True iff the angle between normalized `a` and `b` is at most `max_angle_deg`.
///
/// Directional: `a` and `-a` are not orientation-equal. Zero vectors are
/// never orientation-equal to anything.
#[inline]
pub fn orientation_equal(a: &Vector3<f64>, b: &Vector3<f64>, max_angle_deg: f64) -> bool {
    angle_between_deg(a, b).is_some_and(|angle| angle <= max_angle_deg)
}

/// Like [`orientation_equal`] but also accepts `b` pointing the opposite way.
///
/// Only for "parallel, either sense" checks. Floor/ceiling/wall classification
/// and opposite-wall search must use the directional form.
#[inline]
pub fn parallel_either_sense(a: &Vector3<f64>, b: &Vector3<f64>, max_angle_deg: f64) -> bool {
    orientation_equal(a, b, max_angle_deg) || orientation_equal(a, &-b, max_angle_deg)
}

/// Squared-distance fuzzy equality for points.
#[inline]
pub fn fuzzy_equals(a: &Point3<f64>, b: &Point3<f64>, epsilon: f64) -> bool {
    (a - b).norm_squared() < epsilon
}

/// Projection of `v` onto the horizontal (XZ) plane.
#[inline]
pub fn horizontal(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.x, 0.0, v.z)
}

/// True if `normal` lies within `max_angle_deg` of its own horizontal projection.
#[inline]
pub fn is_horizontal(normal: &Vector3<f64>, max_angle_deg: f64) -> bool {
    orientation_equal(&horizontal(normal), normal, max_angle_deg)
}

/// Rotates `v` by `angle_deg` about the world up axis.
pub fn rotate_about_up(v: &Vector3<f64>, angle_deg: f64) -> Vector3<f64> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), angle_deg.to_radians()) * v
}
