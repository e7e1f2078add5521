// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Grid quantization of positions and directions.
//!
//! Raw float triples are never hashed. Coordinates are snapped to a cubic grid
//! of side `quantum` and the integer cell becomes the key, so samples that
//! differ only by sensor jitter below the quantum collapse into one key.

use nalgebra::{Point3, Vector3};

/// Default grid resolution: one millimetre.
pub const DEFAULT_QUANTUM: f64 = 1e-3;

/// Integer grid cell of a quantized coordinate triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuantizedPoint {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl QuantizedPoint {
    /// Snaps a point to the grid.
    #[inline]
    pub fn from_point(point: &Point3<f64>, quantum: f64) -> Self {
        Self::from_coords(point.x, point.y, point.z, quantum)
    }

    /// Snaps a direction to the grid (used for sample identity).
    #[inline]
    pub fn from_vector(vector: &Vector3<f64>, quantum: f64) -> Self {
        Self::from_coords(vector.x, vector.y, vector.z, quantum)
    }

    #[inline]
    fn from_coords(x: f64, y: f64, z: f64, quantum: f64) -> Self {
        Self {
            x: (x / quantum).round() as i64,
            y: (y / quantum).round() as i64,
            z: (z / quantum).round() as i64,
        }
    }

    /// Center of the grid cell in world units.
    #[inline]
    pub fn to_point(&self, quantum: f64) -> Point3<f64> {
        Point3::new(
            self.x as f64 * quantum,
            self.y as f64 * quantum,
            self.z as f64 * quantum,
        )
    }
}
