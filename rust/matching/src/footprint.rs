// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary footprints.
//!
//! A footprint is one boolean per probe ray: `sensitivity` rays per wall,
//! walls taken in corner order. Each ray starts just outside the expected wall
//! line at mid height and is cast inwards through it; a hit means the
//! boundary is where the corners say it is.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use roomscan_core::{up, Ray};

use crate::error::{Error, Result};
use crate::room::RoomBoundary;

/// Probe layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Rays per wall.
    pub sensitivity: usize,
    /// Ray length; rays start half of it outside the wall line.
    pub probe_depth: f64,
    /// Distance kept clear of each corner.
    pub corner_inset: f64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            sensitivity: 200,
            probe_depth: 0.4,
            corner_inset: 0.1,
        }
    }
}

/// Boolean occupancy signature of a room boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Footprint(Vec<bool>);

impl Footprint {
    pub fn new(cells: Vec<bool>) -> Self {
        Self(cells)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn cells(&self) -> &[bool] {
        &self.0
    }

    /// Number of probes that hit the boundary.
    pub fn hits(&self) -> usize {
        self.0.iter().filter(|&&c| c).count()
    }

    /// The footprint seen from the opposite corner: shifted by two walls.
    pub fn rotated(&self) -> Footprint {
        let mut cells = self.0.clone();
        let half = cells.len() / 2;
        cells.rotate_left(half);
        Footprint(cells)
    }
}

/// Per-wall probe line, precomputed from the corners.
#[derive(Debug, Clone, Copy)]
struct WallProbe {
    start: Point3<f64>,
    end: Point3<f64>,
    inward: Vector3<f64>,
}

/// Lazy, restartable iterator over all probe rays of a room.
#[derive(Debug, Clone)]
pub struct ProbeRays {
    walls: [WallProbe; 4],
    sensitivity: usize,
    half_depth: f64,
    next: usize,
}

impl Iterator for ProbeRays {
    type Item = Ray;

    fn next(&mut self) -> Option<Ray> {
        if self.next >= 4 * self.sensitivity {
            return None;
        }
        let wall = &self.walls[self.next / self.sensitivity];
        let t = (self.next % self.sensitivity) as f64 / self.sensitivity as f64;
        self.next += 1;

        let on_wall = wall.start + (wall.end - wall.start) * t;
        Some(Ray {
            origin: on_wall - wall.inward * self.half_depth,
            direction: wall.inward,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (4 * self.sensitivity).saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ProbeRays {}

/// Builds footprints by ray-probing a room boundary.
#[derive(Debug, Clone, Default)]
pub struct FootprintProbe {
    config: ProbeConfig,
}

impl FootprintProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Footprint length for this configuration.
    pub fn footprint_len(&self) -> usize {
        4 * self.config.sensitivity
    }

    /// Probe rays for a room with the given corners.
    pub fn rays(&self, corners: &[Point3<f64>; 8]) -> Result<ProbeRays> {
        let ProbeConfig {
            sensitivity,
            probe_depth,
            corner_inset,
        } = self.config;
        if sensitivity == 0 {
            return Err(Error::InvalidProbe("sensitivity must be positive".into()));
        }
        if probe_depth.is_nan() || probe_depth <= 0.0 {
            return Err(Error::InvalidProbe(format!("probe depth {probe_depth} must be positive")));
        }

        let centroid = Point3::from(
            corners
                .iter()
                .fold(Vector3::zeros(), |acc, c| acc + c.coords)
                / 8.0,
        );

        let mut walls = [WallProbe {
            start: Point3::origin(),
            end: Point3::origin(),
            inward: Vector3::zeros(),
        }; 4];
        for (i, wall) in walls.iter_mut().enumerate() {
            let j = (i + 1) % 4;
            let a = nalgebra::center(&corners[i], &corners[i + 4]);
            let b = nalgebra::center(&corners[j], &corners[j + 4]);

            let length = (b - a).norm();
            if length <= 2.0 * corner_inset {
                return Err(Error::WallTooShort {
                    wall: i,
                    length,
                    inset: corner_inset,
                });
            }
            let along = (b - a) / length;

            let mut inward = up()
                .cross(&along)
                .try_normalize(1e-9)
                .ok_or(roomscan_core::Error::DegenerateDirection("vertical wall edge"))?;
            if (centroid - a).dot(&inward) < 0.0 {
                inward = -inward;
            }

            *wall = WallProbe {
                start: a + along * corner_inset,
                end: b - along * corner_inset,
                inward,
            };
        }

        Ok(ProbeRays {
            walls,
            sensitivity,
            half_depth: probe_depth / 2.0,
            next: 0,
        })
    }

    /// Casts every probe ray against the boundary.
    pub fn probe<B>(&self, boundary: &B) -> Result<Footprint>
    where
        B: RoomBoundary + ?Sized,
    {
        let depth = self.config.probe_depth;
        let cells = self
            .rays(boundary.corners())?
            .map(|ray| boundary.ray_test(&ray, depth))
            .collect();
        Ok(Footprint(cells))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::ReferenceRoom;
    use approx::assert_relative_eq;

    fn small_probe() -> FootprintProbe {
        FootprintProbe::new(ProbeConfig {
            sensitivity: 20,
            ..ProbeConfig::default()
        })
    }

    #[test]
    fn footprint_length_is_four_walls() {
        let room = ReferenceRoom::new("r", Point3::origin(), Vector3::new(4.0, 3.0, 3.0));
        for sensitivity in [1, 7, 200] {
            let probe = FootprintProbe::new(ProbeConfig {
                sensitivity,
                ..ProbeConfig::default()
            });
            let footprint = probe.probe(&room).unwrap();
            assert_eq!(footprint.len(), 4 * sensitivity);
            assert_eq!(footprint.len(), probe.footprint_len());
        }
    }

    #[test]
    fn closed_box_is_fully_occupied() {
        let room = ReferenceRoom::new("r", Point3::new(2.0, 0.0, 1.0), Vector3::new(4.0, 3.0, 3.0));
        let footprint = small_probe().probe(&room).unwrap();
        assert_eq!(footprint.hits(), footprint.len());
    }

    #[test]
    fn rays_point_inwards_from_outside() {
        let room = ReferenceRoom::new("r", Point3::origin(), Vector3::new(4.0, 3.0, 3.0));
        let center = Point3::new(-2.0, 1.5, -1.5);
        let rays: Vec<Ray> = small_probe().rays(room.corners()).unwrap().collect();
        assert_eq!(rays.len(), 80);
        for ray in &rays {
            assert!((center - ray.origin).dot(&ray.direction) > 0.0);
            assert_relative_eq!(ray.origin.y, 1.5, epsilon = 1e-12);
        }
        // first ray sits one inset away from corner 0
        let c0 = room.corners()[0];
        let first = rays[0].origin + rays[0].direction * 0.2;
        assert_relative_eq!((first - Point3::new(c0.x, 1.5, c0.z)).norm(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn probe_rays_are_restartable() {
        let room = ReferenceRoom::new("r", Point3::origin(), Vector3::new(4.0, 3.0, 3.0));
        let rays = small_probe().rays(room.corners()).unwrap();
        assert_eq!(rays.len(), 80);
        let first: Vec<Ray> = rays.clone().take(5).collect();
        let again: Vec<Ray> = rays.take(5).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn rotated_twice_is_identity() {
        let cells: Vec<bool> = (0..40).map(|i| i % 3 == 0 || i < 4).collect();
        let footprint = Footprint::new(cells);
        assert_ne!(footprint.rotated(), footprint);
        assert_eq!(footprint.rotated().rotated(), footprint);
        assert_eq!(footprint.rotated().cells()[0], footprint.cells()[20]);
    }

    #[test]
    fn rotated_handles_odd_and_empty_lengths() {
        let footprint = Footprint::new(vec![true, false, false, true, true]);
        assert_eq!(
            footprint.rotated().cells(),
            &[false, true, true, true, false]
        );
        assert_eq!(footprint.rotated().len(), 5);
        assert!(Footprint::new(Vec::new()).rotated().is_empty());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let room = ReferenceRoom::new("r", Point3::origin(), Vector3::new(4.0, 3.0, 3.0));
        let zero = FootprintProbe::new(ProbeConfig {
            sensitivity: 0,
            ..ProbeConfig::default()
        });
        assert!(matches!(zero.probe(&room), Err(Error::InvalidProbe(_))));

        let tiny = ReferenceRoom::new("tiny", Point3::origin(), Vector3::new(0.15, 3.0, 0.1));
        assert!(matches!(
            FootprintProbe::default().probe(&tiny),
            Err(Error::WallTooShort { .. })
        ));
    }
}
