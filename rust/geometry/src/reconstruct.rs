// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room-shape reconstruction from clustered planes.
//!
//! ## Corner order
//!
//! Corners 0..4 lie on the floor, 4..8 on the ceiling directly above them.
//! Corner 0 → 1 runs along one of the two longer walls, the remaining floor
//! corners follow in counter-clockwise order seen from above, i.e. the
//! vertical component of `(c1 − c0) × (c3 − c0)` is non-negative.
//!
//! The frame is right-handed with +Y up. Mirrored into a left-handed frame
//! (Z negated) the same loop reads clockwise from above, with the same
//! non-negative sign test.

use std::cmp::Reverse;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use roomscan_core::{
    intersect_three, is_horizontal, orientation_equal, rotate_about_up, up, PlaneSurface,
    DEFAULT_ANGLE_EPSILON_DEG,
};

use crate::error::{Error, Result};
use crate::plane::Plane;

/// Reconstruction thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// Tolerance for up/down/wall classification and wall pairing.
    pub max_orientation_difference_deg: f64,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            max_orientation_difference_deg: DEFAULT_ANGLE_EPSILON_DEG,
        }
    }
}

/// A reconstructed box-shaped room.
#[derive(Debug, Clone)]
pub struct RoomShape {
    /// (width, height, depth): width is the larger wall-pair distance.
    pub dimensions: Vector3<f64>,
    /// Canonically ordered corners.
    pub corners: [Point3<f64>; 8],
    pub floor_height: f64,
    pub ceiling_height: f64,
    /// Main wall, its opposite, then the two secondary walls.
    pub walls: [Plane; 4],
}

impl RoomShape {
    /// Horizontal unit direction from corner 0 to corner 1 (along a long wall).
    pub fn dominant_direction(&self) -> Option<Vector3<f64>> {
        let d = self.corners[1] - self.corners[0];
        Vector3::new(d.x, 0.0, d.z).try_normalize(1e-9)
    }

    /// Mean of the eight corners.
    pub fn centroid(&self) -> Point3<f64> {
        let sum = self
            .corners
            .iter()
            .fold(Vector3::zeros(), |acc, c| acc + c.coords);
        Point3::from(sum / 8.0)
    }
}

/// Planes classified by orientation.
#[derive(Debug, Default)]
pub struct PlaneClasses<'a> {
    pub floors: Vec<&'a Plane>,
    pub ceilings: Vec<&'a Plane>,
    pub walls: Vec<&'a Plane>,
}

/// Turns clustered planes into a [`RoomShape`].
#[derive(Debug, Clone, Default)]
pub struct RoomReconstructor {
    config: ReconstructionConfig,
}

impl RoomReconstructor {
    pub fn new(config: ReconstructionConfig) -> Self {
        Self { config }
    }

    /// Splits planes into floor, ceiling and wall candidates, keeping the
    /// input order (largest first when coming from the clusterer).
    pub fn classify<'a>(&self, planes: &'a [Plane]) -> PlaneClasses<'a> {
        let angle = self.config.max_orientation_difference_deg;
        let mut classes = PlaneClasses::default();
        for plane in planes {
            let normal = plane.normal();
            if orientation_equal(&normal, &up(), angle) {
                classes.floors.push(plane);
            } else if orientation_equal(&normal, &-up(), angle) {
                classes.ceilings.push(plane);
            } else if is_horizontal(&normal, angle) {
                classes.walls.push(plane);
            }
        }
        classes
    }

    /// Reconstructs the room. Planes should be sorted by member count,
    /// descending.
    pub fn reconstruct(&self, planes: &[Plane]) -> Result<RoomShape> {
        let angle = self.config.max_orientation_difference_deg;
        let classes = self.classify(planes);

        let floor_height = classes
            .floors
            .iter()
            .map(|p| p.origin().y)
            .reduce(f64::min)
            .ok_or(Error::MissingFloor)?;
        let ceiling_height = classes
            .ceilings
            .iter()
            .map(|p| p.origin().y)
            .reduce(f64::max)
            .ok_or(Error::MissingCeiling)?;

        let main = *classes
            .walls
            .iter()
            .min_by_key(|w| Reverse(w.count()))
            .ok_or(Error::NoWalls)?;
        let main_normal = main.normal();

        let facing = |direction: Vector3<f64>| {
            classes
                .walls
                .iter()
                .copied()
                .find(|w| orientation_equal(&w.normal(), &direction, angle))
        };

        let opposite = facing(-main_normal).ok_or(Error::MissingOppositeWall)?;
        let left =
            facing(rotate_about_up(&main_normal, 90.0)).ok_or(Error::MissingSecondaryWall(90.0))?;
        let right =
            facing(rotate_about_up(&main_normal, -90.0)).ok_or(Error::MissingSecondaryWall(-90.0))?;

        let main_pair = pair_distance(main, opposite);
        let secondary_pair = pair_distance(left, right);
        let (width, depth) = if main_pair >= secondary_pair {
            (main_pair, secondary_pair)
        } else {
            (secondary_pair, main_pair)
        };
        let dimensions = Vector3::new(width, ceiling_height - floor_height, depth);

        // Long walls are the pair standing closer together.
        let (long, short) = if main_pair <= secondary_pair {
            ((main, opposite), (left, right))
        } else {
            ((left, right), (main, opposite))
        };

        let floor = PlaneSurface::horizontal(floor_height, true);
        let ceiling = PlaneSurface::horizontal(ceiling_height, false);
        let long_a = long.0.leveled_surface()?;
        let long_b = long.1.leveled_surface()?;
        let short_a = short.0.leveled_surface()?;
        let short_b = short.1.leveled_surface()?;

        let pairs = [
            (&long_a, &short_a),
            (&long_a, &short_b),
            (&long_b, &short_b),
            (&long_b, &short_a),
        ];
        let mut corners = [Point3::origin(); 8];
        for (i, (wall_a, wall_b)) in pairs.iter().enumerate() {
            corners[i] = intersect_three(wall_a, wall_b, &floor)?;
            corners[i + 4] = intersect_three(wall_a, wall_b, &ceiling)?;
        }
        normalize_winding(&mut corners);

        tracing::info!(
            width = dimensions.x,
            height = dimensions.y,
            depth = dimensions.z,
            walls = classes.walls.len(),
            "Reconstructed room shape"
        );

        Ok(RoomShape {
            dimensions,
            corners,
            floor_height,
            ceiling_height,
            walls: [main.clone(), opposite.clone(), left.clone(), right.clone()],
        })
    }
}

/// Distance from the representative point of `b` to the plane of `a`.
fn pair_distance(a: &Plane, b: &Plane) -> f64 {
    a.signed_distance(&b.origin()).abs()
}

/// True when the floor corners already run counter-clockwise seen from above.
pub fn has_canonical_winding(corners: &[Point3<f64>; 8]) -> bool {
    let cross = (corners[1] - corners[0]).cross(&(corners[3] - corners[0]));
    cross.y >= 0.0
}

/// Reverses the winding of both corner loops if needed, keeping corner 0 → 1
/// on a long wall. Returns whether the corners were reordered.
///
/// Swaps 1↔3 and 5↔7, then rotates each group of four right by one.
pub fn normalize_winding(corners: &mut [Point3<f64>; 8]) -> bool {
    if has_canonical_winding(corners) {
        return false;
    }
    corners.swap(1, 3);
    corners.swap(5, 7);
    corners[0..4].rotate_right(1);
    corners[4..8].rotate_right(1);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use roomscan_core::Line;

    fn plane(p: [f64; 3], n: [f64; 3], count: usize) -> Plane {
        let sample = Line::new(Point3::new(p[0], p[1], p[2]), Vector3::new(n[0], n[1], n[2]));
        let mut plane = Plane::new(sample);
        for _ in 1..count {
            plane.add(sample);
        }
        plane
    }

    /// Room spanning x ∈ [0, 4], y ∈ [0, 3], z ∈ [0, 3] with inward normals.
    fn box_planes() -> Vec<Plane> {
        vec![
            plane([2.0, 0.0, 1.5], [0.0, 1.0, 0.0], 20),
            plane([2.0, 3.0, 1.5], [0.0, -1.0, 0.0], 18),
            plane([0.0, 1.5, 1.5], [1.0, 0.0, 0.0], 12),
            plane([4.0, 1.5, 1.5], [-1.0, 0.0, 0.0], 11),
            plane([2.0, 1.5, 0.0], [0.0, 0.0, 1.0], 10),
            plane([2.0, 1.5, 3.0], [0.0, 0.0, -1.0], 9),
        ]
    }

    #[test]
    fn six_plane_box() {
        let shape = RoomReconstructor::default().reconstruct(&box_planes()).unwrap();
        assert_relative_eq!(shape.dimensions, Vector3::new(4.0, 3.0, 3.0), epsilon = 1e-9);
        assert_relative_eq!(shape.floor_height, 0.0);
        assert_relative_eq!(shape.ceiling_height, 3.0);

        // floor corners first, ceiling corners above them
        for i in 0..4 {
            assert_relative_eq!(shape.corners[i].y, 0.0, epsilon = 1e-9);
            assert_relative_eq!(shape.corners[i + 4].y, 3.0, epsilon = 1e-9);
            assert_relative_eq!(shape.corners[i].x, shape.corners[i + 4].x, epsilon = 1e-9);
            assert_relative_eq!(shape.corners[i].z, shape.corners[i + 4].z, epsilon = 1e-9);
        }

        // corner 0 -> 1 runs along a long (4 m) wall
        assert_relative_eq!((shape.corners[1] - shape.corners[0]).norm(), 4.0, epsilon = 1e-9);
        assert_relative_eq!((shape.corners[3] - shape.corners[0]).norm(), 3.0, epsilon = 1e-9);
        assert!(has_canonical_winding(&shape.corners));

        let dominant = shape.dominant_direction().unwrap();
        assert_relative_eq!(dominant.x.abs(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(shape.centroid(), Point3::new(2.0, 1.5, 1.5), epsilon = 1e-9);
    }

    #[test]
    fn secondary_walls_as_main_pair() {
        // Make the short-spaced pair the most populated.
        let mut planes = box_planes();
        planes[4] = plane([2.0, 1.5, 0.0], [0.0, 0.0, 1.0], 30);
        let shape = RoomReconstructor::default().reconstruct(&planes).unwrap();
        assert_relative_eq!(shape.dimensions, Vector3::new(4.0, 3.0, 3.0), epsilon = 1e-9);
        assert_relative_eq!((shape.corners[1] - shape.corners[0]).norm(), 4.0, epsilon = 1e-9);
        assert!(has_canonical_winding(&shape.corners));
    }

    #[test]
    fn missing_opposite_wall_is_fatal() {
        let mut planes = box_planes();
        planes.remove(3);
        let err = RoomReconstructor::default().reconstruct(&planes).unwrap_err();
        assert!(matches!(err, Error::MissingOppositeWall));
    }

    #[test]
    fn missing_secondary_wall_is_fatal() {
        let mut planes = box_planes();
        planes.remove(5);
        let err = RoomReconstructor::default().reconstruct(&planes).unwrap_err();
        assert!(matches!(err, Error::MissingSecondaryWall(_)));
    }

    #[test]
    fn missing_floor_or_ceiling_is_fatal() {
        let planes = box_planes();
        assert!(matches!(
            RoomReconstructor::default().reconstruct(&planes[1..]),
            Err(Error::MissingFloor)
        ));
        let without_ceiling: Vec<Plane> = planes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 1)
            .map(|(_, p)| p.clone())
            .collect();
        assert!(matches!(
            RoomReconstructor::default().reconstruct(&without_ceiling),
            Err(Error::MissingCeiling)
        ));
        assert!(matches!(
            RoomReconstructor::default().reconstruct(&planes[..2]),
            Err(Error::NoWalls)
        ));
    }

    #[test]
    fn extreme_heights_are_used() {
        let mut planes = box_planes();
        planes.push(plane([1.0, 0.8, 1.0], [0.0, 1.0, 0.0], 5)); // table top
        planes.push(plane([1.0, 2.2, 1.0], [0.0, -1.0, 0.0], 4)); // shelf underside
        let shape = RoomReconstructor::default().reconstruct(&planes).unwrap();
        assert_relative_eq!(shape.dimensions.y, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn classify_buckets() {
        let mut planes = box_planes();
        planes.push(plane([0.0, 0.0, 0.0], [1.0, 1.0, 0.0], 3));
        let reconstructor = RoomReconstructor::default();
        let classes = reconstructor.classify(&planes);
        assert_eq!(classes.floors.len(), 1);
        assert_eq!(classes.ceilings.len(), 1);
        assert_eq!(classes.walls.len(), 4);
    }

    #[test]
    fn counter_clockwise_from_above_is_canonical() {
        // +X then -Z: a left turn seen from +Y
        let floor = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, -3.0),
            Point3::new(0.0, 0.0, -3.0),
        ];
        let mut corners = [Point3::origin(); 8];
        for (i, c) in floor.iter().enumerate() {
            corners[i] = *c;
            corners[i + 4] = c + Vector3::new(0.0, 3.0, 0.0);
        }
        assert!(has_canonical_winding(&corners));

        let mirrored = corners.map(|c| Point3::new(c.x, c.y, -c.z));
        assert!(!has_canonical_winding(&mirrored));
    }

    #[test]
    fn winding_normalization_is_idempotent() {
        let clockwise = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(0.0, 3.0, 0.0),
            Point3::new(4.0, 3.0, 0.0),
            Point3::new(4.0, 3.0, 3.0),
            Point3::new(0.0, 3.0, 3.0),
        ];
        assert!(!has_canonical_winding(&clockwise));

        let mut corners = clockwise;
        assert!(normalize_winding(&mut corners));
        assert!(has_canonical_winding(&corners));
        // still starts on the long wall, just walked the other way
        assert_eq!(corners[0], clockwise[1]);
        assert_eq!(corners[1], clockwise[0]);
        assert_eq!(corners[4], clockwise[5]);

        let once = corners;
        assert!(!normalize_winding(&mut corners));
        assert_eq!(corners, once);
    }

    #[test]
    fn parallel_walls_fail_intersection() {
        let a = plane([0.0, 1.5, 1.5], [1.0, 0.0, 0.0], 1).leveled_surface().unwrap();
        let b = plane([4.0, 1.5, 1.5], [-1.0, 0.0, 0.0], 1).leveled_surface().unwrap();
        let err: Error = a.intersect_plane(&b).unwrap_err().into();
        assert!(matches!(err, Error::Geometry(roomscan_core::Error::ParallelPlanes)));
    }
}
