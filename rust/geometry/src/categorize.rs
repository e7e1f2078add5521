// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Orientation buckets for raw samples.

use rustc_hash::FxHashSet;

use roomscan_core::{is_horizontal, orientation_equal, up, Line};

/// Samples bucketed by normal orientation.
///
/// Sets are keyed by the quantized [`Line`] hash, so near-identical samples
/// from overlapping patches are counted once.
#[derive(Debug, Clone, Default)]
pub struct SampleCategories {
    /// Normals within tolerance of up (floor-like).
    pub up: FxHashSet<Line>,
    /// Normals within tolerance of down (ceiling-like).
    pub down: FxHashSet<Line>,
    /// Near-horizontal normals (wall-like).
    pub horizontal: FxHashSet<Line>,
    /// Everything else.
    pub other: FxHashSet<Line>,
}

impl SampleCategories {
    pub fn categorize<I>(samples: I, max_angle_deg: f64) -> Self
    where
        I: IntoIterator<Item = Line>,
    {
        let mut categories = Self::default();
        categories.extend(samples, max_angle_deg);
        categories
    }

    /// Adds more samples, e.g. from the next mesh of a multi-frame pass.
    pub fn extend<I>(&mut self, samples: I, max_angle_deg: f64)
    where
        I: IntoIterator<Item = Line>,
    {
        let up = up();
        let down = -up;
        for sample in samples {
            let bucket = if orientation_equal(&sample.direction, &up, max_angle_deg) {
                &mut self.up
            } else if orientation_equal(&sample.direction, &down, max_angle_deg) {
                &mut self.down
            } else if is_horizontal(&sample.direction, max_angle_deg) {
                &mut self.horizontal
            } else {
                &mut self.other
            };
            bucket.insert(sample);
        }
    }

    pub fn total(&self) -> usize {
        self.up.len() + self.down.len() + self.horizontal.len() + self.other.len()
    }

    /// True when floor, ceiling and wall samples have all been seen.
    pub fn covers_room(&self) -> bool {
        !self.up.is_empty() && !self.down.is_empty() && !self.horizontal.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};
    use roomscan_core::shapes::box_room;

    #[test]
    fn box_room_samples_fall_into_room_buckets() {
        let mesh = box_room(Point3::origin(), Point3::new(4.0, 3.0, 3.0), 2);
        let categories = SampleCategories::categorize(mesh.vertex_samples(), 2.0);

        // 3x3 grid per face
        assert_eq!(categories.up.len(), 9);
        assert_eq!(categories.down.len(), 9);
        assert_eq!(categories.horizontal.len(), 36);
        assert!(categories.other.is_empty());
        assert!(categories.covers_room());
    }

    #[test]
    fn duplicates_collapse_and_slopes_go_to_other() {
        let sample = Line::new(Point3::new(1.0, 0.0, 1.0), Vector3::y());
        let sloped = Line::new(Point3::new(1.0, 0.0, 1.0), Vector3::new(1.0, 1.0, 0.0));
        let categories = SampleCategories::categorize([sample, sample, sloped], 2.0);
        assert_eq!(categories.up.len(), 1);
        assert_eq!(categories.other.len(), 1);
        assert_eq!(categories.total(), 2);
        assert!(!categories.covers_room());
    }
}
