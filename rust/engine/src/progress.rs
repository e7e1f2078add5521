// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scan coverage around the viewer.
//!
//! A spherical grid of direction sensors is cast from the viewer's eye
//! against the baked meshes. Coverage is tracked for eight wall sectors
//! (45° of heading each, latitudes within ±30°), the floor (latitude ≥ 30°,
//! looking down) and the ceiling (latitude ≤ −30°).
//!
//! Headings are measured in degrees clockwise seen from above, starting at
//! `-Z`; `+X` is heading 90.

use std::time::{Duration, Instant};

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use roomscan_core::{Ray, RayTarget};

const WALL_SECTORS: usize = 8;
const SECTOR_WIDTH_DEG: f64 = 45.0;
const WALL_LATITUDE_DEG: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressStrategy {
    /// A sensor counts only if it hits on the current update.
    SingleFrame,
    /// A sensor counts once it has ever hit.
    Continuous,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub strategy: ProgressStrategy,
    /// A bucket is covered when its detected fraction exceeds this.
    pub finished_fraction: f64,
    /// Angular spacing of the sensor grid, in whole degrees.
    pub sensor_spacing_deg: u32,
    /// Minimum time between two direction hints, in seconds.
    pub hint_interval_secs: f64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            strategy: ProgressStrategy::Continuous,
            finished_fraction: 0.5,
            sensor_spacing_deg: 10,
            hint_interval_secs: 5.0,
        }
    }
}

/// Where the viewer should look next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanHint {
    KeepGoing,
    SlightlyRight,
    SlightlyLeft,
    Right,
    Left,
    Behind,
    Floor,
    Ceiling,
}

/// Detected fraction per bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub walls: [f64; WALL_SECTORS],
    pub floor: f64,
    pub ceiling: f64,
}

impl Coverage {
    /// Covered flags: eight wall sectors, then floor and ceiling.
    pub fn covered(&self, threshold: f64) -> [bool; WALL_SECTORS + 2] {
        let mut flags = [false; WALL_SECTORS + 2];
        for (flag, fraction) in flags.iter_mut().zip(self.walls) {
            *flag = fraction > threshold;
        }
        flags[WALL_SECTORS] = self.floor > threshold;
        flags[WALL_SECTORS + 1] = self.ceiling > threshold;
        flags
    }

    pub fn is_complete(&self, threshold: f64) -> bool {
        self.covered(threshold).iter().all(|&c| c)
    }
}

#[derive(Debug, Clone)]
struct Sensor {
    direction: Vector3<f64>,
    longitude: f64,
    latitude: f64,
    detected: bool,
}

/// Direction for a heading and a latitude (positive looks down).
pub fn heading_direction(longitude_deg: f64, latitude_deg: f64) -> Vector3<f64> {
    let (sin_lng, cos_lng) = longitude_deg.to_radians().sin_cos();
    let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();
    Vector3::new(cos_lat * sin_lng, -sin_lat, -cos_lat * cos_lng)
}

/// Heading of a view direction, in `[0, 360)`.
pub fn heading_deg(direction: &Vector3<f64>) -> f64 {
    direction.x.atan2(-direction.z).to_degrees().rem_euclid(360.0)
}

#[derive(Debug, Clone)]
pub struct ScanProgress {
    config: ProgressConfig,
    sensors: Vec<Sensor>,
    finished: bool,
    last_hint: Option<Instant>,
    last_sector: Option<usize>,
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new(ProgressConfig::default())
    }
}

impl ScanProgress {
    pub fn new(config: ProgressConfig) -> Self {
        let spacing = config.sensor_spacing_deg.clamp(1, 180);
        let half = f64::from(spacing / 2);
        let mut sensors = Vec::new();
        for i_lng in 0..360 / spacing {
            let longitude = f64::from(spacing * i_lng) - 180.0 + half;
            for i_lat in 0..180 / spacing {
                let latitude = f64::from(spacing * i_lat) - 90.0 + half;
                sensors.push(Sensor {
                    direction: heading_direction(longitude, latitude),
                    longitude,
                    latitude,
                    detected: false,
                });
            }
        }

        Self {
            config,
            sensors,
            finished: false,
            last_hint: None,
            last_sector: None,
        }
    }

    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Casts every sensor from `eye` against `target`. Returns whether the
    /// scan is finished. Once finished, further updates are ignored.
    pub fn update<T>(&mut self, eye: Point3<f64>, target: &T) -> bool
    where
        T: RayTarget + ?Sized,
    {
        if self.finished {
            return true;
        }

        for sensor in &mut self.sensors {
            if self.config.strategy == ProgressStrategy::SingleFrame {
                sensor.detected = false;
            }
            if !sensor.detected {
                let ray = Ray {
                    origin: eye,
                    direction: sensor.direction,
                };
                sensor.detected = target.ray_test(&ray, f64::INFINITY);
            }
        }

        let coverage = self.coverage();
        if coverage.is_complete(self.config.finished_fraction) {
            self.finished = true;
            tracing::info!(
                floor = coverage.floor,
                ceiling = coverage.ceiling,
                "Scan coverage complete"
            );
        }
        self.finished
    }

    /// Current coverage. Buckets without sensors count as fully covered.
    pub fn coverage(&self) -> Coverage {
        let mut walls = [(0usize, 0usize); WALL_SECTORS];
        let mut floor = (0usize, 0usize);
        let mut ceiling = (0usize, 0usize);

        for sensor in &self.sensors {
            let bucket = if sensor.latitude >= WALL_LATITUDE_DEG {
                &mut floor
            } else if sensor.latitude <= -WALL_LATITUDE_DEG {
                &mut ceiling
            } else {
                &mut walls[sector_of(sensor.longitude)]
            };
            bucket.0 += usize::from(sensor.detected);
            bucket.1 += 1;
        }

        let fraction = |(hit, total): (usize, usize)| {
            if total == 0 {
                1.0
            } else {
                hit as f64 / total as f64
            }
        };
        Coverage {
            walls: walls.map(fraction),
            floor: fraction(floor),
            ceiling: fraction(ceiling),
        }
    }

    /// Direction hint for a viewer facing `heading`, throttled to one per
    /// hint interval. `None` when finished or throttled.
    pub fn hint(&mut self, heading: f64, now: Instant) -> Option<ScanHint> {
        if self.finished {
            return None;
        }
        let interval =
            Duration::try_from_secs_f64(self.config.hint_interval_secs).unwrap_or(Duration::ZERO);
        if self
            .last_hint
            .is_some_and(|last| now.saturating_duration_since(last) < interval)
        {
            return None;
        }
        self.last_hint = Some(now);

        let sector = sector_of(heading);
        let changed = self.last_sector != Some(sector);
        self.last_sector = Some(sector);

        let covered = self.coverage().covered(self.config.finished_fraction);
        choose_hint(&covered, sector, changed)
    }

    /// Forgets all detections.
    pub fn reset(&mut self) {
        for sensor in &mut self.sensors {
            sensor.detected = false;
        }
        self.finished = false;
        self.last_hint = None;
        self.last_sector = None;
    }
}

fn sector_of(heading: f64) -> usize {
    let sector = (heading.rem_euclid(360.0) / SECTOR_WIDTH_DEG).floor() as usize;
    sector.min(WALL_SECTORS - 1)
}

fn choose_hint(covered: &[bool; WALL_SECTORS + 2], sector: usize, changed: bool) -> Option<ScanHint> {
    let wall = |offset: isize| {
        let index = (sector as isize + offset).rem_euclid(WALL_SECTORS as isize) as usize;
        covered[index]
    };

    if !wall(0) || (changed && (!wall(1) || !wall(-1))) {
        return Some(ScanHint::KeepGoing);
    }
    if !wall(1) {
        return Some(ScanHint::SlightlyRight);
    }
    if !wall(-1) {
        return Some(ScanHint::SlightlyLeft);
    }
    if !wall(2) {
        return Some(ScanHint::Right);
    }
    if !wall(-2) {
        return Some(ScanHint::Left);
    }
    if !wall(3) || !wall(4) || !wall(5) {
        return Some(ScanHint::Behind);
    }
    if !covered[WALL_SECTORS] {
        return Some(ScanHint::Floor);
    }
    if !covered[WALL_SECTORS + 1] {
        return Some(ScanHint::Ceiling);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use roomscan_core::shapes::{box_face, box_room, BoxFace};
    use roomscan_matching::TriangleCollider;

    fn eye() -> Point3<f64> {
        Point3::new(0.0, 1.5, 0.0)
    }

    fn large_floor() -> TriangleCollider {
        TriangleCollider::from_meshes([&box_face(
            Point3::new(-50.0, 0.0, -50.0),
            Point3::new(50.0, 3.0, 50.0),
            BoxFace::Floor,
            1,
        )])
    }

    #[test]
    fn grid_layout() {
        let progress = ScanProgress::default();
        assert_eq!(progress.sensor_count(), 36 * 18);
        let coverage = progress.coverage();
        assert_eq!(coverage, Coverage::default());
    }

    #[test]
    fn heading_convention() {
        assert_relative_eq!(heading_direction(0.0, 0.0), -Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(heading_direction(90.0, 0.0), Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(heading_direction(0.0, 90.0), -Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(heading_deg(&Vector3::x()), 90.0, epsilon = 1e-12);
        assert_relative_eq!(heading_deg(&-Vector3::x()), 270.0, epsilon = 1e-12);
        assert_eq!(sector_of(-10.0), 7);
        assert_eq!(sector_of(360.0), 0);
    }

    #[test]
    fn closed_room_finishes_in_one_update() {
        let room = TriangleCollider::from_meshes([&box_room(
            Point3::new(-2.0, 0.0, -1.5),
            Point3::new(2.0, 3.0, 1.5),
            4,
        )]);
        let mut progress = ScanProgress::default();
        assert!(progress.update(eye(), &room));
        let coverage = progress.coverage();
        assert_relative_eq!(coverage.floor, 1.0);
        assert_relative_eq!(coverage.ceiling, 1.0);
        assert!(coverage.walls.iter().all(|&w| w > 0.99));
        assert_eq!(progress.hint(0.0, Instant::now()), None);
    }

    #[test]
    fn floor_only_covers_floor() {
        let mut progress = ScanProgress::default();
        assert!(!progress.update(eye(), &large_floor()));
        let coverage = progress.coverage();
        assert_relative_eq!(coverage.floor, 1.0);
        assert_relative_eq!(coverage.ceiling, 0.0);
        // the downward half of each wall band: exactly half, not more
        for w in coverage.walls {
            assert_relative_eq!(w, 0.5);
        }
        assert!(coverage.covered(0.5)[WALL_SECTORS]);
        assert!(coverage.covered(0.5)[..WALL_SECTORS].iter().all(|&c| !c));
    }

    #[test]
    fn strategies() {
        let nothing = TriangleCollider::new();

        let mut continuous = ScanProgress::default();
        continuous.update(eye(), &large_floor());
        continuous.update(eye(), &nothing);
        assert_relative_eq!(continuous.coverage().floor, 1.0);

        let mut single = ScanProgress::new(ProgressConfig {
            strategy: ProgressStrategy::SingleFrame,
            ..ProgressConfig::default()
        });
        single.update(eye(), &large_floor());
        single.update(eye(), &nothing);
        assert_relative_eq!(single.coverage().floor, 0.0);
    }

    #[test]
    fn hints_are_throttled() {
        let mut progress = ScanProgress::default();
        progress.update(eye(), &large_floor());
        let t0 = Instant::now();
        assert_eq!(progress.hint(0.0, t0), Some(ScanHint::KeepGoing));
        assert_eq!(progress.hint(0.0, t0 + Duration::from_secs(1)), None);
        assert_eq!(
            progress.hint(0.0, t0 + Duration::from_secs(5)),
            Some(ScanHint::KeepGoing)
        );
    }

    #[test]
    fn hint_order() {
        let mut covered = [true; WALL_SECTORS + 2];
        assert_eq!(choose_hint(&covered, 0, false), None);

        covered[WALL_SECTORS + 1] = false;
        assert_eq!(choose_hint(&covered, 0, false), Some(ScanHint::Ceiling));
        covered[WALL_SECTORS] = false;
        assert_eq!(choose_hint(&covered, 0, false), Some(ScanHint::Floor));
        covered[4] = false;
        assert_eq!(choose_hint(&covered, 0, false), Some(ScanHint::Behind));
        covered[6] = false;
        assert_eq!(choose_hint(&covered, 0, false), Some(ScanHint::Left));
        covered[2] = false;
        assert_eq!(choose_hint(&covered, 0, false), Some(ScanHint::Right));
        covered[7] = false;
        assert_eq!(choose_hint(&covered, 0, false), Some(ScanHint::SlightlyLeft));
        // a fresh look at a new sector with an uncovered neighbour
        assert_eq!(choose_hint(&covered, 0, true), Some(ScanHint::KeepGoing));
        covered[1] = false;
        assert_eq!(choose_hint(&covered, 0, false), Some(ScanHint::SlightlyRight));
        covered[0] = false;
        assert_eq!(choose_hint(&covered, 0, false), Some(ScanHint::KeepGoing));
    }
}
