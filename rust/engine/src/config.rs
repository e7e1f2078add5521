// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scanner configuration.
//!
//! Defaults hold the tuned constants. A JSON document (all fields optional)
//! or `ROOMSCAN_*` environment variables override them:
//!
//! | variable | field |
//! |---|---|
//! | `ROOMSCAN_CONFIG` | path to a JSON config file, applied first |
//! | `ROOMSCAN_MAX_ORIENTATION_DIFFERENCE` | clustering and reconstruction angle (degrees) |
//! | `ROOMSCAN_MAX_DISTANCE_TO_PLANE` | clustering distance (metres) |
//! | `ROOMSCAN_SENSITIVITY` | probe rays per wall |
//! | `ROOMSCAN_PROBE_DEPTH` | probe ray length (metres) |
//! | `ROOMSCAN_MAX_DIMENSION_DIFFERENCE` | size rejection tolerance (metres) |
//! | `ROOMSCAN_POLL_INTERVAL_SECS` | sensor poll interval |
//! | `ROOMSCAN_PROGRESS_THRESHOLD` | coverage fraction per bucket |
//! | `ROOMSCAN_MIN_BAKED_PATCHES` | patches required before analysis |

use std::path::Path;

use serde::{Deserialize, Serialize};

use roomscan_geometry::{ClusterConfig, ReconstructionConfig};
use roomscan_matching::{MatcherConfig, ProbeConfig};

use crate::error::{Error, Result};
use crate::progress::ProgressConfig;
use crate::scheduler::SchedulerConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub cluster: ClusterConfig,
    pub reconstruction: ReconstructionConfig,
    pub probe: ProbeConfig,
    pub matcher: MatcherConfig,
    pub scheduler: SchedulerConfig,
    pub progress: ProgressConfig,
    /// Baked patches required before the analysis may start.
    pub min_baked_patches: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            reconstruction: ReconstructionConfig::default(),
            probe: ProbeConfig::default(),
            matcher: MatcherConfig::default(),
            scheduler: SchedulerConfig::default(),
            progress: ProgressConfig::default(),
            min_baked_patches: 1,
        }
    }
}

impl ScannerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ScannerConfig::from_env`] with a custom variable source.
    ///
    /// Unparseable values are ignored and the previous value kept.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("ROOMSCAN_CONFIG") {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };

        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());
        let parsed_count = |key: &str| lookup(key).and_then(|v| v.trim().parse::<usize>().ok());

        if let Some(angle) = parsed("ROOMSCAN_MAX_ORIENTATION_DIFFERENCE") {
            config.cluster.max_orientation_difference_deg = angle;
            config.reconstruction.max_orientation_difference_deg = angle;
        }
        if let Some(distance) = parsed("ROOMSCAN_MAX_DISTANCE_TO_PLANE") {
            config.cluster.max_distance_to_plane = distance;
        }
        if let Some(sensitivity) = parsed_count("ROOMSCAN_SENSITIVITY") {
            config.probe.sensitivity = sensitivity;
        }
        if let Some(depth) = parsed("ROOMSCAN_PROBE_DEPTH") {
            config.probe.probe_depth = depth;
        }
        if let Some(tolerance) = parsed("ROOMSCAN_MAX_DIMENSION_DIFFERENCE") {
            config.matcher.max_dimension_difference = tolerance;
        }
        if let Some(interval) = parsed("ROOMSCAN_POLL_INTERVAL_SECS") {
            config.scheduler.poll_interval_secs = interval;
        }
        if let Some(threshold) = parsed("ROOMSCAN_PROGRESS_THRESHOLD") {
            config.progress.finished_fraction = threshold;
        }
        if let Some(count) = parsed_count("ROOMSCAN_MIN_BAKED_PATCHES") {
            config.min_baked_patches = count;
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(Error::Config(format!("{name} must be positive, got {value}")))
            }
        };

        positive(
            "cluster.max_orientation_difference_deg",
            self.cluster.max_orientation_difference_deg,
        )?;
        positive("cluster.max_distance_to_plane", self.cluster.max_distance_to_plane)?;
        positive("cluster.vertex_quantum", self.cluster.vertex_quantum)?;
        positive(
            "reconstruction.max_orientation_difference_deg",
            self.reconstruction.max_orientation_difference_deg,
        )?;
        positive("probe.probe_depth", self.probe.probe_depth)?;
        positive("matcher.max_dimension_difference", self.matcher.max_dimension_difference)?;

        if self.probe.sensitivity == 0 {
            return Err(Error::Config("probe.sensitivity must be at least 1".into()));
        }
        if self.probe.corner_inset.is_nan() || self.probe.corner_inset < 0.0 {
            return Err(Error::Config("probe.corner_inset must not be negative".into()));
        }
        let interval = self.scheduler.poll_interval_secs;
        if interval.is_nan() || interval < 0.0 {
            return Err(Error::Config("scheduler.poll_interval_secs must not be negative".into()));
        }
        if !(0.0..1.0).contains(&self.progress.finished_fraction) {
            return Err(Error::Config(format!(
                "progress.finished_fraction must be in [0, 1), got {}",
                self.progress.finished_fraction
            )));
        }
        let spacing = self.progress.sensor_spacing_deg;
        if spacing == 0 || 180 % spacing != 0 {
            return Err(Error::Config(format!(
                "progress.sensor_spacing_deg must divide 180, got {spacing}"
            )));
        }
        Ok(())
    }
}
