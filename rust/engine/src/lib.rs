// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RoomScan Engine
//!
//! Drives room identification from a live spatial-mapping sensor:
//!
//! - [`BakeScheduler`] decides which surface patch to bake next, one at a
//!   time, favouring never-baked patches and what the viewer looks at.
//! - [`ScanProgress`] tracks how much of the surroundings has been scanned
//!   and produces direction hints.
//! - [`RoomAnalysis`] runs sampling, clustering, reconstruction and matching
//!   as a step-wise state machine.
//! - [`RoomScanner`] ties them together behind a single `tick`.
//!
//! ```rust,no_run
//! use std::time::Instant;
//! use roomscan_core::{Isometry3, Point3, Ray, Vector3};
//! use roomscan_engine::{RoomScanner, ScannerConfig, SimulatedSensor};
//! use roomscan_matching::ReferenceRoom;
//!
//! let sensor = SimulatedSensor::box_room(
//!     Point3::origin(),
//!     Point3::new(4.0, 3.0, 3.0),
//!     4,
//!     &Isometry3::identity(),
//! );
//! let references = vec![ReferenceRoom::new("office", Point3::origin(), Vector3::new(4.0, 3.0, 3.0))];
//! let mut scanner = RoomScanner::new(ScannerConfig::default(), sensor, references).unwrap();
//!
//! let view = Ray::new(Point3::new(2.0, 1.6, 1.5), -Vector3::z()).unwrap();
//! scanner.tick(&view, Instant::now());
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod progress;
pub mod queue;
pub mod scanner;
pub mod scheduler;
pub mod sensing;
pub mod synthetic;

pub use analysis::{AnalysisState, RoomAnalysis};
pub use config::ScannerConfig;
pub use error::{Error, Result};
pub use progress::{
    heading_deg, heading_direction, Coverage, ProgressConfig, ProgressStrategy, ScanHint,
    ScanProgress,
};
pub use queue::LazyPriorityQueue;
pub use scanner::{RoomScanner, ScanSnapshot};
pub use scheduler::{BakeScheduler, BakeState, SchedulerConfig, SchedulerStats, SurfacePatch};
pub use sensing::{BakeCompletion, BakeError, ChangeKind, PatchChange, PatchId, SensingLayer};
pub use synthetic::SimulatedSensor;
