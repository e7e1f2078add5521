// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Step-wise room analysis.
//!
//! The host loop calls [`RoomAnalysis::step`] once per tick so no single
//! frame carries the whole pipeline:
//!
//! ```text
//! Idle → Sampling (one mesh per step) → Clustering → Reconstructing → Matching → Done
//!                  └──────────────── any error ────────────────┴→ Failed
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use roomscan_core::MeshBuffers;
use roomscan_geometry::{Plane, PlaneClusterer, RoomReconstructor, RoomShape, SampleCategories};
use roomscan_matching::{FootprintProbe, MatchOutcome, PhysicalRoom, Room, RoomMatcher};

use crate::config::ScannerConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisState {
    Idle,
    Sampling,
    Clustering,
    Reconstructing,
    Matching,
    Done,
    Failed,
}

impl AnalysisState {
    /// True for `Done` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisState::Done | AnalysisState::Failed)
    }

    pub fn is_running(self) -> bool {
        !self.is_terminal() && self != AnalysisState::Idle
    }
}

#[derive(Debug)]
pub struct RoomAnalysis {
    state: AnalysisState,
    clusterer: PlaneClusterer,
    reconstructor: RoomReconstructor,
    probe: FootprintProbe,
    categorize_angle_deg: f64,

    meshes: Vec<Arc<MeshBuffers>>,
    next_mesh: usize,
    categories: SampleCategories,
    planes: Vec<Plane>,
    shape: Option<RoomShape>,
    room: Option<Room>,
    outcome: Option<MatchOutcome>,
    error: Option<Error>,
}

impl RoomAnalysis {
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            state: AnalysisState::Idle,
            clusterer: PlaneClusterer::new(config.cluster),
            reconstructor: RoomReconstructor::new(config.reconstruction),
            probe: FootprintProbe::new(config.probe),
            categorize_angle_deg: config.cluster.max_orientation_difference_deg,
            meshes: Vec::new(),
            next_mesh: 0,
            categories: SampleCategories::default(),
            planes: Vec::new(),
            shape: None,
            room: None,
            outcome: None,
            error: None,
        }
    }

    pub fn state(&self) -> AnalysisState {
        self.state
    }

    /// Starts a new analysis over a snapshot of baked meshes, discarding any
    /// previous result. Meshes without normals get recalculated ones.
    pub fn start(&mut self, meshes: Vec<Arc<MeshBuffers>>) {
        self.meshes = meshes
            .into_iter()
            .filter(|mesh| match mesh.validate() {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(error = %err, "Skipping malformed mesh");
                    false
                }
            })
            .map(|mesh| {
                if mesh.has_normals() {
                    mesh
                } else {
                    let mut mesh = (*mesh).clone();
                    mesh.recalculate_normals();
                    Arc::new(mesh)
                }
            })
            .collect();
        self.next_mesh = 0;
        self.categories = SampleCategories::default();
        self.planes.clear();
        self.shape = None;
        self.room = None;
        self.outcome = None;
        self.error = None;
        self.state = AnalysisState::Sampling;
        tracing::info!(meshes = self.meshes.len(), "Starting room analysis");
    }

    /// Back to `Idle`, keeping the last result until the next start.
    pub fn reset(&mut self) {
        self.state = AnalysisState::Idle;
    }

    /// Advances by one step and returns the new state.
    pub fn step(&mut self, matcher: &RoomMatcher) -> AnalysisState {
        if self.state == AnalysisState::Idle || self.state.is_terminal() {
            return self.state;
        }
        match self.advance(matcher) {
            Ok(next) => self.state = next,
            Err(err) => {
                tracing::warn!(state = ?self.state, error = %err, "Room analysis failed");
                self.error = Some(err);
                self.state = AnalysisState::Failed;
            }
        }
        self.state
    }

    /// Steps until a terminal state.
    pub fn run_to_end(&mut self, matcher: &RoomMatcher) -> AnalysisState {
        while self.state.is_running() {
            self.step(matcher);
        }
        self.state
    }

    fn advance(&mut self, matcher: &RoomMatcher) -> Result<AnalysisState> {
        match self.state {
            AnalysisState::Sampling => self.sample_next(),
            AnalysisState::Clustering => {
                self.planes = self
                    .clusterer
                    .cluster_meshes(self.meshes.iter().map(|m| m.as_ref()))?;
                Ok(AnalysisState::Reconstructing)
            }
            AnalysisState::Reconstructing => {
                self.shape = Some(self.reconstructor.reconstruct(&self.planes)?);
                Ok(AnalysisState::Matching)
            }
            AnalysisState::Matching => {
                let Some(shape) = self.shape.as_ref() else {
                    return Ok(AnalysisState::Reconstructing);
                };
                let physical = PhysicalRoom::new(shape, self.meshes.iter().map(|m| m.as_ref()));
                let room = Room::scan(&physical, &self.probe)?;
                self.outcome = Some(matcher.match_room(&room));
                self.room = Some(room);
                Ok(AnalysisState::Done)
            }
            state => Ok(state),
        }
    }

    fn sample_next(&mut self) -> Result<AnalysisState> {
        if self.meshes.is_empty() {
            return Err(Error::NoMeshes);
        }
        if let Some(mesh) = self.meshes.get(self.next_mesh) {
            self.categories
                .extend(mesh.vertex_samples(), self.categorize_angle_deg);
            self.next_mesh += 1;
        }
        if self.next_mesh < self.meshes.len() {
            return Ok(AnalysisState::Sampling);
        }

        let c = &self.categories;
        tracing::info!(
            up = c.up.len(),
            down = c.down.len(),
            horizontal = c.horizontal.len(),
            other = c.other.len(),
            "Samples categorized"
        );
        if !c.covers_room() {
            return Err(Error::InsufficientCoverage {
                up: c.up.len(),
                down: c.down.len(),
                horizontal: c.horizontal.len(),
            });
        }
        Ok(AnalysisState::Clustering)
    }

    pub fn categories(&self) -> &SampleCategories {
        &self.categories
    }

    /// Clustered planes, largest first.
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn shape(&self) -> Option<&RoomShape> {
        self.shape.as_ref()
    }

    /// The probed physical room.
    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    pub fn outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }
}
