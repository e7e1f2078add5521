// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The room scanner: scheduler, progress and analysis driven by one host
//! loop.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use roomscan_core::Ray;
use roomscan_geometry::{Plane, RoomShape};
use roomscan_matching::{
    Alignment, FootprintProbe, MatchOutcome, ReferenceRoom, Room, RoomMatcher, TriangleCollider,
};

use crate::analysis::{AnalysisState, RoomAnalysis};
use crate::config::ScannerConfig;
use crate::error::{Error, Result};
use crate::progress::{heading_deg, Coverage, ScanHint, ScanProgress};
use crate::scheduler::{BakeScheduler, SchedulerStats};
use crate::sensing::SensingLayer;

/// Read-only state for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSnapshot {
    pub coverage: Coverage,
    pub scan_finished: bool,
    pub hint: Option<ScanHint>,
    pub scheduler: SchedulerStats,
    pub analysis: AnalysisState,
    pub planes: usize,
    pub identified: Option<String>,
}

pub struct RoomScanner<S> {
    config: ScannerConfig,
    sensing: S,
    scheduler: BakeScheduler,
    progress: ScanProgress,
    analysis: RoomAnalysis,
    matcher: RoomMatcher,
    collider: TriangleCollider,
    collider_revision: u64,
    last_hint: Option<ScanHint>,
}

impl<S: SensingLayer> RoomScanner<S> {
    /// Validates the configuration and probes the reference rooms.
    pub fn new(config: ScannerConfig, sensing: S, references: Vec<ReferenceRoom>) -> Result<Self> {
        config.validate()?;
        let mut matcher = RoomMatcher::new(config.matcher);
        matcher.scan_references(references, &FootprintProbe::new(config.probe))?;
        tracing::info!(
            references = matcher.references().len(),
            sensitivity = config.probe.sensitivity,
            "Room scanner ready"
        );

        Ok(Self {
            scheduler: BakeScheduler::new(config.scheduler),
            progress: ScanProgress::new(config.progress),
            analysis: RoomAnalysis::new(&config),
            matcher,
            collider: TriangleCollider::new(),
            collider_revision: 0,
            last_hint: None,
            config,
            sensing,
        })
    }

    /// One host-loop tick with the viewer's eye ray.
    pub fn tick(&mut self, view: &Ray, now: Instant) -> AnalysisState {
        self.scheduler.tick(&mut self.sensing, Some(view), now);

        if self.scheduler.revision() != self.collider_revision {
            self.collider = TriangleCollider::from_meshes(
                self.scheduler.meshes().iter().map(|m| m.as_ref()),
            );
            self.collider_revision = self.scheduler.revision();
        }

        self.progress.update(view.origin, &self.collider);
        if let Some(hint) = self.progress.hint(heading_deg(&view.direction), now) {
            tracing::debug!(?hint, "Scan hint");
            self.last_hint = Some(hint);
        }
        if self.progress.is_finished() {
            self.last_hint = None;
        }

        if self.analysis.state() == AnalysisState::Idle
            && self.progress.is_finished()
            && self.scheduler.baked_count() >= self.config.min_baked_patches
        {
            self.analysis.start(self.scheduler.meshes());
        }
        self.analysis.step(&self.matcher)
    }

    /// Allows a finished or failed analysis to run again on the next tick
    /// with the meshes baked by then.
    pub fn retrigger(&mut self) -> Result<()> {
        if self.analysis.state().is_running() {
            return Err(Error::AnalysisRunning(self.analysis.state()));
        }
        self.analysis.reset();
        Ok(())
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn sensing(&self) -> &S {
        &self.sensing
    }

    pub fn scheduler(&self) -> &BakeScheduler {
        &self.scheduler
    }

    pub fn progress(&self) -> &ScanProgress {
        &self.progress
    }

    pub fn analysis_state(&self) -> AnalysisState {
        self.analysis.state()
    }

    pub fn analysis_error(&self) -> Option<&Error> {
        self.analysis.error()
    }

    pub fn planes(&self) -> &[Plane] {
        self.analysis.planes()
    }

    pub fn shape(&self) -> Option<&RoomShape> {
        self.analysis.shape()
    }

    pub fn room(&self) -> Option<&Room> {
        self.analysis.room()
    }

    pub fn outcome(&self) -> Option<&MatchOutcome> {
        self.analysis.outcome()
    }

    pub fn alignment(&self) -> Option<&Alignment> {
        self.outcome()
            .and_then(MatchOutcome::best)
            .map(|m| &m.alignment)
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            coverage: self.progress.coverage(),
            scan_finished: self.progress.is_finished(),
            hint: self.last_hint,
            scheduler: self.scheduler.stats(),
            analysis: self.analysis.state(),
            planes: self.analysis.planes().len(),
            identified: self
                .outcome()
                .and_then(MatchOutcome::best)
                .map(|m| m.best.name.clone()),
        }
    }
}
