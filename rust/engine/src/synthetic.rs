// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Simulated sensing layer for tests and the demo.

use std::sync::mpsc::Sender;
use std::time::Instant;

use nalgebra::{Isometry3, Point3};

use roomscan_core::shapes::box_room_faces;
use roomscan_core::MeshBuffers;

use crate::sensing::{BakeCompletion, BakeError, ChangeKind, PatchChange, PatchId, SensingLayer};

/// Serves a fixed set of meshes as surface patches.
///
/// Each poll reveals up to `reveal_per_poll` further patches. Bakes complete
/// immediately: the completion is already in the channel when
/// `request_bake` returns, and the scheduler applies it on its next tick.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    patches: Vec<MeshBuffers>,
    revealed: usize,
    reveal_per_poll: usize,
    failures_left: usize,
    bake_requests: usize,
}

impl SimulatedSensor {
    /// One patch per mesh, in order. Empty meshes are skipped.
    pub fn new(meshes: Vec<MeshBuffers>) -> Self {
        Self {
            patches: meshes.into_iter().filter(|m| !m.is_empty()).collect(),
            revealed: 0,
            reveal_per_poll: usize::MAX,
            failures_left: 0,
            bake_requests: 0,
        }
    }

    /// An inward-facing box room, one patch per face, placed by `pose`.
    pub fn box_room(
        min: Point3<f64>,
        max: Point3<f64>,
        subdivisions: u32,
        pose: &Isometry3<f64>,
    ) -> Self {
        let faces = box_room_faces(min, max, subdivisions)
            .into_iter()
            .map(|mut face| {
                face.transform(pose);
                face
            })
            .collect();
        Self::new(faces)
    }

    pub fn with_reveal_per_poll(mut self, count: usize) -> Self {
        self.reveal_per_poll = count.max(1);
        self
    }

    /// Makes the first `count` bakes fault.
    pub fn with_failures(mut self, count: usize) -> Self {
        self.failures_left = count;
        self
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    pub fn bake_requests(&self) -> usize {
        self.bake_requests
    }

    fn mesh(&self, id: PatchId) -> Option<&MeshBuffers> {
        usize::try_from(id)
            .ok()
            .filter(|&i| i < self.revealed)
            .and_then(|i| self.patches.get(i))
    }
}

impl SensingLayer for SimulatedSensor {
    fn poll_changes(&mut self) -> Vec<PatchChange> {
        let now = Instant::now();
        let end = self
            .revealed
            .saturating_add(self.reveal_per_poll)
            .min(self.patches.len());
        let changes = (self.revealed..end)
            .filter_map(|i| {
                let bounds = self.patches[i].bounds()?;
                Some(PatchChange {
                    id: PatchId::try_from(i).ok()?,
                    kind: ChangeKind::Added,
                    bounds,
                    timestamp: now,
                })
            })
            .collect();
        self.revealed = end;
        changes
    }

    fn request_bake(
        &mut self,
        id: PatchId,
        completions: Sender<BakeCompletion>,
    ) -> Result<(), BakeError> {
        self.bake_requests += 1;
        let Some(mesh) = self.mesh(id).cloned() else {
            return Err(BakeError::Denied(id));
        };
        let completion = if self.failures_left > 0 {
            self.failures_left -= 1;
            BakeCompletion::faulted(id, "simulated fault")
        } else {
            BakeCompletion::baked(id, mesh)
        };
        if let Err(err) = completions.send(completion) {
            tracing::debug!(id = err.0.id, "Completion receiver gone, dropping bake result");
        }
        Ok(())
    }
}
