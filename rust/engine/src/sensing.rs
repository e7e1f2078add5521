// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interface to the spatial-mapping sensor.
//!
//! The sensor reports surface patches as they appear, change and disappear,
//! and turns the raw depth data of one patch into a triangle mesh on request
//! ("baking"). Bakes run off the tick thread and report back through a
//! channel.

use std::sync::mpsc::Sender;
use std::time::Instant;

use thiserror::Error;

use roomscan_core::{Aabb, MeshBuffers};

/// Sensor-assigned surface patch identifier.
pub type PatchId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

/// One entry of a sensor poll.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchChange {
    pub id: PatchId,
    pub kind: ChangeKind,
    pub bounds: Aabb,
    pub timestamp: Instant,
}

/// Why a bake did not produce a mesh. Both cases are transient.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BakeError {
    #[error("Bake request for patch {0} was refused")]
    Denied(PatchId),

    #[error("Bake for patch {id} faulted: {reason}")]
    Faulted { id: PatchId, reason: String },
}

/// Result of one asynchronous bake, delivered through the completion channel.
#[derive(Debug, Clone)]
pub struct BakeCompletion {
    pub id: PatchId,
    pub result: Result<MeshBuffers, BakeError>,
}

impl BakeCompletion {
    pub fn baked(id: PatchId, mesh: MeshBuffers) -> Self {
        Self {
            id,
            result: Ok(mesh),
        }
    }

    pub fn faulted(id: PatchId, reason: impl Into<String>) -> Self {
        Self {
            id,
            result: Err(BakeError::Faulted {
                id,
                reason: reason.into(),
            }),
        }
    }
}

/// The sensing layer as seen by the bake scheduler.
pub trait SensingLayer {
    /// Changes since the previous poll.
    fn poll_changes(&mut self) -> Vec<PatchChange>;

    /// Starts baking `id`. The completion must be sent exactly once on
    /// `completions`, from any thread. An immediate refusal is reported
    /// through the return value instead and sends nothing.
    fn request_bake(
        &mut self,
        id: PatchId,
        completions: Sender<BakeCompletion>,
    ) -> Result<(), BakeError>;
}
