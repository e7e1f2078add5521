// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Incremental re-meshing scheduler.
//!
//! Decides which surface patch to bake next. At most one bake is in flight;
//! its completion arrives on a channel and is applied at the start of the
//! next tick. Queue priority is evaluated lazily at pop time:
//!
//! 1. never-baked patches before baked ones, baked before stale
//!    (updated after their last bake),
//! 2. within a state, the patch the viewer looked at most recently.

use std::cmp::{Ordering, Reverse};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use roomscan_core::{Aabb, MeshBuffers, Ray};

use crate::queue::LazyPriorityQueue;
use crate::sensing::{BakeCompletion, BakeError, ChangeKind, PatchChange, PatchId, SensingLayer};

/// Scheduler tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minimum time between two sensor polls, in seconds.
    pub poll_interval_secs: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 2.0,
        }
    }
}

impl SchedulerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.poll_interval_secs).unwrap_or(Duration::ZERO)
    }
}

/// Bake state of a patch. The declaration order is the queue priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BakeState {
    NeverBaked,
    Baked,
    PendingUpdatePostBake,
}

/// One sensed surface patch.
#[derive(Debug, Clone)]
pub struct SurfacePatch {
    pub id: PatchId,
    pub bounds: Aabb,
    pub state: BakeState,
    pub last_update: Instant,
    pub last_gazed: Instant,
    mesh: Option<Arc<MeshBuffers>>,
}

impl SurfacePatch {
    fn new(change: &PatchChange) -> Self {
        Self {
            id: change.id,
            bounds: change.bounds,
            state: BakeState::NeverBaked,
            last_update: change.timestamp,
            last_gazed: change.timestamp,
            mesh: None,
        }
    }

    /// Most recently baked mesh, shared read-only.
    pub fn mesh(&self) -> Option<&Arc<MeshBuffers>> {
        self.mesh.as_ref()
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    id: PatchId,
    /// The sensor reported an update while baking; bake again afterwards.
    updated: bool,
    /// The sensor removed the patch while baking; drop it on completion.
    removed: bool,
}

/// Counters for presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub patches: usize,
    pub queued: usize,
    pub baked: usize,
    pub in_flight: Option<PatchId>,
    pub completed_bakes: usize,
    pub failed_bakes: usize,
}

pub struct BakeScheduler {
    config: SchedulerConfig,
    patches: FxHashMap<PatchId, SurfacePatch>,
    queue: LazyPriorityQueue<PatchId>,
    in_flight: Option<InFlight>,
    completion_tx: Sender<BakeCompletion>,
    completion_rx: Receiver<BakeCompletion>,
    last_poll: Option<Instant>,
    /// Bumped whenever the set of baked meshes changes.
    revision: u64,
    completed_bakes: usize,
    failed_bakes: usize,
}

impl Default for BakeScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl BakeScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel();
        Self {
            config,
            patches: FxHashMap::default(),
            queue: LazyPriorityQueue::new(),
            in_flight: None,
            completion_tx,
            completion_rx,
            last_poll: None,
            revision: 0,
            completed_bakes: 0,
            failed_bakes: 0,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// One host-loop tick.
    ///
    /// Applies finished bakes, polls the sensor when the poll interval has
    /// elapsed, refreshes gaze recency of queued patches and, if nothing is
    /// baking, starts the next bake.
    pub fn tick<S>(&mut self, sensing: &mut S, gaze: Option<&Ray>, now: Instant)
    where
        S: SensingLayer + ?Sized,
    {
        self.apply_completions(now);

        let poll_due = self
            .last_poll
            .map_or(true, |last| now.saturating_duration_since(last) >= self.config.poll_interval());
        if poll_due {
            self.last_poll = Some(now);
            for change in sensing.poll_changes() {
                self.apply_change(&change);
            }
        }

        if let Some(gaze) = gaze {
            self.refresh_gaze(gaze, now);
        }

        if self.in_flight.is_none() {
            self.start_next_bake(sensing);
        }
    }

    /// Applies one sensor change.
    pub fn apply_change(&mut self, change: &PatchChange) {
        let baking = self.in_flight.as_mut().filter(|f| f.id == change.id);
        match change.kind {
            ChangeKind::Added | ChangeKind::Updated => {
                if let Some(flight) = baking {
                    // a re-add after a buffered removal cancels the removal
                    flight.removed = false;
                    flight.updated = true;
                    if let Some(patch) = self.patches.get_mut(&change.id) {
                        patch.bounds = change.bounds;
                        patch.last_update = change.timestamp;
                    }
                    return;
                }
                match self.patches.get_mut(&change.id) {
                    Some(patch) => {
                        patch.bounds = change.bounds;
                        patch.last_update = change.timestamp;
                        if patch.state == BakeState::Baked {
                            patch.state = BakeState::PendingUpdatePostBake;
                        }
                    }
                    None => {
                        if change.kind == ChangeKind::Updated {
                            tracing::debug!(id = change.id, "Update for unknown patch, adding it");
                        }
                        self.patches.insert(change.id, SurfacePatch::new(change));
                    }
                }
                self.queue.push(change.id);
            }
            ChangeKind::Removed => {
                if let Some(flight) = baking {
                    flight.removed = true;
                    return;
                }
                self.remove_patch(change.id);
            }
        }
    }

    fn remove_patch(&mut self, id: PatchId) {
        self.queue.remove(&id);
        if let Some(patch) = self.patches.remove(&id) {
            if patch.mesh.is_some() {
                self.revision += 1;
            }
            tracing::debug!(id, "Removed surface patch");
        }
    }

    fn apply_completions(&mut self, now: Instant) {
        loop {
            let completion = match self.completion_rx.try_recv() {
                Ok(completion) => completion,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };
            self.apply_completion(completion, now);
        }
    }

    fn apply_completion(&mut self, completion: BakeCompletion, now: Instant) {
        let Some(flight) = self.in_flight.filter(|f| f.id == completion.id) else {
            tracing::warn!(id = completion.id, "Ignoring completion for a patch that is not baking");
            return;
        };
        self.in_flight = None;

        if flight.removed {
            self.remove_patch(flight.id);
            return;
        }

        let result = completion.result.and_then(|mesh| match mesh.validate() {
            Ok(()) => Ok(mesh),
            Err(err) => Err(BakeError::Faulted {
                id: flight.id,
                reason: err.to_string(),
            }),
        });
        let mesh = match result {
            Ok(mesh) => mesh,
            Err(err) => {
                self.failed_bakes += 1;
                tracing::warn!(id = flight.id, error = %err, "Bake failed, patch re-queued");
                self.queue.push(flight.id);
                return;
            }
        };

        let Some(patch) = self.patches.get_mut(&flight.id) else {
            return;
        };
        patch.mesh = Some(Arc::new(mesh));
        patch.last_update = now;
        patch.state = if flight.updated {
            BakeState::PendingUpdatePostBake
        } else {
            BakeState::Baked
        };
        if flight.updated {
            self.queue.push(flight.id);
        }
        self.completed_bakes += 1;
        self.revision += 1;
        tracing::debug!(
            id = flight.id,
            triangles = patch.mesh.as_ref().map_or(0, |m| m.triangle_count()),
            "Baked surface patch"
        );
    }

    fn refresh_gaze(&mut self, gaze: &Ray, now: Instant) {
        for id in self.queue.iter() {
            if let Some(patch) = self.patches.get_mut(id) {
                if patch.bounds.ray_entry(gaze).is_some() {
                    patch.last_gazed = now;
                }
            }
        }
    }

    /// Removes and returns the highest-priority queued patch.
    pub fn pop_next(&mut self) -> Option<PatchId> {
        let patches = &self.patches;
        self.queue
            .pop_min_by(|a, b| match (patches.get(a), patches.get(b)) {
                (Some(a), Some(b)) => priority(a).cmp(&priority(b)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    }

    fn start_next_bake<S>(&mut self, sensing: &mut S)
    where
        S: SensingLayer + ?Sized,
    {
        let Some(id) = self.pop_next() else {
            return;
        };
        if !self.patches.contains_key(&id) {
            return;
        }
        match sensing.request_bake(id, self.completion_tx.clone()) {
            Ok(()) => {
                self.in_flight = Some(InFlight {
                    id,
                    updated: false,
                    removed: false,
                });
            }
            Err(err) => {
                self.failed_bakes += 1;
                tracing::warn!(id, error = %err, "Bake request failed, patch re-queued");
                self.queue.push(id);
            }
        }
    }

    pub fn patch(&self, id: PatchId) -> Option<&SurfacePatch> {
        self.patches.get(&id)
    }

    pub fn patches(&self) -> impl Iterator<Item = &SurfacePatch> {
        self.patches.values()
    }

    pub fn in_flight(&self) -> Option<PatchId> {
        self.in_flight.map(|f| f.id)
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_queued(&self, id: PatchId) -> bool {
        self.queue.contains(&id)
    }

    /// Patches that currently hold a baked mesh.
    pub fn baked_count(&self) -> usize {
        self.patches.values().filter(|p| p.mesh.is_some()).count()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Baked meshes ordered by patch id.
    pub fn meshes(&self) -> Vec<Arc<MeshBuffers>> {
        let mut baked: Vec<_> = self
            .patches
            .values()
            .filter_map(|p| p.mesh.as_ref().map(|m| (p.id, Arc::clone(m))))
            .collect();
        baked.sort_by_key(|(id, _)| *id);
        baked.into_iter().map(|(_, mesh)| mesh).collect()
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            patches: self.patches.len(),
            queued: self.queue.len(),
            baked: self.baked_count(),
            in_flight: self.in_flight(),
            completed_bakes: self.completed_bakes,
            failed_bakes: self.failed_bakes,
        }
    }
}

fn priority(patch: &SurfacePatch) -> (BakeState, Reverse<Instant>) {
    (patch.state, Reverse(patch.last_gazed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};
    use roomscan_core::shapes::{box_face, BoxFace};

    /// Sensor stub: changes are queued by the test, bake requests are
    /// recorded and completed by hand.
    #[derive(Default)]
    struct ScriptedSensor {
        changes: Vec<PatchChange>,
        polls: usize,
        requests: Vec<(PatchId, Sender<BakeCompletion>)>,
        refuse: bool,
    }

    impl SensingLayer for ScriptedSensor {
        fn poll_changes(&mut self) -> Vec<PatchChange> {
            self.polls += 1;
            std::mem::take(&mut self.changes)
        }

        fn request_bake(
            &mut self,
            id: PatchId,
            completions: Sender<BakeCompletion>,
        ) -> Result<(), crate::sensing::BakeError> {
            if self.refuse {
                return Err(crate::sensing::BakeError::Denied(id));
            }
            self.requests.push((id, completions));
            Ok(())
        }
    }

    impl ScriptedSensor {
        fn complete_last(&mut self, ok: bool) {
            let (id, tx) = self.requests.last().cloned().unwrap();
            let completion = if ok {
                BakeCompletion::baked(id, patch_mesh())
            } else {
                BakeCompletion::faulted(id, "sensor busy")
            };
            tx.send(completion).unwrap();
        }

        fn complete_last_with(&mut self, mesh: MeshBuffers) {
            let (id, tx) = self.requests.last().cloned().unwrap();
            tx.send(BakeCompletion::baked(id, mesh)).unwrap();
        }
    }

    fn patch_mesh() -> MeshBuffers {
        box_face(Point3::origin(), Point3::new(1.0, 1.0, 1.0), BoxFace::Floor, 1)
    }

    fn bounds_at(x: f64) -> Aabb {
        Aabb::new(Point3::new(x, 0.0, -1.0), Point3::new(x + 1.0, 1.0, 1.0))
    }

    fn change(id: PatchId, kind: ChangeKind, x: f64, timestamp: Instant) -> PatchChange {
        PatchChange {
            id,
            kind,
            bounds: bounds_at(x),
            timestamp,
        }
    }

    fn secs(t0: Instant, s: u64) -> Instant {
        t0 + Duration::from_secs(s)
    }

    #[test]
    fn never_baked_pops_before_stale_even_with_older_gaze() {
        let t0 = Instant::now();
        let mut sensor = ScriptedSensor::default();
        let mut scheduler = BakeScheduler::default();

        sensor.changes.push(change(1, ChangeKind::Added, 0.0, t0));
        scheduler.tick(&mut sensor, None, t0);
        assert_eq!(scheduler.in_flight(), Some(1));
        sensor.complete_last(true);
        scheduler.tick(&mut sensor, None, secs(t0, 1));
        assert_eq!(scheduler.patch(1).unwrap().state, BakeState::Baked);
        assert_eq!(scheduler.in_flight(), None);

        // patch 1 goes stale and is looked at; patch 2 is new but was seen long ago
        sensor.changes.push(change(1, ChangeKind::Updated, 0.0, secs(t0, 2)));
        sensor.changes.push(change(2, ChangeKind::Added, 10.0, t0));
        let gaze = Ray::new(Point3::new(0.5, 0.5, 5.0), -Vector3::z()).unwrap();
        scheduler.tick(&mut sensor, Some(&gaze), secs(t0, 2));

        let stale = scheduler.patch(1).unwrap();
        assert_eq!(stale.state, BakeState::PendingUpdatePostBake);
        assert_eq!(stale.last_gazed, secs(t0, 2));
        assert_eq!(scheduler.patch(2).unwrap().last_gazed, t0);
        assert_eq!(scheduler.in_flight(), Some(2));
        assert!(scheduler.is_queued(1));
    }

    #[test]
    fn most_recently_gazed_first_within_a_state() {
        let t0 = Instant::now();
        let mut scheduler = BakeScheduler::default();
        scheduler.apply_change(&change(1, ChangeKind::Added, 0.0, t0));
        scheduler.apply_change(&change(2, ChangeKind::Added, 10.0, t0));
        scheduler.apply_change(&change(3, ChangeKind::Added, 20.0, t0));

        let gaze = Ray::new(Point3::new(10.5, 0.5, 5.0), -Vector3::z()).unwrap();
        scheduler.refresh_gaze(&gaze, secs(t0, 3));
        assert_eq!(scheduler.pop_next(), Some(2));
        // equal priority falls back to arrival order
        assert_eq!(scheduler.pop_next(), Some(1));
        assert_eq!(scheduler.pop_next(), Some(3));
        assert_eq!(scheduler.pop_next(), None);
    }

    #[test]
    fn failed_bake_keeps_state_and_requeues() {
        let t0 = Instant::now();
        let mut sensor = ScriptedSensor::default();
        let mut scheduler = BakeScheduler::default();
        sensor.changes.push(change(7, ChangeKind::Added, 0.0, t0));
        scheduler.tick(&mut sensor, None, t0);
        sensor.complete_last(false);

        // completion applied, then the patch competes again in the same tick
        scheduler.tick(&mut sensor, None, secs(t0, 1));
        assert_eq!(scheduler.patch(7).unwrap().state, BakeState::NeverBaked);
        assert_eq!(scheduler.in_flight(), Some(7));
        assert_eq!(sensor.requests.len(), 2);
        assert_eq!(scheduler.stats().failed_bakes, 1);

        sensor.complete_last(true);
        scheduler.tick(&mut sensor, None, secs(t0, 1));
        assert_eq!(scheduler.patch(7).unwrap().state, BakeState::Baked);
        assert_eq!(scheduler.baked_count(), 1);
        assert_eq!(scheduler.meshes().len(), 1);
    }

    #[test]
    fn refused_request_is_retried_next_tick() {
        let t0 = Instant::now();
        let mut sensor = ScriptedSensor {
            refuse: true,
            ..Default::default()
        };
        let mut scheduler = BakeScheduler::default();
        sensor.changes.push(change(1, ChangeKind::Added, 0.0, t0));
        scheduler.tick(&mut sensor, None, t0);
        assert_eq!(scheduler.in_flight(), None);
        assert!(scheduler.is_queued(1));

        sensor.refuse = false;
        scheduler.tick(&mut sensor, None, t0);
        assert_eq!(scheduler.in_flight(), Some(1));
    }

    #[test]
    fn removal_during_bake_is_deferred() {
        let t0 = Instant::now();
        let mut sensor = ScriptedSensor::default();
        let mut scheduler = BakeScheduler::default();
        sensor.changes.push(change(4, ChangeKind::Added, 0.0, t0));
        scheduler.tick(&mut sensor, None, t0);

        scheduler.apply_change(&change(4, ChangeKind::Removed, 0.0, t0));
        assert!(scheduler.patch(4).is_some());

        sensor.complete_last(true);
        scheduler.tick(&mut sensor, None, secs(t0, 1));
        assert!(scheduler.patch(4).is_none());
        assert_eq!(scheduler.baked_count(), 0);
        assert_eq!(scheduler.in_flight(), None);
    }

    #[test]
    fn readd_after_removal_during_bake_keeps_patch() {
        let t0 = Instant::now();
        let mut sensor = ScriptedSensor::default();
        let mut scheduler = BakeScheduler::default();
        sensor.changes.push(change(4, ChangeKind::Added, 0.0, t0));
        scheduler.tick(&mut sensor, None, t0);

        scheduler.apply_change(&change(4, ChangeKind::Removed, 0.0, t0));
        scheduler.apply_change(&change(4, ChangeKind::Added, 3.0, t0));

        sensor.complete_last(true);
        scheduler.tick(&mut sensor, None, secs(t0, 1));
        let patch = scheduler.patch(4).expect("re-added patch survives");
        assert_eq!(patch.bounds, bounds_at(3.0));
        assert_eq!(patch.state, BakeState::PendingUpdatePostBake);
        assert!(patch.mesh().is_some());
        assert_eq!(scheduler.in_flight(), Some(4));
        assert_eq!(sensor.requests.len(), 2);
    }

    #[test]
    fn malformed_bake_is_treated_as_fault() {
        let t0 = Instant::now();
        let mut sensor = ScriptedSensor::default();
        let mut scheduler = BakeScheduler::default();
        sensor.changes.push(change(7, ChangeKind::Added, 0.0, t0));
        scheduler.tick(&mut sensor, None, t0);

        let mut mesh = patch_mesh();
        mesh.indices.push(99);
        mesh.indices.push(0);
        mesh.indices.push(1);
        sensor.complete_last_with(mesh);
        scheduler.tick(&mut sensor, None, secs(t0, 1));

        let patch = scheduler.patch(7).unwrap();
        assert_eq!(patch.state, BakeState::NeverBaked);
        assert!(patch.mesh().is_none());
        assert_eq!(scheduler.revision(), 0);
        assert_eq!(scheduler.stats().failed_bakes, 1);
        assert_eq!(scheduler.in_flight(), Some(7));
    }

    #[test]
    fn update_during_bake_bakes_again() {
        let t0 = Instant::now();
        let mut sensor = ScriptedSensor::default();
        let mut scheduler = BakeScheduler::default();
        sensor.changes.push(change(4, ChangeKind::Added, 0.0, t0));
        scheduler.tick(&mut sensor, None, t0);

        scheduler.apply_change(&change(4, ChangeKind::Updated, 0.0, t0));
        assert!(!scheduler.is_queued(4));

        sensor.complete_last(true);
        let revision = scheduler.revision();
        scheduler.tick(&mut sensor, None, secs(t0, 1));
        assert_eq!(scheduler.revision(), revision + 1);
        assert_eq!(scheduler.patch(4).unwrap().state, BakeState::PendingUpdatePostBake);
        assert!(scheduler.patch(4).unwrap().mesh().is_some());
        assert_eq!(scheduler.in_flight(), Some(4));
    }

    #[test]
    fn polls_are_throttled() {
        let t0 = Instant::now();
        let mut sensor = ScriptedSensor::default();
        let mut scheduler = BakeScheduler::default();
        scheduler.tick(&mut sensor, None, t0);
        scheduler.tick(&mut sensor, None, t0 + Duration::from_millis(1500));
        assert_eq!(sensor.polls, 1);
        scheduler.tick(&mut sensor, None, secs(t0, 2));
        assert_eq!(sensor.polls, 2);
    }
}
