// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Footprint matching against reference layouts.

use std::cmp::Ordering;

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::footprint::{Footprint, FootprintProbe};
use crate::room::{ReferenceRoom, Room};

/// Scoring thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Largest allowed norm of the dimension difference, in metres.
    pub max_dimension_difference: f64,
    /// Penalty for a cell only the reference has (scan gap).
    pub miss_penalty: f64,
    /// Penalty for a cell only the physical room has (contradiction).
    pub contradiction_penalty: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_dimension_difference: 0.5,
            miss_penalty: 1.0,
            contradiction_penalty: 10.0,
        }
    }
}

/// Score of one reference against the physical room.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    /// Index into the matcher's references.
    pub index: usize,
    pub name: String,
    /// Lower is better; infinite when rejected.
    pub score: f64,
    /// True when the 180°-rotated reference footprint scored better.
    pub rotated: bool,
}

/// Rigid transform taking the reference layout onto the physical room.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub rotated: bool,
    /// Physical corner 0.
    pub physical_anchor: Point3<f64>,
    /// Physical direction from corner 0 to corner 1, horizontal.
    pub dominant_direction: Vector3<f64>,
    /// Reference corner mapped onto the physical anchor (2 when rotated).
    pub reference_anchor: Point3<f64>,
    pub transform: Isometry3<f64>,
}

impl Alignment {
    /// Yaw-plus-translation aligning `reference` onto `physical`.
    pub fn compute(physical: &Room, reference: &Room, rotated: bool) -> Self {
        let (a, b) = if rotated { (2, 3) } else { (0, 1) };
        let reference_anchor = reference.corners[a];
        let reference_direction = horizontal_unit(reference.corners[b] - reference.corners[a]);
        let physical_anchor = physical.corners[0];
        let dominant_direction = horizontal_unit(physical.corners[1] - physical.corners[0]);

        let cross = reference_direction.cross(&dominant_direction);
        let yaw = cross.y.atan2(reference_direction.dot(&dominant_direction));
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw);
        let translation = physical_anchor.coords - rotation * reference_anchor.coords;

        Self {
            rotated,
            physical_anchor,
            dominant_direction,
            reference_anchor,
            transform: Isometry3::from_parts(Translation3::from(translation), rotation),
        }
    }

    /// Yaw of the transform in degrees.
    pub fn yaw_deg(&self) -> f64 {
        self.transform.rotation.scaled_axis().y.to_degrees()
    }
}

fn horizontal_unit(v: Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.x, 0.0, v.z)
        .try_normalize(1e-9)
        .unwrap_or_else(Vector3::x)
}

/// The winning reference.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomMatch {
    pub best: CandidateScore,
    pub alignment: Alignment,
    /// All candidates, best first.
    pub ranking: Vec<CandidateScore>,
}

/// Result of a matching attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Identified(RoomMatch),
    /// Every reference was rejected (or there were none).
    Unidentified { ranking: Vec<CandidateScore> },
}

impl MatchOutcome {
    pub fn is_identified(&self) -> bool {
        matches!(self, MatchOutcome::Identified(_))
    }

    pub fn best(&self) -> Option<&RoomMatch> {
        match self {
            MatchOutcome::Identified(m) => Some(m),
            MatchOutcome::Unidentified { .. } => None,
        }
    }
}

/// A reference layout with its probed footprint.
#[derive(Debug, Clone)]
pub struct ScannedReference {
    pub reference: ReferenceRoom,
    pub room: Room,
}

/// Scores physical rooms against a set of scanned references.
#[derive(Debug, Clone, Default)]
pub struct RoomMatcher {
    config: MatcherConfig,
    references: Vec<ScannedReference>,
}

impl RoomMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self {
            config,
            references: Vec::new(),
        }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Probes every reference (in parallel) and keeps the results.
    pub fn scan_references(
        &mut self,
        references: Vec<ReferenceRoom>,
        probe: &FootprintProbe,
    ) -> Result<()> {
        let scanned = references
            .into_par_iter()
            .map(|reference| {
                let room = Room::scan(&reference, probe)?;
                Ok(ScannedReference { reference, room })
            })
            .collect::<Result<Vec<_>>>()?;

        for s in &scanned {
            tracing::debug!(
                name = s.reference.name(),
                hits = s.room.footprint.hits(),
                cells = s.room.footprint.len(),
                "Scanned reference room"
            );
        }
        self.references.extend(scanned);
        Ok(())
    }

    pub fn references(&self) -> &[ScannedReference] {
        &self.references
    }

    /// Asymmetric mismatch, normalized by footprint length.
    ///
    /// Footprints of different lengths never match.
    pub fn footprint_score(&self, physical: &Footprint, reference: &Footprint) -> f64 {
        if physical.len() != reference.len() || physical.is_empty() {
            return f64::INFINITY;
        }
        let penalty: f64 = physical
            .cells()
            .iter()
            .zip(reference.cells())
            .map(|(&p, &r)| match (p, r) {
                (false, true) => self.config.miss_penalty,
                (true, false) => self.config.contradiction_penalty,
                _ => 0.0,
            })
            .sum();
        penalty / physical.len() as f64
    }

    /// Score against one reference, trying both orientations.
    pub fn score(&self, physical: &Room, reference: &Room) -> (f64, bool) {
        let difference = (physical.dimensions - reference.dimensions).norm();
        if difference > self.config.max_dimension_difference {
            return (f64::INFINITY, false);
        }
        let direct = self.footprint_score(&physical.footprint, &reference.footprint);
        let rotated = self.footprint_score(&physical.footprint, &reference.footprint.rotated());
        if rotated < direct {
            (rotated, true)
        } else {
            (direct, false)
        }
    }

    /// Ranks every reference and picks the best one.
    pub fn match_room(&self, physical: &Room) -> MatchOutcome {
        let mut ranking: Vec<CandidateScore> = self
            .references
            .par_iter()
            .enumerate()
            .map(|(index, s)| {
                let (score, rotated) = self.score(physical, &s.room);
                CandidateScore {
                    index,
                    name: s.reference.name().to_string(),
                    score,
                    rotated,
                }
            })
            .collect();
        ranking.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });

        let Some(best) = ranking.first().filter(|c| c.score.is_finite()).cloned() else {
            tracing::info!(candidates = ranking.len(), "Room could not be identified");
            return MatchOutcome::Unidentified { ranking };
        };

        let reference = &self.references[best.index].room;
        let alignment = Alignment::compute(physical, reference, best.rotated);
        tracing::info!(
            name = %best.name,
            score = best.score,
            rotated = best.rotated,
            "Identified room"
        );
        MatchOutcome::Identified(RoomMatch {
            best,
            alignment,
            ranking,
        })
    }
}
