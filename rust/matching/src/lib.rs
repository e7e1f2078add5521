// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RoomScan Matching
//!
//! Identifies which reference layout a reconstructed room is.
//!
//! Every room, physical or reference, is reduced to a [`Footprint`]: rays are
//! cast through each wall at evenly spaced points and the hits recorded. The
//! [`RoomMatcher`] rejects references of the wrong size, scores the rest
//! against the physical footprint in both orientations and reports the best
//! one together with the [`Alignment`] that maps it onto the scan.

pub mod collider;
pub mod error;
pub mod footprint;
pub mod matcher;
pub mod room;

pub use collider::TriangleCollider;
pub use error::{Error, Result};
pub use footprint::{Footprint, FootprintProbe, ProbeConfig, ProbeRays};
pub use matcher::{
    Alignment, CandidateScore, MatchOutcome, MatcherConfig, RoomMatch, RoomMatcher,
    ScannedReference,
};
pub use room::{PhysicalRoom, ReferenceRoom, Room, RoomBoundary};
