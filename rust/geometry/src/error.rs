// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for clustering and reconstruction
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconstructing a room.
///
/// All of them are fatal to the current attempt. The caller may trigger a new
/// attempt once more of the room has been scanned.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No floor plane found")]
    MissingFloor,

    #[error("No ceiling plane found")]
    MissingCeiling,

    #[error("No wall planes found")]
    NoWalls,

    #[error("No wall opposite the main wall")]
    MissingOppositeWall,

    #[error("No wall at {0}° from the main wall")]
    MissingSecondaryWall(f64),

    #[error("Geometric degeneracy: {0}")]
    Geometry(#[from] roomscan_core::Error),

    #[error("Adjacency graph error: {0}")]
    Graph(#[from] roomscan_topology::Error),
}
