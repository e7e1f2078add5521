// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for probing and matching
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while probing or matching rooms
#[derive(Error, Debug)]
pub enum Error {
    #[error("Wall {wall} is too short to probe: {length:.3} m with {inset:.3} m inset")]
    WallTooShort { wall: usize, length: f64, inset: f64 },

    #[error("Invalid probe configuration: {0}")]
    InvalidProbe(String),

    #[error("Geometric degeneracy: {0}")]
    Geometry(#[from] roomscan_core::Error),

    #[error("Reconstruction error: {0}")]
    Reconstruction(#[from] roomscan_geometry::Error),
}
