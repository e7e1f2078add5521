// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for primitive geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by geometric primitives.
///
/// The intersection variants are geometric degeneracies: callers must treat
/// them as a failed computation, never substitute a fallback point.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Planes are parallel: no intersection line exists")]
    ParallelPlanes,

    #[error("Line is parallel to plane: no intersection point exists")]
    LineParallelToPlane,

    #[error("Degenerate direction: {0}")]
    DegenerateDirection(&'static str),

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),
}

impl Error {
    /// True for failures caused by degenerate geometry (parallel planes,
    /// zero-length directions) as opposed to malformed input buffers.
    pub fn is_degeneracy(&self) -> bool {
        !matches!(self, Error::InvalidMesh(_))
    }
}
