// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for graph operations.

use crate::keys::NodeKey;

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or querying the adjacency graph.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced node is not in the graph.
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeKey),

    /// The mesh carries no usable vertex normals.
    #[error("mesh has no vertex normals")]
    MissingNormals,

    /// Malformed mesh buffers.
    #[error("mesh error: {0}")]
    Mesh(#[from] roomscan_core::Error),
}
