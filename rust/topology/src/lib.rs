// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RoomScan Topology
//!
//! Undirected adjacency graph over mesh-derived surface samples.
//!
//! Every mesh vertex becomes a [`Line`](roomscan_core::Line) sample. Samples
//! are keyed by their quantized position, so a vertex shared by several
//! triangles (or by two overlapping patches) collapses into one node. The three
//! vertices of each triangle are connected pairwise. Region growing walks this
//! graph with an explicit stack.

pub mod error;
pub mod graph;
pub mod keys;
pub mod spatial;

pub use error::{Error, Result};
pub use graph::{AdjacencyGraph, GraphNode};
pub use keys::NodeKey;
pub use spatial::QuantizationIndex;
