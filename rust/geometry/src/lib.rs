// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RoomScan Geometry
//!
//! Planar-region extraction and room-shape reconstruction.
//!
//! Noisy sensor meshes go in, a box-shaped [`RoomShape`] comes out:
//!
//! 1. [`PlaneClusterer`] groups vertex samples into running-mean [`Plane`]s by
//!    growing regions over the adjacency graph, then merges duplicates.
//! 2. [`RoomReconstructor`] classifies planes as floor, ceiling or wall, pairs
//!    opposing walls and intersects them into eight canonically ordered
//!    corners.

pub mod categorize;
pub mod cluster;
pub mod error;
pub mod plane;
pub mod reconstruct;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

pub use categorize::SampleCategories;
pub use cluster::{ClusterConfig, PlaneClusterer};
pub use error::{Error, Result};
pub use plane::{Plane, WallExtent};
pub use reconstruct::{
    has_canonical_winding, normalize_winding, PlaneClasses, ReconstructionConfig,
    RoomReconstructor, RoomShape,
};
