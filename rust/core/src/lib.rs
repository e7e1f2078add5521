// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # RoomScan Core
//!
//! Geometric building blocks shared by every RoomScan crate:
//!
//! - **Predicates**: angular ("orientation-equal") and fuzzy positional
//!   comparisons. Floats are never compared for exact equality.
//! - **Samples**: [`Line`], an oriented surface sample (vertex position plus
//!   outward normal) whose hash collapses near-duplicates.
//! - **Planes**: signed distances, plane/plane and plane/plane/plane
//!   intersections that fail loudly on parallel input.
//! - **Rays**: [`Ray`], [`Aabb`] slab tests and triangle hits behind the
//!   [`RayTarget`] trait.
//! - **Meshes**: [`MeshBuffers`], the flat triangle/vertex/normal buffers
//!   delivered by the spatial-mapping sensor, plus synthetic room shapes.
//!
//! ## Coordinate convention
//!
//! Right-handed, metres, `+Y` is up. Floors face `+Y`, ceilings face `-Y`.
//!
//! ```rust
//! use roomscan_core::{orientation_equal, PlaneSurface, Point3, Vector3};
//!
//! assert!(orientation_equal(&Vector3::y(), &Vector3::new(0.0, 1.0, 0.01), 2.0));
//!
//! let floor = PlaneSurface::new(Point3::origin(), Vector3::y()).unwrap();
//! assert_eq!(floor.signed_distance(&Point3::new(3.0, 2.5, -1.0)), 2.5);
//! ```

pub mod error;
pub mod line;
pub mod mesh;
pub mod plane;
pub mod quantize;
pub mod ray;
pub mod shapes;
pub mod vector;

// Re-export nalgebra types for convenience
pub use nalgebra::{Isometry3, Point3, Rotation3, Unit, Vector3};

pub use error::{Error, Result};
pub use line::Line;
pub use mesh::MeshBuffers;
pub use plane::{intersect_three, PlaneSurface};
pub use quantize::{QuantizedPoint, DEFAULT_QUANTUM};
pub use ray::{ray_triangle, Aabb, Ray, RayTarget};
pub use shapes::BoxFace;
pub use vector::{
    angle_between_deg, fuzzy_equals, horizontal, is_horizontal, orientation_equal,
    parallel_either_sense, rotate_about_up, up, DEFAULT_ANGLE_EPSILON_DEG,
};
