// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Synthetic room meshes.
//!
//! Axis-aligned boxes seen from the inside: every face normal points into the
//! room, the way a depth sensor standing in the room reports them. Each face
//! is a regular grid so vertex samples cover the whole surface.

use nalgebra::{Point3, Vector3};

use crate::mesh::MeshBuffers;

/// Which side of the box a face lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxFace {
    Floor,
    Ceiling,
    /// x = min.x
    WestWall,
    /// x = max.x
    EastWall,
    /// z = min.z
    NorthWall,
    /// z = max.z
    SouthWall,
}

impl BoxFace {
    pub const ALL: [BoxFace; 6] = [
        BoxFace::Floor,
        BoxFace::Ceiling,
        BoxFace::WestWall,
        BoxFace::EastWall,
        BoxFace::NorthWall,
        BoxFace::SouthWall,
    ];

    pub const WALLS: [BoxFace; 4] = [
        BoxFace::WestWall,
        BoxFace::EastWall,
        BoxFace::NorthWall,
        BoxFace::SouthWall,
    ];

    /// Normal pointing into the box.
    pub fn inward_normal(self) -> Vector3<f64> {
        match self {
            BoxFace::Floor => Vector3::y(),
            BoxFace::Ceiling => -Vector3::y(),
            BoxFace::WestWall => Vector3::x(),
            BoxFace::EastWall => -Vector3::x(),
            BoxFace::NorthWall => Vector3::z(),
            BoxFace::SouthWall => -Vector3::z(),
        }
    }
}

/// Grid mesh for one face of the box `[min, max]`.
pub fn box_face(min: Point3<f64>, max: Point3<f64>, face: BoxFace, subdivisions: u32) -> MeshBuffers {
    let d = max - min;
    let (origin, u, v) = match face {
        BoxFace::Floor => (min, Vector3::new(d.x, 0.0, 0.0), Vector3::new(0.0, 0.0, d.z)),
        BoxFace::Ceiling => (
            Point3::new(min.x, max.y, min.z),
            Vector3::new(d.x, 0.0, 0.0),
            Vector3::new(0.0, 0.0, d.z),
        ),
        BoxFace::WestWall => (min, Vector3::new(0.0, d.y, 0.0), Vector3::new(0.0, 0.0, d.z)),
        BoxFace::EastWall => (
            Point3::new(max.x, min.y, min.z),
            Vector3::new(0.0, d.y, 0.0),
            Vector3::new(0.0, 0.0, d.z),
        ),
        BoxFace::NorthWall => (min, Vector3::new(d.x, 0.0, 0.0), Vector3::new(0.0, d.y, 0.0)),
        BoxFace::SouthWall => (
            Point3::new(min.x, min.y, max.z),
            Vector3::new(d.x, 0.0, 0.0),
            Vector3::new(0.0, d.y, 0.0),
        ),
    };
    grid(origin, u, v, face.inward_normal(), subdivisions.max(1))
}

/// One mesh per face, in [`BoxFace::ALL`] order.
pub fn box_room_faces(min: Point3<f64>, max: Point3<f64>, subdivisions: u32) -> Vec<MeshBuffers> {
    BoxFace::ALL
        .iter()
        .map(|&face| box_face(min, max, face, subdivisions))
        .collect()
}

/// Closed inward-facing box: floor, ceiling and four walls.
pub fn box_room(min: Point3<f64>, max: Point3<f64>, subdivisions: u32) -> MeshBuffers {
    let mut mesh = MeshBuffers::new();
    for face in box_room_faces(min, max, subdivisions) {
        mesh.merge(&face);
    }
    mesh
}

/// The four walls only, used as a ray-test boundary.
pub fn box_walls(min: Point3<f64>, max: Point3<f64>, subdivisions: u32) -> MeshBuffers {
    let mut mesh = MeshBuffers::new();
    for face in BoxFace::WALLS {
        mesh.merge(&box_face(min, max, face, subdivisions));
    }
    mesh
}

fn grid(
    origin: Point3<f64>,
    u: Vector3<f64>,
    v: Vector3<f64>,
    normal: Vector3<f64>,
    subdivisions: u32,
) -> MeshBuffers {
    let n = subdivisions;
    let row = n + 1;
    let mut mesh = MeshBuffers::with_capacity((row * row) as usize, (n * n * 6) as usize);

    for j in 0..=n {
        for i in 0..=n {
            let p = origin + u * (i as f64 / n as f64) + v * (j as f64 / n as f64);
            mesh.add_vertex(p, normal);
        }
    }

    // Wind each quad so the geometric normal agrees with the stored one.
    let flip = u.cross(&v).dot(&normal) < 0.0;
    for j in 0..n {
        for i in 0..n {
            let a = j * row + i;
            let b = a + 1;
            let c = a + row + 1;
            let d = a + row;
            if flip {
                mesh.add_triangle(a, c, b);
                mesh.add_triangle(a, d, c);
            } else {
                mesh.add_triangle(a, b, c);
                mesh.add_triangle(a, c, d);
            }
        }
    }
    mesh
}
