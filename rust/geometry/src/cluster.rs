// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plane clustering.
//!
//! Two ways of grouping samples into planes:
//!
//! - **Greedy-linear**: each sample joins the first plane that accepts it.
//! - **Flood fill**: region growing over the [`AdjacencyGraph`], so a plane
//!   only absorbs samples reachable through mesh connectivity.
//!
//! Both are followed by [`PlaneClusterer::merge`], which folds planes that
//! ended up describing the same surface.

use std::cmp::Reverse;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use roomscan_core::{Line, MeshBuffers, DEFAULT_ANGLE_EPSILON_DEG, DEFAULT_QUANTUM};
use roomscan_topology::AdjacencyGraph;

use crate::error::Result;
use crate::plane::Plane;

/// Clustering thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Maximum angle between a sample normal and the plane normal.
    pub max_orientation_difference_deg: f64,
    /// Maximum absolute distance of a sample from the plane.
    pub max_distance_to_plane: f64,
    /// Grid size used to collapse shared vertices into one graph node.
    pub vertex_quantum: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_orientation_difference_deg: DEFAULT_ANGLE_EPSILON_DEG,
            max_distance_to_plane: 0.05,
            vertex_quantum: DEFAULT_QUANTUM,
        }
    }
}

/// Groups oriented samples into planes.
#[derive(Debug, Clone, Default)]
pub struct PlaneClusterer {
    config: ClusterConfig,
}

impl PlaneClusterer {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Index of the first plane accepting `sample`.
    fn find_fitting(&self, planes: &[Plane], sample: &Line) -> Option<usize> {
        planes.iter().position(|p| p.accepts(sample, &self.config))
    }

    /// Each sample joins the first accepting plane, otherwise starts a new one.
    pub fn greedy_linear<I>(&self, samples: I) -> Vec<Plane>
    where
        I: IntoIterator<Item = Line>,
    {
        let mut planes: Vec<Plane> = Vec::new();
        for sample in samples {
            match self.find_fitting(&planes, &sample) {
                Some(i) => planes[i].add(sample),
                None => planes.push(Plane::new(sample)),
            }
        }
        planes
    }

    /// Region growing over the adjacency graph.
    ///
    /// For every unvisited node: find or create a fitting plane, then absorb
    /// connected unvisited neighbors while they fit that same plane.
    pub fn flood_fill(&self, graph: &AdjacencyGraph) -> Vec<Plane> {
        let mut planes: Vec<Plane> = Vec::new();
        let mut visited = FxHashSet::default();

        for start in graph.keys() {
            if visited.contains(&start) {
                continue;
            }
            let Some(&seed) = graph.sample(start) else {
                continue;
            };

            let index = match self.find_fitting(&planes, &seed) {
                Some(i) => {
                    planes[i].add(seed);
                    i
                }
                None => {
                    planes.push(Plane::new(seed));
                    planes.len() - 1
                }
            };

            let plane = &mut planes[index];
            graph.grow_region(start, &mut visited, |_, sample| {
                if plane.accepts(sample, &self.config) {
                    plane.add(*sample);
                    true
                } else {
                    false
                }
            });
        }

        tracing::debug!(
            nodes = graph.node_count(),
            planes = planes.len(),
            "Flood fill complete"
        );
        planes
    }

    /// Folds planes into larger ones that accept their representative line.
    ///
    /// Passes repeat until nothing folds, so merging an already merged set is
    /// a no-op. The result is sorted by member count, descending.
    pub fn merge(&self, mut planes: Vec<Plane>) -> Vec<Plane> {
        loop {
            planes.sort_by_key(|p| Reverse(p.count()));

            let mut accepted: Vec<Plane> = Vec::with_capacity(planes.len());
            let mut folded = false;
            for plane in planes {
                let representative = plane.representative();
                match self.find_fitting(&accepted, &representative) {
                    Some(i) => {
                        accepted[i].absorb(plane);
                        folded = true;
                    }
                    None => accepted.push(plane),
                }
            }

            planes = accepted;
            if !folded {
                break;
            }
        }
        planes.sort_by_key(|p| Reverse(p.count()));
        planes
    }

    /// Flood fill followed by merge.
    pub fn cluster(&self, graph: &AdjacencyGraph) -> Vec<Plane> {
        self.merge(self.flood_fill(graph))
    }

    /// Builds one adjacency graph over all meshes and clusters it.
    ///
    /// Vertices shared between meshes collapse into a single node.
    pub fn cluster_meshes<'a, I>(&self, meshes: I) -> Result<Vec<Plane>>
    where
        I: IntoIterator<Item = &'a MeshBuffers>,
    {
        let mut graph = AdjacencyGraph::with_quantum(self.config.vertex_quantum);
        for mesh in meshes {
            graph.add_mesh(mesh)?;
        }
        let planes = self.cluster(&graph);
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            planes = planes.len(),
            "Clustered mesh samples into planes"
        );
        Ok(planes)
    }
}
