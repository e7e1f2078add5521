// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sample adjacency graph for region growing.
//!
//! Builds a graph from triangle meshes where:
//! - **Nodes** = canonical surface samples, one per quantized vertex position
//! - **Edges** = triangle sides connecting two samples
//!
//! Nodes live in a slot map; iteration follows insertion order so every
//! traversal over the graph is deterministic.

use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use smallvec::SmallVec;

use roomscan_core::{Line, MeshBuffers, DEFAULT_QUANTUM};

use crate::error::{Error, Result};
use crate::keys::NodeKey;
use crate::spatial::QuantizationIndex;

/// A node in the adjacency graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// The first sample seen at this quantized position.
    pub sample: Line,
    /// Adjacent nodes, without duplicates.
    pub neighbors: SmallVec<[NodeKey; 8]>,
}

/// Undirected graph over quantized surface samples.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    nodes: SlotMap<NodeKey, GraphNode>,
    /// Insertion order of node keys.
    order: Vec<NodeKey>,
    index: QuantizationIndex,
    edge_count: usize,
}

impl AdjacencyGraph {
    /// Creates an empty graph with millimetre quantization.
    pub fn new() -> Self {
        Self::with_quantum(DEFAULT_QUANTUM)
    }

    /// Creates an empty graph with a custom quantization cell size.
    pub fn with_quantum(quantum: f64) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            order: Vec::new(),
            index: QuantizationIndex::new(quantum),
            edge_count: 0,
        }
    }

    /// Builds a graph from one mesh.
    pub fn from_mesh(mesh: &MeshBuffers, quantum: f64) -> Result<Self> {
        let mut graph = Self::with_quantum(quantum);
        graph.add_mesh(mesh)?;
        Ok(graph)
    }

    // =========================================================================
    // Graph mutation
    // =========================================================================

    /// Returns the node for the sample's quantized position, creating it if
    /// the position is new. Idempotent: the first sample at a position wins.
    pub fn add_node(&mut self, sample: Line) -> NodeKey {
        let nodes = &mut self.nodes;
        let order = &mut self.order;
        self.index.get_or_insert_with(&sample.origin, || {
            let key = nodes.insert(GraphNode {
                sample,
                neighbors: SmallVec::new(),
            });
            order.push(key);
            key
        })
    }

    /// Connects two nodes in both directions. Duplicate edges and self loops
    /// are ignored.
    pub fn add_undirected_edge(&mut self, a: NodeKey, b: NodeKey) -> Result<()> {
        if !self.nodes.contains_key(a) {
            return Err(Error::NodeNotFound(a));
        }
        if !self.nodes.contains_key(b) {
            return Err(Error::NodeNotFound(b));
        }
        if a == b || self.nodes[a].neighbors.contains(&b) {
            return Ok(());
        }
        self.nodes[a].neighbors.push(b);
        self.nodes[b].neighbors.push(a);
        self.edge_count += 1;
        Ok(())
    }

    /// Adds every vertex of `mesh` as a sample and connects the three vertices
    /// of each triangle pairwise.
    ///
    /// Vertices with a zero-length normal carry no orientation and are left
    /// out, together with their triangle sides.
    pub fn add_mesh(&mut self, mesh: &MeshBuffers) -> Result<()> {
        mesh.validate()?;
        if mesh.is_empty() {
            return Ok(());
        }
        if !mesh.has_normals() {
            return Err(Error::MissingNormals);
        }

        let keys: Vec<Option<NodeKey>> = (0..mesh.vertex_count())
            .map(|i| {
                let normal = mesh.normal(i).try_normalize(1e-12)?;
                Some(self.add_node(Line::new(mesh.position(i), normal)))
            })
            .collect();

        for [a, b, c] in mesh.triangles() {
            let (ka, kb, kc) = (keys[a as usize], keys[b as usize], keys[c as usize]);
            for (x, y) in [(ka, kb), (kb, kc), (kc, ka)] {
                if let (Some(x), Some(y)) = (x, y) {
                    self.add_undirected_edge(x, y)?;
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Graph accessors
    // =========================================================================

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.order.iter().copied()
    }

    pub fn node(&self, key: NodeKey) -> Option<&GraphNode> {
        self.nodes.get(key)
    }

    /// Sample stored at a node.
    pub fn sample(&self, key: NodeKey) -> Option<&Line> {
        self.nodes.get(key).map(|n| &n.sample)
    }

    /// Neighbors of a node; empty for unknown keys.
    pub fn neighbors(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(key)
            .map(|n| n.neighbors.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the number of neighbors of a node.
    pub fn degree(&self, key: NodeKey) -> usize {
        self.neighbors(key).len()
    }

    /// Node at the quantized position of `sample`, if any.
    pub fn find(&self, sample: &Line) -> Option<NodeKey> {
        self.index.get(&sample.origin)
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Depth-first region growing from `start` with an explicit stack.
    ///
    /// `start` is marked visited and always part of the region. Each unvisited
    /// neighbor reached is offered to `accept`; accepted nodes are marked
    /// visited and expanded, rejected ones stay unvisited so another region
    /// may claim them later. Returns the region in visit order.
    pub fn grow_region<F>(
        &self,
        start: NodeKey,
        visited: &mut FxHashSet<NodeKey>,
        mut accept: F,
    ) -> Vec<NodeKey>
    where
        F: FnMut(NodeKey, &Line) -> bool,
    {
        let mut region = Vec::new();
        if !self.nodes.contains_key(start) || !visited.insert(start) {
            return region;
        }

        let mut stack = vec![start];
        while let Some(key) = stack.pop() {
            region.push(key);
            for &neighbor in self.neighbors(key) {
                if visited.contains(&neighbor) {
                    continue;
                }
                let Some(node) = self.nodes.get(neighbor) else {
                    continue;
                };
                if accept(neighbor, &node.sample) {
                    visited.insert(neighbor);
                    stack.push(neighbor);
                }
            }
        }
        region
    }

    /// Finds connected components, each in visit order.
    pub fn connected_components(&self) -> Vec<Vec<NodeKey>> {
        let mut visited = FxHashSet::default();
        let mut components = Vec::new();
        for start in self.keys() {
            if visited.contains(&start) {
                continue;
            }
            components.push(self.grow_region(start, &mut visited, |_, _| true));
        }
        components
    }

    /// Checks if the graph is connected (at most one component).
    pub fn is_connected(&self) -> bool {
        self.connected_components().len() <= 1
    }
}
