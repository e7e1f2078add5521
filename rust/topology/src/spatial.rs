// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Quantization index mapping grid cells to canonical nodes.
//!
//! The grid divides space into cubic cells of side `quantum`. Two positions
//! in the same cell are the same vertex as far as the graph is concerned.

use rustc_hash::FxHashMap;

use roomscan_core::{Point3, QuantizedPoint, DEFAULT_QUANTUM};

use crate::keys::NodeKey;

/// Grid-cell hash from quantized position to node key.
#[derive(Debug, Clone)]
pub struct QuantizationIndex {
    quantum: f64,
    cells: FxHashMap<QuantizedPoint, NodeKey>,
}

impl Default for QuantizationIndex {
    fn default() -> Self {
        Self::new(DEFAULT_QUANTUM)
    }
}

impl QuantizationIndex {
    /// Creates an empty index with the given cell size.
    pub fn new(quantum: f64) -> Self {
        Self {
            quantum,
            cells: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn quantum(&self) -> f64 {
        self.quantum
    }

    /// Grid cell of a position.
    #[inline]
    pub fn cell_of(&self, point: &Point3<f64>) -> QuantizedPoint {
        QuantizedPoint::from_point(point, self.quantum)
    }

    /// Node registered for the cell containing `point`.
    #[inline]
    pub fn get(&self, point: &Point3<f64>) -> Option<NodeKey> {
        self.cells.get(&self.cell_of(point)).copied()
    }

    /// Returns the node already registered for the cell, or registers the one
    /// produced by `make`.
    pub fn get_or_insert_with(
        &mut self,
        point: &Point3<f64>,
        make: impl FnOnce() -> NodeKey,
    ) -> NodeKey {
        let cell = self.cell_of(point);
        *self.cells.entry(cell).or_insert_with(make)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
