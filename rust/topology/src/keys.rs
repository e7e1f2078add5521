// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node key type for arena-based graph storage.
//!
//! Keys are created by `slotmap::SlotMap` and stay valid across insertions
//! (generational indices), so plane clusters can hold them across passes.

use slotmap::new_key_type;

new_key_type! {
    /// Key for a graph node (one canonical sample per quantized position).
    pub struct NodeKey;
}
