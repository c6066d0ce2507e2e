// Copyright 2024 Nathan Hoos
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The state register: a content-addressed cache from a frozen node's structural
//! fingerprint to the address it was already written at, so that freezing an equivalent
//! state again reuses the existing bytes instead of duplicating them.
//!
//! The register is owned exclusively by one [`crate::builder::Builder`] for the duration
//! of a build, so it is a plain capacity-bounded map with no locking: nothing else can
//! ever observe or mutate it concurrently.

use crate::environment::REGISTER_CAPACITY;
use crate::node::{Addr, NodeFingerprint};
use rustc_hash::FxHashMap;

pub struct Register {
    entries: FxHashMap<NodeFingerprint, Addr>,
    capacity: usize,
}

impl Register {
    pub fn new() -> Self {
        Register::with_capacity(*REGISTER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Register {
            entries: FxHashMap::default(),
            capacity,
        }
    }

    /// Looks up an existing address for `fp`, if one was registered.
    pub fn get(&self, fp: &NodeFingerprint) -> Option<Addr> {
        self.entries.get(fp).copied()
    }

    /// Registers `addr` as the canonical location of `fp`'s structural equivalence
    /// class, unless the register is already at capacity. Once full, the register stops
    /// accepting new entries but keeps serving lookups against what it already holds;
    /// this only affects how much suffix sharing later states get, never correctness.
    pub fn insert(&mut self, fp: NodeFingerprint, addr: Addr) {
        if self.entries.len() >= self.capacity {
            return;
        }
        self.entries.insert(fp, addr);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for Register {
    fn default() -> Self {
        Register::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TransientNode;

    #[test]
    fn hit_after_insert() {
        let mut reg = Register::with_capacity(16);
        let node = TransientNode::new();
        let fp = node.fingerprint();
        assert!(reg.get(&fp).is_none());
        reg.insert(fp.clone(), 7);
        assert_eq!(reg.get(&fp), Some(7));
    }

    #[test]
    fn capacity_bound_stops_new_inserts_but_keeps_serving_old_ones() {
        let mut reg = Register::with_capacity(1);
        let a = TransientNode::new();
        let mut b = TransientNode::new();
        b.is_final = true;
        reg.insert(a.fingerprint(), 1);
        reg.insert(b.fingerprint(), 2);
        assert_eq!(reg.get(&a.fingerprint()), Some(1));
        assert_eq!(reg.get(&b.fingerprint()), None);
    }
}
