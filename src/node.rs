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

//! The node model: [`TransientNode`] is the in-memory representation used while the
//! builder is still extending a state's transition list; [`Node`] is a zero-copy view
//! over a frozen node already written into the image.
//!
//! Wire layout of a frozen node, written starting at its own address `addr`:
//!
//! ```text
//! header: u8         bit7 = is_final, bit6 = has nonzero final output, bits0-5 = transition
//!                     count (0..=62), or 0x3F meaning "count follows as a uvarint"
//! [uvarint]          final output, only if bit6 is set
//! [uvarint]          transition count, only if bits0-5 == 0x3F
//! transition[0..count], each:
//!     byte: u8        input byte
//!     outlen: u8      0..=8, length of the output field
//!     output: [u8; outlen]   little-endian, minimal width
//!     delta: uvarint  addr - target_addr (targets are always written before their
//!                     referencing parent, so this is always positive)
//! ```
//!
//! Transitions are written in ascending byte order, matching the invariant on
//! [`TransientNode::transitions`].

use crate::bytes::{read_minimal_u64, read_uvarint, write_minimal_u64, write_uvarint};
use crate::error::{Error, Result};
use crate::output::Output;
use smallvec::SmallVec;

/// Byte offset of a frozen node within the image body (not including the footer).
pub type Addr = u64;

/// An outgoing edge of a transient state under construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub byte: u8,
    pub out: Output,
    pub target: Addr,
}

/// A state still being built: its transition list grows as keys sharing its prefix are
/// pushed, and it is frozen (see [`crate::register`]) once the builder determines no
/// further key can extend it.
#[derive(Clone, Debug, Default)]
pub struct TransientNode {
    pub is_final: bool,
    pub final_output: Output,
    pub transitions: SmallVec<[Transition; 4]>,
    /// The edge to whatever child is currently being extended, not yet closed into
    /// `transitions` because that child hasn't been frozen yet. `None` once the node has
    /// no unfrozen child (a freshly pushed leaf, or a node fully closed by the builder).
    pub open: Option<(u8, Output)>,
}

impl TransientNode {
    pub fn new() -> Self {
        TransientNode::default()
    }

    /// Encodes this node as a frozen record at the end of `buf`. Returns the node's own
    /// address (the offset its header byte was written at), which becomes its `Addr` for
    /// any parent transition that targets it.
    ///
    /// Panics (debug builds only) if `open` hasn't been closed into `transitions` yet;
    /// the builder never freezes a node before doing so.
    pub fn freeze(&self, buf: &mut Vec<u8>) -> Addr {
        debug_assert!(self.open.is_none(), "freezing a node with an open edge");
        let addr = buf.len() as Addr;
        let count = self.transitions.len();
        let has_output = self.is_final && self.final_output != 0;

        let mut header = 0u8;
        if self.is_final {
            header |= 0x80;
        }
        if has_output {
            header |= 0x40;
        }
        if count < 0x3F {
            header |= count as u8;
        } else {
            header |= 0x3F;
        }
        buf.push(header);

        if has_output {
            write_uvarint(buf, self.final_output);
        }
        if count >= 0x3F {
            write_uvarint(buf, count as u64);
        }

        for t in &self.transitions {
            buf.push(t.byte);
            let mut out_buf = Vec::with_capacity(8);
            let n = write_minimal_u64(&mut out_buf, t.out);
            buf.push(n);
            buf.extend_from_slice(&out_buf);
            debug_assert!(t.target <= addr, "transition target must already be frozen");
            write_uvarint(buf, addr - t.target);
        }

        addr
    }

    /// The fingerprint the register hashes/compares on: finality, final output, and the
    /// ordered (byte, output, target) triples. Two transient nodes with equal
    /// fingerprints are the equivalent frozen states described in the data model.
    pub fn fingerprint(&self) -> NodeFingerprint {
        NodeFingerprint {
            is_final: self.is_final,
            final_output: if self.is_final { self.final_output } else { 0 },
            transitions: self.transitions.clone(),
        }
    }
}

/// A hashable, comparable summary of a [`TransientNode`]'s structural identity, used as
/// the register's key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeFingerprint {
    pub is_final: bool,
    pub final_output: Output,
    pub transitions: SmallVec<[Transition; 4]>,
}

impl std::hash::Hash for Transition {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.byte.hash(state);
        self.out.hash(state);
        self.target.hash(state);
    }
}

/// A read-only, zero-copy view of a frozen node living inside a byte image.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    data: &'a [u8],
    pub addr: Addr,
    pub is_final: bool,
    pub final_output: Output,
    pub count: u64,
    transitions_start: usize,
}

impl<'a> Node<'a> {
    /// Parses the node whose header byte sits at `data[addr as usize]`.
    pub fn decode(data: &'a [u8], addr: Addr) -> Result<Node<'a>> {
        let start = addr as usize;
        let header = *data
            .get(start)
            .ok_or_else(|| Error::Format(format!("node address {} out of bounds", addr)))?;
        let is_final = header & 0x80 != 0;
        let has_output = header & 0x40 != 0;
        let mut pos = start + 1;

        let final_output = if has_output {
            let (v, used) = read_uvarint(&data[pos..])?;
            pos += used;
            v
        } else {
            0
        };

        let count_field = header & 0x3F;
        let count = if count_field == 0x3F {
            let (v, used) = read_uvarint(&data[pos..])?;
            pos += used;
            v
        } else {
            count_field as u64
        };

        Ok(Node {
            data,
            addr,
            is_final,
            final_output,
            count,
            transitions_start: pos,
        })
    }

    /// A forward cursor over this node's transitions. Each call to `next` decodes
    /// exactly one transition in constant extra memory.
    pub fn transitions(&self) -> NodeTransitionIter<'a> {
        NodeTransitionIter {
            data: self.data,
            node_addr: self.addr,
            remaining: self.count,
            pos: self.transitions_start,
        }
    }

    /// Scans for the transition labeled `byte`, stopping as soon as a transition with a
    /// strictly greater byte is seen (transitions are stored in ascending order).
    pub fn find_transition(&self, byte: u8) -> Result<Option<Transition>> {
        let mut it = self.transitions();
        while let Some(t) = it.next()? {
            if t.byte == byte {
                return Ok(Some(t));
            }
            if t.byte > byte {
                break;
            }
        }
        Ok(None)
    }
}

/// Forward-only, constant-memory iterator over a node's transitions. `Copy` so seek
/// logic can cheaply probe "what's the next transition" without committing to consuming
/// it.
#[derive(Clone, Copy)]
pub struct NodeTransitionIter<'a> {
    data: &'a [u8],
    node_addr: Addr,
    remaining: u64,
    pos: usize,
}

impl<'a> NodeTransitionIter<'a> {
    pub fn next(&mut self) -> Result<Option<Transition>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| Error::Format("truncated transition".into()))?;
        let outlen = *self
            .data
            .get(self.pos + 1)
            .ok_or_else(|| Error::Format("truncated transition".into()))?;
        let out_start = self.pos + 2;
        let out = read_minimal_u64(&self.data[out_start..], outlen)?;
        let delta_start = out_start + outlen as usize;
        let (delta, used) = read_uvarint(&self.data[delta_start..])?;
        self.pos = delta_start + used;
        self.remaining -= 1;

        if delta > self.node_addr {
            return Err(Error::Format("transition delta exceeds node address".into()));
        }
        Ok(Some(Transition {
            byte,
            out,
            target: self.node_addr - delta,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freeze_and_decode_leaf_node() {
        let node = TransientNode {
            is_final: true,
            final_output: 42,
            transitions: SmallVec::new(),
            open: None,
        };
        let mut buf = Vec::new();
        let addr = node.freeze(&mut buf);
        let decoded = Node::decode(&buf, addr).unwrap();
        assert!(decoded.is_final);
        assert_eq!(decoded.final_output, 42);
        assert_eq!(decoded.count, 0);
    }
}
