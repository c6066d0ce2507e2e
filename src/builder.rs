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

//! The streaming builder: consumes sorted, distinct keys one at a time and emits a
//! minimal deterministic transducer.
//!
//! `unfinished` is a stack mirroring the path of the previous key. Frame `d` is the state
//! reached after consuming `d` bytes of that key. Every frame but the deepest holds an
//! `open` edge to the next frame down, not yet closed into `transitions` because its
//! target hasn't been frozen (the child might still grow). `push` closes exactly the
//! frames whose subtree can no longer change — those strictly below the new key's common
//! prefix with the previous one — freezing each through the register, then extends the
//! stack with fresh frames for the new key's suffix.

use crate::environment::VERBOSE;
use crate::error::{Error, Result};
use crate::node::{Addr, Transition, TransientNode};
use crate::output::{self, Output};
use crate::register::Register;

const MAGIC: u32 = 0xD0CE_1157;
const VERSION: u8 = 1;
pub const FOOTER_LEN: usize = 4 + 1 + 8 + 8 + 8;

/// Streaming FST builder. Construct with [`Builder::new`], call [`Builder::push`] for
/// each key in strictly ascending order, then [`Builder::finish`] to get the image.
pub struct Builder {
    buf: Vec<u8>,
    unfinished: Vec<TransientNode>,
    register: Register,
    last_key: Option<Vec<u8>>,
    key_count: u64,
}

impl Builder {
    pub fn new() -> Self {
        Builder {
            buf: Vec::new(),
            unfinished: vec![TransientNode::new()],
            register: Register::new(),
            last_key: None,
            key_count: 0,
        }
    }

    /// Pushes `(key, value)`. `key` must be strictly greater than the previously pushed
    /// key (or this is the first push). For the set variant, always pass `0`.
    pub fn push(&mut self, key: &[u8], value: Output) -> Result<()> {
        self.check_order(key)?;

        let lcp = match &self.last_key {
            Some(prev) => common_prefix_len(prev, key),
            None => 0,
        };

        let remaining = self.shrink_shared_prefix(key, lcp, value)?;
        self.close_divergent_suffix(lcp)?;
        self.extend_with_suffix(key, lcp, remaining)?;

        self.last_key = Some(key.to_vec());
        self.key_count += 1;
        if *VERBOSE {
            eprintln!("ducer_core::builder: pushed key #{} ({} bytes)", self.key_count, key.len());
        }
        Ok(())
    }

    fn check_order(&self, key: &[u8]) -> Result<()> {
        if let Some(prev) = &self.last_key {
            if key == prev.as_slice() {
                return Err(Error::DuplicateKey { key: key.to_vec() });
            }
            if key < prev.as_slice() {
                return Err(Error::Order {
                    previous: prev.clone(),
                    attempted: key.to_vec(),
                });
            }
        }
        Ok(())
    }

    /// Walks the still-open edges shared with `key` up to `lcp`, shrinking each to the
    /// amount common with `value` and pushing the residual down into the child it leads
    /// to. Returns the portion of `value` not yet accounted for by any shared edge.
    fn shrink_shared_prefix(&mut self, key: &[u8], lcp: usize, value: Output) -> Result<Output> {
        let mut out = value;
        let mut i = 0;
        while i < lcp {
            let (byte, edge_out) = match self.unfinished[i].open {
                Some(pair) => pair,
                None => break,
            };
            if byte != key[i] {
                break;
            }
            let common = output::common_prefix(edge_out, out);
            let residual = output::subtract_prefix(edge_out, common);
            if residual != 0 {
                self.push_into_child(i + 1, residual)?;
            }
            self.unfinished[i].open = Some((byte, common));
            out = output::subtract_prefix(out, common);
            i += 1;
        }
        Ok(out)
    }

    /// Adds `amount` to every exit of frame `depth`: its final output (if final), every
    /// already-closed transition, and its still-open edge. Compensates for having
    /// shrunk the edge leading into this frame by exactly `amount`.
    fn push_into_child(&mut self, depth: usize, amount: Output) -> Result<()> {
        let frame = &mut self.unfinished[depth];
        if frame.is_final {
            frame.final_output = checked_add(frame.final_output, amount)?;
        }
        for t in frame.transitions.iter_mut() {
            t.out = checked_add(t.out, amount)?;
        }
        if let Some((b, o)) = frame.open {
            frame.open = Some((b, checked_add(o, amount)?));
        }
        Ok(())
    }

    /// Freezes every frame strictly deeper than `lcp`, attaching each as the closed
    /// transition on its parent.
    fn close_divergent_suffix(&mut self, lcp: usize) -> Result<()> {
        while self.unfinished.len() > lcp + 1 {
            debug_assert!(self.unfinished.len() > lcp + 1, "loop guard holds a frame above lcp");
            let node = match self.unfinished.pop() {
                Some(node) => node,
                None => break,
            };
            let addr = self.freeze(node);

            debug_assert!(!self.unfinished.is_empty(), "root is never popped");
            let parent = match self.unfinished.last_mut() {
                Some(parent) => parent,
                None => break,
            };

            debug_assert!(parent.open.is_some(), "a popped frame was reached through an open edge on its parent");
            if let Some((byte, out)) = parent.open.take() {
                parent.transitions.push(Transition { byte, out, target: addr });
            }
        }
        Ok(())
    }

    /// Appends fresh frames for `key[lcp..]`, placing `remaining` on the first new edge
    /// and `0` on the rest, then marks the new leaf final (or, if `key` was fully
    /// consumed by shared edges — only possible for the empty key as the very first
    /// push — marks the existing frame at `lcp` final directly).
    fn extend_with_suffix(&mut self, key: &[u8], lcp: usize, remaining: Output) -> Result<()> {
        if key.len() == lcp {
            debug_assert_eq!(lcp, 0, "only the empty key can close with no new suffix");
            let root = &mut self.unfinished[lcp];
            root.is_final = true;
            root.final_output = remaining;
            return Ok(());
        }
        for (offset, &b) in key[lcp..].iter().enumerate() {
            let depth = lcp + offset;
            let edge_out = if offset == 0 { remaining } else { 0 };
            self.unfinished[depth].open = Some((b, edge_out));
            self.unfinished.push(TransientNode::new());
        }
        debug_assert!(!self.unfinished.is_empty(), "just pushed");
        if let Some(leaf) = self.unfinished.last_mut() {
            leaf.is_final = true;
            leaf.final_output = 0;
        }
        Ok(())
    }

    /// Hash-conses `node` against the register, freezing it to a fresh address only on
    /// a miss.
    fn freeze(&mut self, node: TransientNode) -> Addr {
        let fp = node.fingerprint();
        if let Some(addr) = self.register.get(&fp) {
            return addr;
        }
        let addr = node.freeze(&mut self.buf);
        self.register.insert(fp, addr);
        addr
    }

    /// Closes every remaining open edge, freezes the root, writes the footer, and
    /// returns the completed byte image.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.close_divergent_suffix(0)?;
        debug_assert_eq!(self.unfinished.len(), 1, "root always present after closing to depth 0");
        let root = self.unfinished.pop().unwrap_or_default();
        debug_assert!(self.unfinished.is_empty());
        let root_addr = self.freeze(root);

        let checksum = fxhash_checksum(&self.buf);
        write_footer(&mut self.buf, self.key_count, root_addr, checksum);

        if *VERBOSE {
            eprintln!(
                "ducer_core::builder: finished, {} keys, {} bytes, {} register entries",
                self.key_count,
                self.buf.len(),
                self.register.len()
            );
        }
        Ok(self.buf)
    }

    pub fn len(&self) -> u64 {
        self.key_count
    }

    pub fn is_empty(&self) -> bool {
        self.key_count == 0
    }
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

fn checked_add(a: Output, b: Output) -> Result<Output> {
    a.checked_add(b)
        .ok_or_else(|| Error::Value(format!("output overflow: {} + {}", a, b)))
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

fn fxhash_checksum(data: &[u8]) -> u64 {
    use rustc_hash::FxHasher;
    use std::hash::Hasher;
    let mut hasher = FxHasher::default();
    hasher.write(data);
    hasher.finish()
}

fn write_footer(buf: &mut Vec<u8>, key_count: u64, root_addr: Addr, checksum: u64) {
    use byteorder::{ByteOrder, LittleEndian};
    let mut footer = [0u8; FOOTER_LEN];
    LittleEndian::write_u32(&mut footer[0..4], MAGIC);
    footer[4] = VERSION;
    LittleEndian::write_u64(&mut footer[5..13], key_count);
    LittleEndian::write_u64(&mut footer[13..21], root_addr);
    LittleEndian::write_u64(&mut footer[21..29], checksum);
    buf.extend_from_slice(&footer);
}

/// Parses the trailing footer of a completed image. Exposed to [`crate::reader`].
pub(crate) struct Footer {
    pub key_count: u64,
    pub root_addr: Addr,
    pub checksum: u64,
    pub body_len: usize,
}

pub(crate) fn read_footer(data: &[u8]) -> Result<Footer> {
    use byteorder::{ByteOrder, LittleEndian};
    if data.len() < FOOTER_LEN {
        return Err(Error::Format("image shorter than footer".into()));
    }
    let body_len = data.len() - FOOTER_LEN;
    let footer = &data[body_len..];
    let magic = LittleEndian::read_u32(&footer[0..4]);
    if magic != MAGIC {
        return Err(Error::Format(format!("bad magic: {:#x}", magic)));
    }
    let version = footer[4];
    if version != VERSION {
        return Err(Error::Format(format!("unsupported version: {}", version)));
    }
    let key_count = LittleEndian::read_u64(&footer[5..13]);
    let root_addr = LittleEndian::read_u64(&footer[13..21]);
    let checksum = LittleEndian::read_u64(&footer[21..29]);
    let actual = fxhash_checksum(&data[..body_len]);
    if actual != checksum {
        return Err(Error::Format("checksum mismatch".into()));
    }
    Ok(Footer { key_count, root_addr, checksum, body_len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;

    fn build(pairs: &[(&[u8], u64)]) -> Vec<u8> {
        let mut b = Builder::new();
        for (k, v) in pairs {
            b.push(k, *v).unwrap();
        }
        b.finish().unwrap()
    }

    #[test]
    fn rejects_out_of_order_and_duplicate_keys() {
        let mut b = Builder::new();
        b.push(b"b", 1).unwrap();
        assert!(matches!(b.push(b"a", 1), Err(Error::Order { .. })));
        assert!(matches!(b.push(b"b", 1), Err(Error::DuplicateKey { .. })));
    }

    #[test]
    fn empty_builder_round_trips() {
        let image = build(&[]);
        let reader = Reader::new(image).unwrap();
        assert_eq!(reader.len(), 0);
        assert!(reader.get(b"anything").unwrap().is_none());
    }

    #[test]
    fn single_key_round_trips() {
        let image = build(&[(b"key1", 123)]);
        let reader = Reader::new(image).unwrap();
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.get(b"key1").unwrap(), Some(123));
    }

    #[test]
    fn shared_prefix_keys_round_trip() {
        let image = build(&[(b"key1", 123), (b"key2", 456)]);
        let reader = Reader::new(image).unwrap();
        assert_eq!(reader.get(b"key1").unwrap(), Some(123));
        assert_eq!(reader.get(b"key2").unwrap(), Some(456));
        assert_eq!(reader.get(b"key3").unwrap(), None);
    }

    #[test]
    fn output_pushing_handles_shrinking_shared_value() {
        // "a" carries a larger value than "ab"; the shared prefix edge for "a" must
        // shrink to accommodate "ab" without corrupting "a"'s own value.
        let image = build(&[(b"a", 100), (b"ab", 5), (b"b", 50)]);
        let reader = Reader::new(image).unwrap();
        assert_eq!(reader.get(b"a").unwrap(), Some(100));
        assert_eq!(reader.get(b"ab").unwrap(), Some(5));
        assert_eq!(reader.get(b"b").unwrap(), Some(50));
    }

    #[test]
    fn empty_key_as_sole_entry() {
        let image = build(&[(b"", 7)]);
        let reader = Reader::new(image).unwrap();
        assert_eq!(reader.get(b"").unwrap(), Some(7));
    }
}
