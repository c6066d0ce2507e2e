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

//! Stream iterators: stateful, forward-only cursors over a depth-annotated stack of
//! (node, transition index, accumulated output) frames. [`Stream`] walks everything;
//! [`RangeStream`] seeds the stack at a lower bound and stops at an upper bound;
//! [`SearchStream`] walks a product automaton alongside the FST, pruning subtrees the
//! automaton can no longer match.
//!
//! None of these implement `std::iter::Iterator`: `next` borrows from the stream itself
//! to hand back an owned key, so the natural shape here is the lending-iterator
//! (`Streamer`) pattern used by the upstream `fst` crate rather than std's `Iterator`.

use crate::automaton::Automaton;
use crate::error::Result;
use crate::node::{Node, NodeTransitionIter, Transition};
use crate::output::Output;

struct Frame<'a> {
    node: Node<'a>,
    acc: Output,
    iter: NodeTransitionIter<'a>,
    emitted: bool,
}

fn push_frame<'a>(data: &'a [u8], stack: &mut Vec<Frame<'a>>, node: Node<'a>, acc: Output, emitted: bool) {
    let iter = node.transitions();
    stack.push(Frame { node, acc, iter, emitted });
}

/// An unbounded forward cursor over every key in an image, ascending.
pub struct Stream<'a> {
    data: &'a [u8],
    stack: Vec<Frame<'a>>,
    path: Vec<u8>,
}

impl<'a> Stream<'a> {
    pub(crate) fn new(data: &'a [u8], root_addr: crate::node::Addr) -> Result<Stream<'a>> {
        let root = Node::decode(data, root_addr)?;
        let mut stack = Vec::new();
        push_frame(data, &mut stack, root, 0, false);
        Ok(Stream { data, stack, path: Vec::new() })
    }

    /// Advances the cursor. `Ok(None)` once every key has been produced.
    pub fn next(&mut self) -> Result<Option<(Vec<u8>, Output)>> {
        loop {
            let frame = match self.stack.last_mut() {
                Some(f) => f,
                None => return Ok(None),
            };
            if !frame.emitted {
                frame.emitted = true;
                if frame.node.is_final {
                    let value = frame.acc + frame.node.final_output;
                    return Ok(Some((self.path.clone(), value)));
                }
            }
            let parent_acc = frame.acc;
            match frame.iter.next()? {
                Some(t) => self.descend(t, parent_acc)?,
                None => {
                    self.stack.pop();
                    self.path.pop();
                }
            }
        }
    }

    fn descend(&mut self, t: Transition, parent_acc: Output) -> Result<()> {
        let child = Node::decode(self.data, t.target)?;
        let acc = parent_acc + t.out;
        self.path.push(t.byte);
        push_frame(self.data, &mut self.stack, child, acc, false);
        Ok(())
    }
}

/// A half-open (or fully open) lower/upper bound on a key range.
#[derive(Clone, Debug)]
pub enum Bound {
    Unbounded,
    /// Inclusive: `ge` as a lower bound, `le` as an upper bound.
    Included(Vec<u8>),
    /// Exclusive: `gt` as a lower bound, `lt` as an upper bound.
    Excluded(Vec<u8>),
}

impl Bound {
    fn key(&self) -> Option<&[u8]> {
        match self {
            Bound::Unbounded => None,
            Bound::Included(k) | Bound::Excluded(k) => Some(k),
        }
    }
}

/// A forward cursor restricted to a lower/upper bound pair.
pub struct RangeStream<'a> {
    data: &'a [u8],
    stack: Vec<Frame<'a>>,
    path: Vec<u8>,
    upper: Bound,
    done: bool,
}

impl<'a> RangeStream<'a> {
    pub(crate) fn new(
        data: &'a [u8],
        root_addr: crate::node::Addr,
        lower: Bound,
        upper: Bound,
    ) -> Result<RangeStream<'a>> {
        let (stack, path) = match &lower {
            Bound::Unbounded => {
                let root = Node::decode(data, root_addr)?;
                let mut stack = Vec::new();
                push_frame(data, &mut stack, root, 0, false);
                (stack, Vec::new())
            }
            Bound::Included(k) => seek(data, root_addr, k, false)?,
            Bound::Excluded(k) => seek(data, root_addr, k, true)?,
        };
        Ok(RangeStream { data, stack, path, upper, done: false })
    }

    pub fn next(&mut self) -> Result<Option<(Vec<u8>, Output)>> {
        if self.done {
            return Ok(None);
        }
        loop {
            let frame = match self.stack.last_mut() {
                Some(f) => f,
                None => {
                    self.done = true;
                    return Ok(None);
                }
            };
            if !frame.emitted {
                frame.emitted = true;
                if frame.node.is_final {
                    let value = frame.acc + frame.node.final_output;
                    if within_upper(&self.path, &self.upper) {
                        return Ok(Some((self.path.clone(), value)));
                    } else {
                        self.done = true;
                        return Ok(None);
                    }
                }
            }
            let parent_acc = frame.acc;
            match frame.iter.next()? {
                Some(t) => {
                    let child = Node::decode(self.data, t.target)?;
                    let acc = parent_acc + t.out;
                    self.path.push(t.byte);
                    push_frame(self.data, &mut self.stack, child, acc, false);
                }
                None => {
                    self.stack.pop();
                    self.path.pop();
                }
            }
        }
    }
}

fn within_upper(path: &[u8], upper: &Bound) -> bool {
    match upper {
        Bound::Unbounded => true,
        Bound::Included(k) => path <= k.as_slice(),
        Bound::Excluded(k) => path < k.as_slice(),
    }
}

/// Fast-forwards to the first position `>= key` (or `> key` when `exclusive`), by
/// walking `key`'s bytes and, at each node, advancing its transition iterator past every
/// byte strictly less than the matching one — those subtrees sort entirely below the
/// bound and are skipped without being visited.
fn seek<'a>(
    data: &'a [u8],
    root_addr: crate::node::Addr,
    key: &[u8],
    exclusive: bool,
) -> Result<(Vec<Frame<'a>>, Vec<u8>)> {
    let mut stack = Vec::new();
    let mut path = Vec::new();
    let mut node = Node::decode(data, root_addr)?;
    let mut acc: Output = 0;

    for &b in key {
        let mut iter = node.transitions();
        let matched = loop {
            let probe = iter;
            let mut advance = probe;
            match advance.next()? {
                None => break None,
                Some(t) => {
                    if t.byte < b {
                        iter = advance;
                        continue;
                    } else if t.byte == b {
                        iter = advance;
                        break Some(t);
                    } else {
                        // t.byte > b: leave `iter` positioned before this transition so
                        // the main traversal visits it (and everything after).
                        iter = probe;
                        break None;
                    }
                }
            }
        };

        match matched {
            Some(t) => {
                stack.push(Frame { node, acc, iter, emitted: true });
                path.push(b);
                acc += t.out;
                node = Node::decode(data, t.target)?;
            }
            None => {
                stack.push(Frame { node, acc, iter, emitted: true });
                return Ok((stack, path));
            }
        }
    }

    // Matched every byte of `key` exactly; `node` is the state reached by `key` itself.
    push_frame(data, &mut stack, node, acc, exclusive);
    Ok((stack, path))
}

/// A forward cursor over only the keys an [`Automaton`] accepts, pruning subtrees its
/// `can_match` hint reports dead.
pub struct SearchStream<'a, A: Automaton> {
    data: &'a [u8],
    automaton: A,
    stack: Vec<(Frame<'a>, A::State)>,
    path: Vec<u8>,
}

impl<'a, A: Automaton> SearchStream<'a, A> {
    pub(crate) fn new(data: &'a [u8], root_addr: crate::node::Addr, automaton: A) -> Result<SearchStream<'a, A>> {
        let root = Node::decode(data, root_addr)?;
        let start = automaton.start();
        let mut stack = Vec::new();
        let iter = root.transitions();
        stack.push((Frame { node: root, acc: 0, iter, emitted: false }, start));
        Ok(SearchStream { data, automaton, stack, path: Vec::new() })
    }

    pub fn next(&mut self) -> Result<Option<(Vec<u8>, Output)>> {
        loop {
            let (frame, state) = match self.stack.last_mut() {
                Some(pair) => pair,
                None => return Ok(None),
            };
            if !frame.emitted {
                frame.emitted = true;
                if frame.node.is_final && self.automaton.is_match(state) {
                    let value = frame.acc + frame.node.final_output;
                    return Ok(Some((self.path.clone(), value)));
                }
            }
            let state = state.clone();
            let parent_acc = frame.acc;
            let next_transition = frame.iter.next()?;
            match next_transition {
                Some(t) => {
                    let next_state = self.automaton.accept(&state, t.byte);
                    if !self.automaton.can_match(&next_state) {
                        continue;
                    }
                    let child = Node::decode(self.data, t.target)?;
                    let acc = parent_acc + t.out;
                    self.path.push(t.byte);
                    let iter = child.transitions();
                    self.stack
                        .push((Frame { node: child, acc, iter, emitted: false }, next_state));
                }
                None => {
                    self.stack.pop();
                    self.path.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{Always, Never, Str};
    use crate::builder::Builder;
    use crate::reader::Reader;

    fn reader_for(pairs: &[(&[u8], u64)]) -> Reader {
        let mut b = Builder::new();
        for (k, v) in pairs {
            b.push(k, *v).unwrap();
        }
        Reader::new(b.finish().unwrap()).unwrap()
    }

    fn drain<F: FnMut() -> Result<Option<(Vec<u8>, Output)>>>(mut f: F) -> Vec<(Vec<u8>, Output)> {
        let mut out = Vec::new();
        while let Some(item) = f().unwrap() {
            out.push(item);
        }
        out
    }

    #[test]
    fn full_stream_is_ascending() {
        let r = reader_for(&[(b"key2", 2), (b"key1", 1), (b"apple", 3)]);
        let mut s = r.stream().unwrap();
        let items = drain(|| s.next());
        assert_eq!(
            items,
            vec![(b"apple".to_vec(), 3), (b"key1".to_vec(), 1), (b"key2".to_vec(), 2)]
        );
    }

    #[test]
    fn range_lt_excludes_boundary() {
        let r = reader_for(&[(b"key1", 123), (b"key2", 456)]);
        let mut s = r.range(Bound::Unbounded, Bound::Excluded(b"key2".to_vec())).unwrap();
        let items = drain(|| s.next());
        assert_eq!(items, vec![(b"key1".to_vec(), 123)]);
    }

    #[test]
    fn range_le_and_gt_select_single_middle_key() {
        let r = reader_for(&[(b"key1", 123), (b"key2", 456)]);
        let mut s = r
            .range(Bound::Excluded(b"key1".to_vec()), Bound::Included(b"key2".to_vec()))
            .unwrap();
        let items = drain(|| s.next());
        assert_eq!(items, vec![(b"key2".to_vec(), 456)]);
    }

    #[test]
    fn search_always_equals_full_stream() {
        let r = reader_for(&[(b"a", 1), (b"b", 2)]);
        let mut s = r.search(Always).unwrap();
        let items = drain(|| s.next());
        assert_eq!(items, vec![(b"a".to_vec(), 1), (b"b".to_vec(), 2)]);
    }

    #[test]
    fn search_never_is_empty() {
        let r = reader_for(&[(b"a", 1), (b"b", 2)]);
        let mut s = r.search(Never).unwrap();
        assert!(s.next().unwrap().is_none());
    }

    #[test]
    fn search_starts_with_and_its_complement_partition_the_keys() {
        let r = reader_for(&[(b"key1", 1), (b"key2", 2), (b"other", 3)]);
        let prefix = Str::new(b"key".to_vec()).starts_with();
        let mut s = r.search(prefix.clone()).unwrap();
        let mut matched: Vec<_> = drain(|| s.next()).into_iter().map(|(k, _)| k).collect();
        matched.sort();
        assert_eq!(matched, vec![b"key1".to_vec(), b"key2".to_vec()]);

        let mut s2 = r.search(prefix.complement()).unwrap();
        let unmatched: Vec<_> = drain(|| s2.next()).into_iter().map(|(k, _)| k).collect();
        assert_eq!(unmatched, vec![b"other".to_vec()]);
    }
}
