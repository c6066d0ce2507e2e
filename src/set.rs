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

//! Typed key-only facade over the untyped builder, reader, and set-algebra primitives.
//!
//! `Set` and [`crate::map::Map`] are distinct Rust types, so a set-algebra call that
//! mixes the two (`Set::union` given a `Map` operand) is rejected at compile time rather
//! than needing a runtime type check — a stronger guarantee than the boundary-time
//! rejection a dynamically typed binding layer would need.
//!
//! The ordering relations over two sets (`<`, `≤`, `>`, `≥`, `==`, `≠`) reduce to
//! [`Set::is_subset`], [`Set::is_superset`], and [`Set::set_eq`]: `a < b` is
//! `a.is_subset(b) && !a.set_eq(b)`, `a ≤ b` is `a.is_subset(b)`, and so on. They are
//! left as that composition rather than given their own methods or a `PartialOrd` impl,
//! since every one of these is fallible (the underlying image could be malformed) and
//! `PartialOrd::partial_cmp` has no way to propagate a `Result`.

use crate::automaton::Automaton;
use crate::builder::Builder;
use crate::error::Result;
use crate::ops::{self, Select, SetOp};
use crate::reader::Reader;
use crate::source::Destination;
use crate::stream::{Bound, RangeStream, SearchStream};
use std::path::Path;

pub struct SetBuilder {
    inner: Builder,
    dest: Destination,
}

impl SetBuilder {
    pub fn new(dest: impl AsRef<Path>) -> SetBuilder {
        SetBuilder { inner: Builder::new(), dest: Destination::parse(dest) }
    }

    pub fn memory() -> SetBuilder {
        SetBuilder::new(":memory:")
    }

    pub fn insert(&mut self, key: impl AsRef<[u8]>) -> Result<()> {
        self.inner.push(key.as_ref(), 0)
    }

    pub fn finish(self) -> Result<Set> {
        let image = self.inner.finish()?;
        let bytes = self.dest.deliver(image)?;
        Set::from_bytes(bytes)
    }
}

/// An immutable, ordered set of byte strings backed by an FST image whose outputs are
/// always zero.
#[derive(Clone)]
pub struct Set {
    reader: Reader,
}

impl Set {
    pub fn build(dest: impl AsRef<Path>, items: impl IntoIterator<Item = Vec<u8>>) -> Result<Set> {
        let mut b = SetBuilder::new(dest);
        for k in items {
            b.insert(k)?;
        }
        b.finish()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Set> {
        Ok(Set { reader: Reader::new(bytes)? })
    }

    /// Opens an image by reading the whole file into the heap.
    pub fn open(path: impl AsRef<Path>) -> Result<Set> {
        let backing = crate::source::Source::parse(path).load()?;
        Ok(Set { reader: Reader::new(backing)? })
    }

    /// Opens an image by memory-mapping the file rather than copying it. See
    /// [`crate::source::Source::mmap`] for the safety caveat this carries.
    pub fn open_mmap(path: impl AsRef<Path>) -> Result<Set> {
        let backing = crate::source::Source::mmap(path).load()?;
        Ok(Set { reader: Reader::new(backing)? })
    }

    pub fn len(&self) -> u64 {
        self.reader.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reader.is_empty()
    }

    pub fn contains(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        self.reader.contains_key(key.as_ref())
    }

    pub fn iter(&self) -> Result<SetKeys<'_>> {
        Ok(SetKeys(self.reader.stream()?))
    }

    pub fn range(&self, lower: Bound, upper: Bound) -> Result<SetRange<'_>> {
        Ok(SetRange(self.reader.range(lower, upper)?))
    }

    pub fn search<A: Automaton>(&self, automaton: A) -> Result<SetSearch<'_, A>> {
        Ok(SetSearch(self.reader.search(automaton)?))
    }

    pub fn is_disjoint(&self, other: &Set) -> Result<bool> {
        let mut it = self.iter()?;
        while let Some(k) = it.next()? {
            if other.contains(&k)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn is_subset(&self, other: &Set) -> Result<bool> {
        let mut it = self.iter()?;
        while let Some(k) = it.next()? {
            if !other.contains(&k)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn is_superset(&self, other: &Set) -> Result<bool> {
        other.is_subset(self)
    }

    /// Equality over the underlying key set (same cardinality, mutual subset).
    pub fn set_eq(&self, other: &Set) -> Result<bool> {
        Ok(self.len() == other.len() && self.is_subset(other)?)
    }

    fn set_op(dest: impl AsRef<Path>, operands: &[&Set], op: SetOp) -> Result<Set> {
        if operands.is_empty() {
            return Err(crate::error::Error::Type(
                "set-algebra operation requires at least one operand".into(),
            ));
        }
        let readers: Vec<Reader> = operands.iter().map(|s| s.reader.clone()).collect();
        let image = ops::merge(&readers, op, Select::First)?;
        let bytes = Destination::parse(dest).deliver(image)?;
        Set::from_bytes(bytes)
    }

    pub fn union(dest: impl AsRef<Path>, operands: &[&Set]) -> Result<Set> {
        Set::set_op(dest, operands, SetOp::Union)
    }

    pub fn intersection(dest: impl AsRef<Path>, operands: &[&Set]) -> Result<Set> {
        Set::set_op(dest, operands, SetOp::Intersection)
    }

    pub fn difference(dest: impl AsRef<Path>, operands: &[&Set]) -> Result<Set> {
        Set::set_op(dest, operands, SetOp::Difference)
    }

    pub fn symmetric_difference(dest: impl AsRef<Path>, operands: &[&Set]) -> Result<Set> {
        Set::set_op(dest, operands, SetOp::SymmetricDifference)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.reader.as_bytes()
    }
}

pub struct SetKeys<'a>(crate::stream::Stream<'a>);

impl<'a> SetKeys<'a> {
    pub fn next(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.0.next()?.map(|(k, _)| k))
    }
}

pub struct SetRange<'a>(RangeStream<'a>);

impl<'a> SetRange<'a> {
    pub fn next(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.0.next()?.map(|(k, _)| k))
    }
}

pub struct SetSearch<'a, A: Automaton>(SearchStream<'a, A>);

impl<'a, A: Automaton> SetSearch<'a, A> {
    pub fn next(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.0.next()?.map(|(k, _)| k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(keys: &[&[u8]]) -> Set {
        Set::build(":memory:", keys.iter().map(|k| k.to_vec())).unwrap()
    }

    #[test]
    fn subset_and_disjoint_relations() {
        let a = set(&[b"a", b"b"]);
        let b = set(&[b"a", b"b", b"c"]);
        let c = set(&[b"x", b"y"]);
        assert!(a.is_subset(&b).unwrap());
        assert!(!b.is_subset(&a).unwrap());
        assert!(b.is_superset(&a).unwrap());
        assert!(a.is_disjoint(&c).unwrap());
        assert!(!a.is_disjoint(&b).unwrap());
    }

    #[test]
    fn set_eq_ignores_order_of_construction() {
        let a = set(&[b"a", b"b"]);
        let b = set(&[b"a", b"b"]);
        assert!(a.set_eq(&b).unwrap());
    }

    #[test]
    fn difference_matches_documented_scenario() {
        let a = set(&[b"key1", b"key2", b"key3"]);
        let b = set(&[b"key2", b"key3"]);
        let d = Set::difference(":memory:", &[&a, &b]).unwrap();
        let mut it = d.iter().unwrap();
        assert_eq!(it.next().unwrap(), Some(b"key1".to_vec()));
        assert_eq!(it.next().unwrap(), None);
    }
}
