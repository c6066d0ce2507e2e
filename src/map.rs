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

//! Typed key/value facade over the untyped builder, reader, and set-algebra primitives.

use crate::automaton::Automaton;
use crate::builder::Builder;
use crate::error::{Error, Result};
use crate::ops::{self, Select, SetOp};
use crate::output::Output;
use crate::reader::Reader;
use crate::source::Destination;
use crate::stream::{Bound, RangeStream, SearchStream, Stream};
use std::path::Path;

/// Builds a [`Map`] from a sorted, key-distinct stream of `(key, value)` pairs.
pub struct MapBuilder {
    inner: Builder,
    dest: Destination,
}

impl MapBuilder {
    pub fn new(dest: impl AsRef<Path>) -> MapBuilder {
        MapBuilder { inner: Builder::new(), dest: Destination::parse(dest) }
    }

    pub fn memory() -> MapBuilder {
        MapBuilder::new(":memory:")
    }

    pub fn insert(&mut self, key: impl AsRef<[u8]>, value: Output) -> Result<()> {
        self.inner.push(key.as_ref(), value)
    }

    pub fn finish(self) -> Result<Map> {
        let image = self.inner.finish()?;
        let bytes = self.dest.deliver(image)?;
        Map::from_bytes(bytes)
    }
}

/// An immutable, ordered byte-string-to-`u64` map backed by an FST image.
#[derive(Clone)]
pub struct Map {
    reader: Reader,
}

impl Map {
    /// One-shot construction from an already-sorted, key-distinct iterable.
    pub fn build(
        dest: impl AsRef<Path>,
        items: impl IntoIterator<Item = (Vec<u8>, Output)>,
    ) -> Result<Map> {
        let mut b = MapBuilder::new(dest);
        for (k, v) in items {
            b.insert(k, v)?;
        }
        b.finish()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Map> {
        Ok(Map { reader: Reader::new(bytes)? })
    }

    /// Opens an image by reading the whole file into the heap.
    pub fn open(path: impl AsRef<Path>) -> Result<Map> {
        let backing = crate::source::Source::parse(path).load()?;
        Ok(Map { reader: Reader::new(backing)? })
    }

    /// Opens an image by memory-mapping the file rather than copying it. See
    /// [`crate::source::Source::mmap`] for the safety caveat this carries.
    pub fn open_mmap(path: impl AsRef<Path>) -> Result<Map> {
        let backing = crate::source::Source::mmap(path).load()?;
        Ok(Map { reader: Reader::new(backing)? })
    }

    pub fn len(&self) -> u64 {
        self.reader.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reader.is_empty()
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Output>> {
        self.reader.get(key.as_ref())
    }

    pub fn get_or(&self, key: impl AsRef<[u8]>, default: Output) -> Result<Output> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// The `map[key]` subscript: errors with [`Error::KeyNotFound`] on a miss, where
    /// [`Map::get`] would return `Ok(None)`.
    pub fn index(&self, key: impl AsRef<[u8]>) -> Result<Output> {
        self.get(key.as_ref())?
            .ok_or_else(|| Error::KeyNotFound { key: key.as_ref().to_vec() })
    }

    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        self.reader.contains_key(key.as_ref())
    }

    pub fn iter(&self) -> Result<Stream<'_>> {
        self.reader.stream()
    }

    pub fn keys(&self) -> Result<Keys<'_>> {
        Ok(Keys(self.reader.stream()?))
    }

    pub fn values(&self) -> Result<Values<'_>> {
        Ok(Values(self.reader.stream()?))
    }

    pub fn items(&self) -> Result<Stream<'_>> {
        self.iter()
    }

    pub fn range(&self, lower: Bound, upper: Bound) -> Result<RangeStream<'_>> {
        self.reader.range(lower, upper)
    }

    pub fn search<A: Automaton>(&self, automaton: A) -> Result<SearchStream<'_, A>> {
        self.reader.search(automaton)
    }

    fn set_op(dest: impl AsRef<Path>, operands: &[&Map], op: SetOp, select: Select) -> Result<Map> {
        if operands.is_empty() {
            return Err(Error::Type("set-algebra operation requires at least one operand".into()));
        }
        let readers: Vec<Reader> = operands.iter().map(|m| m.reader.clone()).collect();
        let image = ops::merge(&readers, op, select)?;
        let bytes = Destination::parse(dest).deliver(image)?;
        Map::from_bytes(bytes)
    }

    pub fn union(dest: impl AsRef<Path>, operands: &[&Map], select: Select) -> Result<Map> {
        Map::set_op(dest, operands, SetOp::Union, select)
    }

    pub fn intersection(dest: impl AsRef<Path>, operands: &[&Map], select: Select) -> Result<Map> {
        Map::set_op(dest, operands, SetOp::Intersection, select)
    }

    pub fn difference(dest: impl AsRef<Path>, operands: &[&Map], select: Select) -> Result<Map> {
        Map::set_op(dest, operands, SetOp::Difference, select)
    }

    pub fn symmetric_difference(dest: impl AsRef<Path>, operands: &[&Map], select: Select) -> Result<Map> {
        Map::set_op(dest, operands, SetOp::SymmetricDifference, select)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.reader.as_bytes()
    }
}

/// Key-only view over a [`Map`]'s iteration order.
pub struct Keys<'a>(Stream<'a>);

impl<'a> Keys<'a> {
    pub fn next(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.0.next()?.map(|(k, _)| k))
    }
}

/// Value-only view over a [`Map`]'s iteration order.
pub struct Values<'a>(Stream<'a>);

impl<'a> Values<'a> {
    pub fn next(&mut self) -> Result<Option<Output>> {
        Ok(self.0.next()?.map(|(_, v)| v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_errors_on_miss_get_returns_none() {
        let m = Map::build(":memory:", vec![(b"key1".to_vec(), 123)]).unwrap();
        assert_eq!(m.get(b"key3").unwrap(), None);
        assert!(matches!(m.index(b"key3"), Err(Error::KeyNotFound { .. })));
        assert_eq!(m.index(b"key1").unwrap(), 123);
    }

    #[test]
    fn keys_and_values_track_items() {
        let m = Map::build(":memory:", vec![(b"a".to_vec(), 1), (b"b".to_vec(), 2)]).unwrap();
        let mut ks = m.keys().unwrap();
        assert_eq!(ks.next().unwrap(), Some(b"a".to_vec()));
        assert_eq!(ks.next().unwrap(), Some(b"b".to_vec()));
        assert_eq!(ks.next().unwrap(), None);

        let mut vs = m.values().unwrap();
        assert_eq!(vs.next().unwrap(), Some(1));
        assert_eq!(vs.next().unwrap(), Some(2));
    }

    #[test]
    fn union_combines_two_maps_with_select_policy() {
        let a = Map::build(":memory:", vec![(b"key1".to_vec(), 123)]).unwrap();
        let b = Map::build(":memory:", vec![(b"key1".to_vec(), 456)]).unwrap();
        let u = Map::union(":memory:", &[&a, &b], Select::Max).unwrap();
        assert_eq!(u.get(b"key1").unwrap(), Some(456));
    }
}
