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

//! The reader: parses a completed image's footer and provides point lookup plus the
//! factory methods that hand out stream iterators.

use crate::automaton::Automaton;
use crate::builder::read_footer;
use crate::error::Result;
use crate::node::{Addr, Node};
use crate::output::Output;
use crate::source::Backing;
use crate::stream::{Bound, RangeStream, SearchStream, Stream};

/// A parsed, immutable FST image. Cheap to clone (an `Arc` bump over the backing bytes)
/// so that many readers/iterators can share one underlying buffer or memory mapping.
#[derive(Clone)]
pub struct Reader {
    data: Backing,
    root_addr: Addr,
    key_count: u64,
}

impl Reader {
    /// Parses `data` (the full image, body plus footer) into a reader. Accepts anything
    /// that can be turned into an owned byte buffer — a `Vec<u8>` or already-assembled
    /// `Backing`.
    pub fn new(data: impl Into<Backing>) -> Result<Reader> {
        let data = data.into();
        let footer = read_footer(&data)?;
        Ok(Reader {
            data,
            root_addr: footer.root_addr,
            key_count: footer.key_count,
        })
    }

    pub fn len(&self) -> u64 {
        self.key_count
    }

    pub fn is_empty(&self) -> bool {
        self.key_count == 0
    }

    fn root(&self) -> Result<Node<'_>> {
        Node::decode(&self.data, self.root_addr)
    }

    /// Walks `key` from the root. `Some(output)` on a match, `None` on a miss.
    pub fn get(&self, key: &[u8]) -> Result<Option<Output>> {
        let mut node = self.root()?;
        let mut acc: Output = 0;
        for &b in key {
            match node.find_transition(b)? {
                Some(t) => {
                    acc += t.out;
                    node = Node::decode(&self.data, t.target)?;
                }
                None => return Ok(None),
            }
        }
        if node.is_final {
            Ok(Some(acc + node.final_output))
        } else {
            Ok(None)
        }
    }

    pub fn contains_key(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// A forward cursor over every key in the image, in ascending order.
    pub fn stream(&self) -> Result<Stream<'_>> {
        Stream::new(&self.data, self.root_addr)
    }

    /// A forward cursor restricted to `[lower, upper]`/`(lower, upper)` per `Bound`.
    pub fn range(&self, lower: Bound, upper: Bound) -> Result<RangeStream<'_>> {
        RangeStream::new(&self.data, self.root_addr, lower, upper)
    }

    /// A forward cursor yielding only keys accepted by `automaton`, pruning subtrees
    /// `automaton` reports can never match.
    pub fn search<'f, A: Automaton + 'f>(&self, automaton: A) -> Result<SearchStream<'_, A>> {
        SearchStream::new(&self.data, self.root_addr, automaton)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn reader_for(pairs: &[(&[u8], u64)]) -> Reader {
        let mut b = Builder::new();
        for (k, v) in pairs {
            b.push(k, *v).unwrap();
        }
        Reader::new(b.finish().unwrap()).unwrap()
    }

    #[test]
    fn get_reports_absence_for_missing_keys() {
        let r = reader_for(&[(b"key1", 123), (b"key2", 456)]);
        assert_eq!(r.get(b"key3").unwrap(), None);
        assert_eq!(r.get(b"key").unwrap(), None);
        assert_eq!(r.get(b"key12").unwrap(), None);
    }

    #[test]
    fn len_matches_pushed_count() {
        let r = reader_for(&[(b"a", 1), (b"b", 2), (b"c", 3)]);
        assert_eq!(r.len(), 3);
    }
}
