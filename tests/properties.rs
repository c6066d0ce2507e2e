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

//! Property tests for the invariants that matter most: every key built round-trips to
//! its own value (including through output pushing on shared prefixes), and iteration
//! is always strictly ascending.

use ducer_core::map::Map;
use quickcheck::quickcheck;
use std::collections::BTreeMap;

/// Collapses an arbitrary `(key, value)` list into the strictly ascending, key-distinct
/// form `Builder::push` requires, keeping the last value seen for a repeated key.
fn dedup_sorted(pairs: Vec<(Vec<u8>, u64)>) -> Vec<(Vec<u8>, u64)> {
    let map: BTreeMap<Vec<u8>, u64> = pairs.into_iter().collect();
    map.into_iter().collect()
}

quickcheck! {
    fn round_trip_every_key(pairs: Vec<(Vec<u8>, u64)>) -> bool {
        let pairs = dedup_sorted(pairs);
        let m = Map::build(":memory:", pairs.clone()).unwrap();
        pairs.iter().all(|(k, v)| m.get(k).unwrap() == Some(*v))
            && m.get(b"a key that was never inserted and is long enough to miss any accidental prefix match").unwrap().is_none()
    }

    fn iteration_is_strictly_ascending(pairs: Vec<(Vec<u8>, u64)>) -> bool {
        let pairs = dedup_sorted(pairs);
        let m = Map::build(":memory:", pairs.clone()).unwrap();
        let mut it = m.iter().unwrap();
        let mut prev: Option<Vec<u8>> = None;
        while let Some((k, _)) = it.next().unwrap() {
            if let Some(p) = &prev {
                if p >= &k {
                    return false;
                }
            }
            prev = Some(k);
        }
        true
    }

    fn len_matches_distinct_key_count(pairs: Vec<(Vec<u8>, u64)>) -> bool {
        let pairs = dedup_sorted(pairs);
        let expected = pairs.len() as u64;
        let m = Map::build(":memory:", pairs).unwrap();
        m.len() == expected
    }
}
