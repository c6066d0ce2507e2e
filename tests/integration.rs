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

//! End-to-end exercises of the typed facades against the documented scenarios: point
//! lookup, ordered iteration, range queries, automaton search, set-algebra merges with
//! each value-selection policy, and a file-backed build/open round trip.

use ducer_core::automaton::{Automaton, Str};
use ducer_core::map::Map;
use ducer_core::set::Set;
use ducer_core::stream::Bound;
use ducer_core::Select;

#[test]
fn point_lookup_and_ordered_iteration() {
    let m = Map::build(
        ":memory:",
        vec![(b"key1".to_vec(), 123), (b"key2".to_vec(), 456), (b"key3".to_vec(), 789)],
    )
    .unwrap();

    assert_eq!(m.get(b"key2").unwrap(), Some(456));
    assert_eq!(m.get(b"missing").unwrap(), None);

    let mut it = m.iter().unwrap();
    let mut collected = Vec::new();
    while let Some(pair) = it.next().unwrap() {
        collected.push(pair);
    }
    assert_eq!(
        collected,
        vec![(b"key1".to_vec(), 123), (b"key2".to_vec(), 456), (b"key3".to_vec(), 789)]
    );
}

#[test]
fn range_query_selects_a_contiguous_slice() {
    let m = Map::build(
        ":memory:",
        vec![
            (b"a".to_vec(), 1),
            (b"b".to_vec(), 2),
            (b"c".to_vec(), 3),
            (b"d".to_vec(), 4),
        ],
    )
    .unwrap();

    let mut r = m.range(Bound::Included(b"b".to_vec()), Bound::Excluded(b"d".to_vec())).unwrap();
    let mut collected = Vec::new();
    while let Some(pair) = r.next().unwrap() {
        collected.push(pair);
    }
    assert_eq!(collected, vec![(b"b".to_vec(), 2), (b"c".to_vec(), 3)]);
}

#[test]
fn automaton_search_partitions_by_prefix() {
    let m = Map::build(
        ":memory:",
        vec![
            (b"apple".to_vec(), 1),
            (b"application".to_vec(), 2),
            (b"banana".to_vec(), 3),
        ],
    )
    .unwrap();

    let prefix = Str::new(b"app".to_vec()).starts_with();
    let mut s = m.search(prefix.clone()).unwrap();
    let mut matched = Vec::new();
    while let Some((k, _)) = s.next().unwrap() {
        matched.push(k);
    }
    assert_eq!(matched, vec![b"apple".to_vec(), b"application".to_vec()]);

    let mut not_matched = m.search(prefix.complement()).unwrap();
    let mut rest = Vec::new();
    while let Some((k, _)) = not_matched.next().unwrap() {
        rest.push(k);
    }
    assert_eq!(rest, vec![b"banana".to_vec()]);
}

#[test]
fn set_algebra_over_three_maps_with_select_policies() {
    let a = Map::build(":memory:", vec![(b"key1".to_vec(), 123)]).unwrap();
    let b = Map::build(":memory:", vec![(b"key1".to_vec(), 456)]).unwrap();
    let c = Map::build(":memory:", vec![(b"key1".to_vec(), 789)]).unwrap();

    let avg = Map::union(":memory:", &[&a, &b, &c], Select::Avg).unwrap();
    assert_eq!(avg.get(b"key1").unwrap(), Some((123 + 456 + 789) / 3));

    let median = Map::union(":memory:", &[&a, &b, &c], Select::Median).unwrap();
    assert_eq!(median.get(b"key1").unwrap(), Some(456));

    let max = Map::union(":memory:", &[&a, &b, &c], Select::Max).unwrap();
    assert_eq!(max.get(b"key1").unwrap(), Some(789));
}

#[test]
fn set_difference_matches_documented_scenario() {
    let a = Set::build(":memory:", vec![b"key1".to_vec(), b"key2".to_vec(), b"key3".to_vec()]).unwrap();
    let b = Set::build(":memory:", vec![b"key2".to_vec(), b"key3".to_vec()]).unwrap();

    let d = Set::difference(":memory:", &[&a, &b]).unwrap();
    let mut it = d.iter().unwrap();
    assert_eq!(it.next().unwrap(), Some(b"key1".to_vec()));
    assert_eq!(it.next().unwrap(), None);
}

#[test]
fn file_backed_build_and_open_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.fst");

    let built = Map::build(
        &path,
        vec![(b"key1".to_vec(), 1), (b"key2".to_vec(), 2), (b"key3".to_vec(), 3)],
    )
    .unwrap();
    assert_eq!(built.len(), 3);

    let reopened = Map::open(&path).unwrap();
    assert_eq!(reopened.get(b"key2").unwrap(), Some(2));
    assert_eq!(reopened.as_bytes(), built.as_bytes());
}

#[test]
fn mmap_backed_open_reads_the_same_image_as_a_plain_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.fst");

    let built =
        Set::build(&path, vec![b"key1".to_vec(), b"key2".to_vec(), b"key3".to_vec()]).unwrap();
    assert_eq!(built.len(), 3);

    let mapped = Set::open_mmap(&path).unwrap();
    assert_eq!(mapped.len(), 3);
    assert!(mapped.contains(b"key2").unwrap());
    assert_eq!(mapped.as_bytes(), built.as_bytes());
}

#[test]
fn duplicate_and_out_of_order_keys_are_rejected() {
    let err = Map::build(":memory:", vec![(b"b".to_vec(), 1), (b"a".to_vec(), 2)]).unwrap_err();
    assert!(matches!(err, ducer_core::Error::Order { .. }));

    let err = Map::build(":memory:", vec![(b"a".to_vec(), 1), (b"a".to_vec(), 2)]).unwrap_err();
    assert!(matches!(err, ducer_core::Error::DuplicateKey { .. }));
}
