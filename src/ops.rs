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

//! The set-algebra operator: a k-way merge over any number of sorted key streams,
//! feeding its chosen output back into a fresh [`crate::builder::Builder`].

use crate::builder::Builder;
use crate::environment::VERBOSE;
use crate::error::Result;
use crate::output::Output;
use crate::reader::Reader;

/// How to pick a single output value when more than one operand carries a value for the
/// same key (map variant only; sets have no values to select between).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Select {
    First,
    Last,
    Mid,
    Min,
    Max,
    Avg,
    Median,
}

impl Select {
    /// `present` holds `(operand_index, value)` pairs for every operand positioned at
    /// the current key, ordered by ascending operand index.
    fn choose(self, present: &[(usize, Output)]) -> Output {
        debug_assert!(!present.is_empty());
        match self {
            Select::First => present[0].1,
            Select::Last => present[present.len() - 1].1,
            Select::Mid => present[present.len() / 2].1,
            Select::Min => present.iter().map(|(_, v)| *v).fold(Output::MAX, Output::min),
            Select::Max => present.iter().map(|(_, v)| *v).fold(Output::MIN, Output::max),
            Select::Avg => {
                let sum: u128 = present.iter().map(|(_, v)| *v as u128).sum();
                (sum / present.len() as u128) as Output
            }
            Select::Median => {
                let mut values: Vec<Output> = present.iter().map(|(_, v)| *v).collect();
                values.sort_unstable();
                let n = values.len();
                if n % 2 == 1 {
                    values[n / 2]
                } else {
                    let sum = values[n / 2 - 1] as u128 + values[n / 2] as u128;
                    (sum / 2) as Output
                }
            }
        }
    }
}

/// The four set-algebra operations, expressed as an inclusion predicate over the set of
/// operand indices currently positioned at the candidate key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOp {
    Union,
    Intersection,
    /// `operands[0] \ (operands[1] ∪ … ∪ operands[n-1])`.
    Difference,
    SymmetricDifference,
}

impl SetOp {
    fn includes(self, present: &[usize], operand_count: usize) -> bool {
        match self {
            SetOp::Union => !present.is_empty(),
            SetOp::Intersection => present.len() == operand_count,
            SetOp::Difference => present == [0],
            SetOp::SymmetricDifference => present.len() % 2 == 1,
        }
    }
}

/// One live operand in the merge: its reader (kept alive so the stream can keep
/// borrowing it) and the stream cursor itself, plus a one-slot lookahead buffer.
struct Operand<'a> {
    stream: crate::stream::Stream<'a>,
    peeked: Option<(Vec<u8>, Output)>,
    exhausted: bool,
}

impl<'a> Operand<'a> {
    fn new(reader: &'a Reader) -> Result<Operand<'a>> {
        let mut stream = reader.stream()?;
        let peeked = stream.next()?;
        let exhausted = peeked.is_none();
        Ok(Operand { stream, peeked, exhausted })
    }

    fn advance(&mut self) -> Result<()> {
        self.peeked = self.stream.next()?;
        if self.peeked.is_none() {
            self.exhausted = true;
        }
        Ok(())
    }
}

/// Runs a k-way merge of `readers` under `op`, writing the result through a fresh
/// builder. For the set variant (no value selection meaningful), pass
/// `select = Select::First`; its output is discarded by the set facade since every
/// operand's value is implicitly zero.
pub fn merge(readers: &[Reader], op: SetOp, select: Select) -> Result<Vec<u8>> {
    let mut operands: Vec<Operand<'_>> = Vec::with_capacity(readers.len());
    for r in readers {
        operands.push(Operand::new(r)?);
    }

    let mut out = Builder::new();
    let operand_count = operands.len();

    loop {
        let min_key = operands
            .iter()
            .filter(|o| !o.exhausted)
            .filter_map(|o| o.peeked.as_ref())
            .map(|(k, _)| k.clone())
            .min();
        let min_key = match min_key {
            Some(k) => k,
            None => break,
        };

        let mut present_idx = Vec::new();
        let mut present_vals = Vec::new();
        for (i, o) in operands.iter().enumerate() {
            if !o.exhausted {
                if let Some((k, v)) = &o.peeked {
                    if *k == min_key {
                        present_idx.push(i);
                        present_vals.push((i, *v));
                    }
                }
            }
        }

        if op.includes(&present_idx, operand_count) {
            let value = select.choose(&present_vals);
            out.push(&min_key, value)?;
        }

        for i in &present_idx {
            operands[*i].advance()?;
        }
    }

    if *VERBOSE {
        eprintln!("ducer_core::ops: merged {} operands under {:?}", operand_count, op);
    }
    out.finish()
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

    fn keys(r: &Reader) -> Vec<Vec<u8>> {
        let mut s = r.stream().unwrap();
        let mut out = Vec::new();
        while let Some((k, _)) = s.next().unwrap() {
            out.push(k);
        }
        out
    }

    #[test]
    fn union_is_set_union() {
        let a = reader_for(&[(b"a", 0), (b"b", 0)]);
        let b = reader_for(&[(b"b", 0), (b"c", 0)]);
        let merged = merge(&[a, b], SetOp::Union, Select::First).unwrap();
        let r = Reader::new(merged).unwrap();
        assert_eq!(keys(&r), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn intersection_requires_every_operand() {
        let a = reader_for(&[(b"a", 0), (b"b", 0)]);
        let b = reader_for(&[(b"b", 0), (b"c", 0)]);
        let merged = merge(&[a, b], SetOp::Intersection, Select::First).unwrap();
        let r = Reader::new(merged).unwrap();
        assert_eq!(keys(&r), vec![b"b".to_vec()]);
    }

    #[test]
    fn difference_is_first_operand_minus_the_rest() {
        let a = reader_for(&[(b"key1", 0), (b"key2", 0), (b"key3", 0)]);
        let b = reader_for(&[(b"key2", 0), (b"key3", 0)]);
        let merged = merge(&[a, b], SetOp::Difference, Select::First).unwrap();
        let r = Reader::new(merged).unwrap();
        assert_eq!(keys(&r), vec![b"key1".to_vec()]);
    }

    #[test]
    fn symmetric_difference_is_odd_membership() {
        let a = reader_for(&[(b"a", 0), (b"b", 0)]);
        let b = reader_for(&[(b"b", 0), (b"c", 0)]);
        let c = reader_for(&[(b"c", 0)]);
        let merged = merge(&[a, b, c], SetOp::SymmetricDifference, Select::First).unwrap();
        let r = Reader::new(merged).unwrap();
        // "a": only in 1 -> odd -> included. "b": in 2 -> even -> excluded.
        // "c": in 2 -> even -> excluded.
        assert_eq!(keys(&r), vec![b"a".to_vec()]);
    }

    #[test]
    fn select_policies_match_the_documented_scenarios() {
        let a = reader_for(&[(b"key1", 123)]);
        let b = reader_for(&[(b"key1", 456)]);
        let c = reader_for(&[(b"key1", 789)]);

        let avg = merge(&[a.clone(), b.clone(), c.clone()], SetOp::Union, Select::Avg).unwrap();
        assert_eq!(Reader::new(avg).unwrap().get(b"key1").unwrap(), Some((123 + 456 + 789) / 3));

        let median = merge(&[a.clone(), b.clone(), c.clone()], SetOp::Union, Select::Median).unwrap();
        assert_eq!(Reader::new(median).unwrap().get(b"key1").unwrap(), Some(456));

        let max = merge(&[a, b, c], SetOp::Union, Select::Max).unwrap();
        assert_eq!(Reader::new(max).unwrap().get(b"key1").unwrap(), Some(789));
    }
}
