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

//! The automaton interface used to drive [`crate::stream::SearchStream`], plus the
//! built-in constructors and algebraic combinators from which richer automata are
//! assembled.
//!
//! Combinators are generic structs rather than trait objects (`Union<A, B>`, not
//! `Box<dyn Automaton>`), so each combinator application produces a fresh concrete type
//! carrying its operands' states as a product, with no shared mutable automaton state.

/// Stepwise acceptor with a pruning hint. `State` is opaque to callers; only the
/// automaton that produced it knows how to interpret it.
pub trait Automaton {
    type State: Clone;

    /// The state before any input has been consumed.
    fn start(&self) -> Self::State;

    /// Whether the bytes consumed so far form an accepted key.
    fn is_match(&self, state: &Self::State) -> bool;

    /// Whether any extension of the bytes consumed so far could still match. A
    /// conservative `true` is always correct; a tighter bound only improves pruning.
    fn can_match(&self, _state: &Self::State) -> bool {
        true
    }

    /// The state after consuming one more input byte.
    fn accept(&self, state: &Self::State, byte: u8) -> Self::State;

    fn starts_with(self) -> StartsWith<Self>
    where
        Self: Sized,
    {
        StartsWith(self)
    }

    fn complement(self) -> Complement<Self>
    where
        Self: Sized,
    {
        Complement(self)
    }

    fn union<B: Automaton>(self, other: B) -> Union<Self, B>
    where
        Self: Sized,
    {
        Union(self, other)
    }

    fn intersection<B: Automaton>(self, other: B) -> Intersection<Self, B>
    where
        Self: Sized,
    {
        Intersection(self, other)
    }
}

/// Matches every key.
#[derive(Clone, Copy, Debug, Default)]
pub struct Always;

impl Automaton for Always {
    type State = ();
    fn start(&self) {}
    fn is_match(&self, _: &()) -> bool {
        true
    }
    fn accept(&self, _: &(), _: u8) {}
}

/// Matches no key; pruned at the root.
#[derive(Clone, Copy, Debug, Default)]
pub struct Never;

impl Automaton for Never {
    type State = ();
    fn start(&self) {}
    fn is_match(&self, _: &()) -> bool {
        false
    }
    fn can_match(&self, _: &()) -> bool {
        false
    }
    fn accept(&self, _: &(), _: u8) {}
}

/// Matches exactly the byte string it was built from.
#[derive(Clone, Debug)]
pub struct Str {
    bytes: Vec<u8>,
}

impl Str {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Str {
        Str { bytes: bytes.into() }
    }
}

/// `Some(n)` means the first `n` bytes of the pattern matched so far; `None` is a dead
/// state reached once a mismatching byte has been consumed.
impl Automaton for Str {
    type State = Option<usize>;

    fn start(&self) -> Option<usize> {
        Some(0)
    }

    fn is_match(&self, state: &Option<usize>) -> bool {
        *state == Some(self.bytes.len())
    }

    fn can_match(&self, state: &Option<usize>) -> bool {
        state.is_some()
    }

    fn accept(&self, state: &Option<usize>, byte: u8) -> Option<usize> {
        match state {
            Some(n) if *n < self.bytes.len() && self.bytes[*n] == byte => Some(n + 1),
            _ => None,
        }
    }
}

/// Matches any key that contains the built-from byte string as a (not necessarily
/// contiguous) subsequence.
#[derive(Clone, Debug)]
pub struct Subsequence {
    bytes: Vec<u8>,
}

impl Subsequence {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Subsequence {
        Subsequence { bytes: bytes.into() }
    }
}

impl Automaton for Subsequence {
    type State = usize;

    fn start(&self) -> usize {
        0
    }

    fn is_match(&self, state: &usize) -> bool {
        *state == self.bytes.len()
    }

    fn can_match(&self, _state: &usize) -> bool {
        true
    }

    fn accept(&self, state: &usize, byte: u8) -> usize {
        if *state < self.bytes.len() && self.bytes[*state] == byte {
            state + 1
        } else {
            *state
        }
    }
}

/// Once the wrapped automaton reaches a match, every extension also matches.
#[derive(Clone, Debug)]
pub struct StartsWith<A>(A);

#[derive(Clone, Debug)]
pub enum StartsWithState<S> {
    Searching(S),
    Matched,
}

impl<A: Automaton> Automaton for StartsWith<A> {
    type State = StartsWithState<A::State>;

    fn start(&self) -> Self::State {
        let inner = self.0.start();
        if self.0.is_match(&inner) {
            StartsWithState::Matched
        } else {
            StartsWithState::Searching(inner)
        }
    }

    fn is_match(&self, state: &Self::State) -> bool {
        matches!(state, StartsWithState::Matched)
    }

    fn can_match(&self, state: &Self::State) -> bool {
        match state {
            StartsWithState::Matched => true,
            StartsWithState::Searching(s) => self.0.can_match(s),
        }
    }

    fn accept(&self, state: &Self::State, byte: u8) -> Self::State {
        match state {
            StartsWithState::Matched => StartsWithState::Matched,
            StartsWithState::Searching(s) => {
                let next = self.0.accept(s, byte);
                if self.0.is_match(&next) {
                    StartsWithState::Matched
                } else {
                    StartsWithState::Searching(next)
                }
            }
        }
    }
}

/// Flips `is_match`. `can_match` stays conservative (always true) since a subtree the
/// wrapped automaton can no longer match may still contain keys the complement matches.
#[derive(Clone, Debug)]
pub struct Complement<A>(A);

impl<A: Automaton> Automaton for Complement<A> {
    type State = A::State;

    fn start(&self) -> Self::State {
        self.0.start()
    }

    fn is_match(&self, state: &Self::State) -> bool {
        !self.0.is_match(state)
    }

    fn can_match(&self, _state: &Self::State) -> bool {
        true
    }

    fn accept(&self, state: &Self::State, byte: u8) -> Self::State {
        self.0.accept(state, byte)
    }
}

/// Matches whatever either operand matches.
#[derive(Clone, Debug)]
pub struct Union<A, B>(A, B);

impl<A: Automaton, B: Automaton> Automaton for Union<A, B> {
    type State = (A::State, B::State);

    fn start(&self) -> Self::State {
        (self.0.start(), self.1.start())
    }

    fn is_match(&self, state: &Self::State) -> bool {
        self.0.is_match(&state.0) || self.1.is_match(&state.1)
    }

    fn can_match(&self, state: &Self::State) -> bool {
        self.0.can_match(&state.0) || self.1.can_match(&state.1)
    }

    fn accept(&self, state: &Self::State, byte: u8) -> Self::State {
        (self.0.accept(&state.0, byte), self.1.accept(&state.1, byte))
    }
}

/// Matches whatever both operands match.
#[derive(Clone, Debug)]
pub struct Intersection<A, B>(A, B);

impl<A: Automaton, B: Automaton> Automaton for Intersection<A, B> {
    type State = (A::State, B::State);

    fn start(&self) -> Self::State {
        (self.0.start(), self.1.start())
    }

    fn is_match(&self, state: &Self::State) -> bool {
        self.0.is_match(&state.0) && self.1.is_match(&state.1)
    }

    fn can_match(&self, state: &Self::State) -> bool {
        self.0.can_match(&state.0) && self.1.can_match(&state.1)
    }

    fn accept(&self, state: &Self::State, byte: u8) -> Self::State {
        (self.0.accept(&state.0, byte), self.1.accept(&state.1, byte))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn str_matches_only_exact_bytes() {
        let a = Str::new(b"key".to_vec());
        let mut s = a.start();
        for b in b"key" {
            assert!(a.can_match(&s));
            s = a.accept(&s, *b);
        }
        assert!(a.is_match(&s));
        let s2 = a.accept(&s, b'!');
        assert!(!a.can_match(&s2));
    }

    #[test]
    fn starts_with_keeps_matching_after_prefix() {
        let a = Str::new(b"key".to_vec()).starts_with();
        let mut s = a.start();
        for b in b"key1234" {
            s = a.accept(&s, *b);
        }
        assert!(a.is_match(&s));
    }

    #[test]
    fn complement_flips_is_match_not_can_match() {
        let a = Str::new(b"ab".to_vec());
        let c = a.clone().complement();
        let s = a.start();
        assert_eq!(a.is_match(&s), false);
        assert_eq!(c.is_match(&s), true);
    }

    #[test]
    fn subsequence_matches_out_of_order_superstrings() {
        let a = Subsequence::new(b"ac".to_vec());
        let mut s = a.start();
        for b in b"abc" {
            s = a.accept(&s, *b);
        }
        assert!(a.is_match(&s));
    }
}
