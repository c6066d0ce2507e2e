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

//! The output semiring: `(u64, +, min, -)`.
//!
//! Transition outputs combine by addition along an accepting path. During minimization
//! the builder needs to factor a common increment out of a set of sibling transitions and
//! push it onto their shared parent transition; `common_prefix` and `subtract_prefix`
//! implement that factoring.

pub type Output = u64;

pub const ZERO: Output = 0;

/// `a + b`, the combination of two outputs along a path.
#[inline]
pub fn combine(a: Output, b: Output) -> Output {
    a + b
}

/// The largest value that can be factored out of both `a` and `b` without driving either
/// negative: `min(a, b)`.
#[inline]
pub fn common_prefix(a: Output, b: Output) -> Output {
    a.min(b)
}

/// `a` with `prefix` already accounted for by an ancestor. Precondition: `prefix <= a`.
#[inline]
pub fn subtract_prefix(a: Output, prefix: Output) -> Output {
    debug_assert!(prefix <= a, "subtract_prefix: {} > {}", prefix, a);
    a - prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_prefix_is_commutative_min() {
        assert_eq!(common_prefix(3, 7), 3);
        assert_eq!(common_prefix(7, 3), 3);
        assert_eq!(common_prefix(5, 5), 5);
    }

    #[test]
    fn subtract_prefix_undoes_combine() {
        let a = 42;
        let prefix = common_prefix(a, 10);
        assert_eq!(combine(prefix, subtract_prefix(a, prefix)), a);
    }
}
