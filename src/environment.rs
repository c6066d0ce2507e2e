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

use once_cell::sync::Lazy;
use std::env;

/// Maximum number of entries the builder's state register will hold before it stops
/// deduplicating new states. Override with `DUCER_REGISTER_CAPACITY`.
///
/// Unlike a whole-object cache, an evicted register entry isn't revisited once its state
/// has been frozen to disk, so the only effect of a smaller capacity is a larger image.
pub static REGISTER_CAPACITY: Lazy<usize> = Lazy::new(|| {
    env::var("DUCER_REGISTER_CAPACITY")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1 << 20)
});

/// When set, the builder and set-algebra operator print a line of progress diagnostics
/// to stderr. Override with `DUCER_VERBOSE=1`.
pub static VERBOSE: Lazy<bool> = Lazy::new(|| match env::var("DUCER_VERBOSE") {
    Ok(v) => v == "1" || v.eq_ignore_ascii_case("true"),
    Err(_) => false,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_capacity_has_a_sane_default() {
        // Reading the lazy statically doesn't require the env var to be set.
        assert!(*REGISTER_CAPACITY > 0);
    }
}
