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

//! An immutable, ordered key/value store backed by a finite-state transducer.
//!
//! A completed store is a single self-describing byte image: build it once from a sorted
//! stream of keys (via [`builder::Builder`] or the typed [`map::Map`]/[`set::Set`] facades),
//! then query it with zero decompression through [`reader::Reader`] and its iterators.

mod bytes;
pub mod environment;
pub mod error;
pub mod output;
pub mod node;
pub mod register;
pub mod builder;
pub mod reader;
pub mod stream;
pub mod automaton;
pub mod ops;
pub mod source;
pub mod map;
pub mod set;

#[cfg(feature = "python_bindings")]
pub mod python;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub use error::{Error, Result};
pub use map::{Map, MapBuilder};
pub use set::{Set, SetBuilder};
pub use ops::Select;
pub use automaton::Automaton;
