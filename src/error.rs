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

use std::fmt;

/// Every fallible operation in this crate returns this.
pub type Result<T> = std::result::Result<T, Error>;

/// The error taxonomy for the whole crate: builder, reader, and the typed facades all
/// surface through this one enum rather than a per-module error type.
#[derive(Debug)]
pub enum Error {
    /// `push` was called with a key not strictly greater than the previously pushed key,
    /// and the two keys are not equal (see `DuplicateKey` for the equal case).
    Order { previous: Vec<u8>, attempted: Vec<u8> },

    /// `push` was called twice with the same key.
    DuplicateKey { key: Vec<u8> },

    /// A value fell outside the accepted range, or a key/value could not be coerced at
    /// the boundary.
    Value(String),

    /// The byte image's footer or a node record failed to parse.
    Format(String),

    /// Subscript lookup (`map[key]`) for a key that is not present.
    KeyNotFound { key: Vec<u8> },

    /// An operand could not be coerced to the expected type at the boundary (e.g. mixing
    /// a `Map` and a `Set` in one set-algebra call).
    Type(String),

    /// Propagated from the path/sink boundary.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Order { previous, attempted } => write!(
                f,
                "keys must be pushed in strictly ascending order: {:?} was pushed after {:?}",
                attempted, previous
            ),
            Error::DuplicateKey { key } => write!(f, "duplicate key: {:?}", key),
            Error::Value(msg) => write!(f, "invalid value: {}", msg),
            Error::Format(msg) => write!(f, "malformed fst image: {}", msg),
            Error::KeyNotFound { key } => write!(f, "key not found: {:?}", key),
            Error::Type(msg) => write!(f, "type error: {}", msg),
            Error::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}
