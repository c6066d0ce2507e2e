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

//! The minimal path/sink boundary: `":memory:"` keeps a built image as owned bytes,
//! anything else is a filesystem path the image is written to (and read back from).
//! Everything here is intentionally thin: no path normalization, no directory creation.

use crate::error::Result;
use memmap2::Mmap;
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const MEMORY_SENTINEL: &str = ":memory:";

/// The byte storage backing a [`crate::reader::Reader`]: either an owned, heap-allocated
/// image or a memory mapping opened directly from a file. Both are cheap to clone (an
/// `Arc` bump) and deref transparently to `&[u8]`.
#[derive(Clone)]
pub enum Backing {
    Owned(Arc<[u8]>),
    Mapped(Arc<Mmap>),
}

impl Deref for Backing {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Backing::Owned(bytes) => bytes,
            Backing::Mapped(mmap) => mmap,
        }
    }
}

impl From<Vec<u8>> for Backing {
    fn from(bytes: Vec<u8>) -> Backing {
        Backing::Owned(bytes.into())
    }
}

/// Where a freshly built image goes.
#[derive(Clone, Debug)]
pub enum Destination {
    Memory,
    Path(PathBuf),
}

impl Destination {
    pub fn parse(path: impl AsRef<Path>) -> Destination {
        let p = path.as_ref();
        if p == Path::new(MEMORY_SENTINEL) {
            Destination::Memory
        } else {
            Destination::Path(p.to_path_buf())
        }
    }

    /// Delivers a finished image: written to disk for `Path`, kept in memory otherwise.
    /// Either way, returns the bytes a [`crate::reader::Reader`] can be built from.
    pub fn deliver(&self, image: Vec<u8>) -> Result<Vec<u8>> {
        match self {
            Destination::Memory => Ok(image),
            Destination::Path(p) => {
                fs::write(p, &image)?;
                Ok(image)
            }
        }
    }
}

/// Where bytes to read an image from come from: already-owned bytes, a plain file read,
/// or a file opened as a memory mapping.
pub enum Source {
    Bytes(Vec<u8>),
    Path(PathBuf),
    Mmap(PathBuf),
}

impl Source {
    /// A plain file read. This is the default `open` path: simplest, and correct even if
    /// the file is modified or removed after loading.
    pub fn parse(path: impl AsRef<Path>) -> Source {
        Source::Path(path.as_ref().to_path_buf())
    }

    /// A memory-mapped file read. Avoids copying the image into the heap, at the cost of
    /// the usual mmap caveat: the mapping is undefined behavior if the file is mutated or
    /// truncated while any reader built from it is still alive.
    pub fn mmap(path: impl AsRef<Path>) -> Source {
        Source::Mmap(path.as_ref().to_path_buf())
    }

    pub fn load(self) -> Result<Backing> {
        match self {
            Source::Bytes(b) => Ok(b.into()),
            Source::Path(p) => Ok(fs::read(p)?.into()),
            Source::Mmap(p) => {
                let file = fs::File::open(p)?;
                // SAFETY: caller-enforced invariant — the mapped file must not be mutated
                // or truncated for as long as any Reader built from this mapping lives.
                let mmap = unsafe { Mmap::map(&file)? };
                Ok(Backing::Mapped(Arc::new(mmap)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sentinel_is_recognized() {
        assert!(matches!(Destination::parse(":memory:"), Destination::Memory));
        assert!(matches!(Destination::parse("/tmp/foo.fst"), Destination::Path(_)));
    }
}
