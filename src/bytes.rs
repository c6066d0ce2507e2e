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

//! Low-level byte helpers shared by the node encoder/decoder and the footer.

use crate::error::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Appends `v` to `buf` as a LEB128-style unsigned varint.
pub fn write_uvarint(buf: &mut Vec<u8>, mut v: u64) {
    loop {
        let mut byte = (v & 0x7f) as u8;
        v >>= 7;
        if v != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if v == 0 {
            break;
        }
    }
}

/// Reads an unsigned varint starting at `buf[0]`. Returns the value and the number of
/// bytes consumed.
pub fn read_uvarint(buf: &[u8]) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in buf.iter().enumerate() {
        if shift >= 64 {
            return Err(Error::Format("varint too long".into()));
        }
        result |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }
    Err(Error::Format("truncated varint".into()))
}

/// Writes `v` as the minimal number of little-endian bytes (0 if `v == 0`).
pub fn write_minimal_u64(buf: &mut Vec<u8>, v: u64) -> u8 {
    if v == 0 {
        return 0;
    }
    let n = 8 - (v.leading_zeros() as usize / 8);
    let mut tmp = [0u8; 8];
    LittleEndian::write_u64(&mut tmp, v);
    buf.extend_from_slice(&tmp[..n]);
    n as u8
}

/// Reads `n` little-endian bytes from `buf` as a `u64` (0 if `n == 0`).
pub fn read_minimal_u64(buf: &[u8], n: u8) -> Result<u64> {
    if n == 0 {
        return Ok(0);
    }
    if (n as usize) > buf.len() || n > 8 {
        return Err(Error::Format("truncated output field".into()));
    }
    let mut tmp = [0u8; 8];
    tmp[..n as usize].copy_from_slice(&buf[..n as usize]);
    Ok(LittleEndian::read_u64(&tmp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uvarint_round_trips() {
        for v in [0u64, 1, 127, 128, 300, u32::MAX as u64, u64::MAX] {
            let mut buf = Vec::new();
            write_uvarint(&mut buf, v);
            let (got, used) = read_uvarint(&buf).unwrap();
            assert_eq!(got, v);
            assert_eq!(used, buf.len());
        }
    }

    #[test]
    fn minimal_u64_round_trips() {
        for v in [0u64, 1, 255, 256, 65535, 65536, u64::MAX] {
            let mut buf = Vec::new();
            let n = write_minimal_u64(&mut buf, v);
            assert_eq!(buf.len(), n as usize);
            assert_eq!(read_minimal_u64(&buf, n).unwrap(), v);
        }
    }

    #[test]
    fn read_uvarint_rejects_truncation() {
        assert!(read_uvarint(&[0x80]).is_err());
    }
}
