//! Bounded read view over a decompressed archive entry
//!
//! The stream owns the entry's bytes and enforces its bound at construction and
//! at every seek, not per read. A cursor landing at or past the logical length
//! is treated as archive corruption and reported with the fatal
//! [`PakError::StreamOverrun`]; malformed archives must not silently produce
//! truncated or garbage data. Plain byte reads, by contrast, are deliberately
//! lenient: the source formats sometimes over-request at end-of-record, so
//! [`EntryReadStream::read_bytes`] truncates instead of failing.

use crate::error::{PakError, Result};

/// Seek origin for [`EntryReadStream::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Begin,
    Current,
    End,
}

/// Cursor-bounded read stream over one entry's decompressed payload
#[derive(Debug)]
pub struct EntryReadStream {
    buf: Vec<u8>,
    len: u64,
    pos: u64,
}

impl EntryReadStream {
    /// Wrap an owned buffer with a logical length and starting position.
    ///
    /// Fails with [`PakError::StreamOverrun`] if `pos >= len`, and with
    /// [`PakError::TruncatedRecord`] if the backing buffer holds fewer than
    /// `len` bytes.
    pub fn new(buf: Vec<u8>, len: u64, pos: u64) -> Result<Self> {
        if pos >= len {
            return Err(PakError::StreamOverrun { pos, len });
        }
        if len > buf.len() as u64 {
            return Err(PakError::TruncatedRecord {
                needed: len,
                remaining: buf.len() as u64,
            });
        }
        Ok(Self { buf, len, pos })
    }

    /// Recompute the absolute position from `origin`; overrunning the logical
    /// length is unrecoverable.
    pub fn seek(&mut self, offset: i64, origin: Whence) -> Result<()> {
        let base = match origin {
            Whence::Begin => 0i64,
            Whence::Current => self.pos as i64,
            Whence::End => self.len as i64,
        };
        let target = base + offset;
        if target < 0 || target as u64 >= self.len {
            return Err(PakError::StreamOverrun {
                pos: target.max(0) as u64,
                len: self.len,
            });
        }
        self.pos = target as u64;
        Ok(())
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn remaining(&self) -> u64 {
        self.len - self.pos
    }

    /// Raw payload accessor for zero-copy consumers (cooked byte copies).
    pub fn data(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    /// Copy `min(buf.len(), remaining)` bytes into `buf`, advancing by the
    /// copied amount only. Over-length requests truncate silently.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        let avail = self.remaining().min(buf.len() as u64) as usize;
        let start = self.pos as usize;
        buf[..avail].copy_from_slice(&self.buf[start..start + avail]);
        self.pos += avail as u64;
        avail
    }

    /// Exact fixed-size read for structured record fields. Unlike
    /// [`read_bytes`](Self::read_bytes), a short stream is an error here:
    /// zero-filling a record field would hide corruption.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.remaining() < N as u64 {
            return Err(PakError::TruncatedRecord {
                needed: N as u64,
                remaining: self.remaining(),
            });
        }
        let start = self.pos as usize;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[start..start + N]);
        self.pos += N as u64;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array::<2>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array::<4>()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array::<8>()?))
    }

    /// Length-prefixed UTF-8 string (u32 byte count, then bytes).
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as u64;
        if self.remaining() < len {
            return Err(PakError::TruncatedRecord {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let start = self.pos as usize;
        let bytes = self.buf[start..start + len as usize].to_vec();
        self.pos += len;
        String::from_utf8(bytes)
            .map_err(|e| PakError::InvalidFormat(format!("invalid UTF-8 in string: {}", e)))
    }
}

/// Big-endian write helpers mirroring the read side
pub fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn write_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn write_string(out: &mut Vec<u8>, value: &str) {
    write_u32(out, value.len() as u32);
    out.extend_from_slice(value.as_bytes());
}
