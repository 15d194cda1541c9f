//! Archive byte-stream sources
//!
//! The seam between the router and whatever holds the archive bytes (a loose
//! file, a disc image node, an in-memory blob). A source hands out raw byte
//! ranges; [`open_entry`] layers decompression and CRC verification on top and
//! yields the bounded stream every consumer reads through.

use crate::error::{PakError, Result};
use crate::pak::{Compression, PakEntry};
use crate::stream::EntryReadStream;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

/// Provider of raw byte ranges from one archive
pub trait EntrySource {
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_range(&self, offset: u64, size: u64) -> Result<Vec<u8>>;
}

/// Archive blob held fully in memory
pub struct MemorySource {
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl EntrySource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_range(&self, offset: u64, size: u64) -> Result<Vec<u8>> {
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= self.data.len() as u64)
            .ok_or_else(|| {
                PakError::InvalidFormat(format!(
                    "entry range {}+{} exceeds archive length {}",
                    offset,
                    size,
                    self.data.len()
                ))
            })?;
        Ok(self.data[offset as usize..end as usize].to_vec())
    }
}

/// Archive file read with per-range seeks
pub struct FileSource {
    file: Mutex<File>,
    len: u64,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file: Mutex::new(file),
            len,
        })
    }
}

impl EntrySource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_range(&self, offset: u64, size: u64) -> Result<Vec<u8>> {
        let mut file = self.file.lock().expect("file source lock poisoned");
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; size as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// Open one entry: read its stored range, decompress if flagged, verify the
/// payload CRC, and wrap the result in a bounded stream.
pub fn open_entry(source: &dyn EntrySource, entry: &PakEntry) -> Result<EntryReadStream> {
    let stored = source.read_range(entry.offset, entry.stored_size)?;

    let payload = match entry.compression {
        Compression::None => stored,
        Compression::Lz4 => lz4_flex::decompress_size_prepended(&stored)
            .map_err(|e| PakError::DecompressionFailed(format!("LZ4: {}", e)))?,
    };

    let actual = crc32fast::hash(&payload);
    if actual != entry.crc32 {
        return Err(PakError::CrcMismatch {
            expected: entry.crc32,
            actual,
        });
    }

    let len = payload.len() as u64;
    EntryReadStream::new(payload, len, 0)
}
