//! PAK directory format
//!
//! Big-endian, version 2. Layout:
//!
//! ```text
//! u32 version (= 2)
//! u32 named_count
//!   each: FourCc | u64 id | u32 name_len | utf8 name
//! u32 entry_count
//!   each: u32 compression | FourCc | u64 id | u32 stored_size | u64 offset | u32 crc32
//! ```
//!
//! Offsets are absolute within the archive blob. `stored_size` is the on-disk
//! (possibly compressed) byte count; `crc32` covers the decompressed payload.

use crate::error::{PakError, Result};
use crate::id::{FourCc, UniqueId64};
use crate::router::Uniqueness;
use crate::stream::{write_u32, write_u64, write_string, EntryReadStream};
use std::collections::HashMap;

/// Current directory format version
pub const PAK_VERSION: u32 = 2;

/// Per-entry compression method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Compression {
    None = 0,
    Lz4 = 1,
}

impl Compression {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Lz4),
            _ => Err(PakError::InvalidCompression(value)),
        }
    }
}

/// One record in a PAK directory
#[derive(Debug, Clone)]
pub struct PakEntry {
    pub id: UniqueId64,
    pub kind: FourCc,
    pub compression: Compression,
    pub offset: u64,
    /// On-disk byte count (compressed size when `compression != None`)
    pub stored_size: u64,
    /// CRC32 of the decompressed payload
    pub crc32: u32,
    /// Assigned during the archive's dependency build pass
    pub uniqueness: Uniqueness,
}

/// Parsed PAK directory with id and name lookup
#[derive(Debug, Default)]
pub struct Pak {
    entries: Vec<PakEntry>,
    id_map: HashMap<UniqueId64, usize>,
    name_map: HashMap<String, UniqueId64>,
    name_hints: HashMap<UniqueId64, String>,
}

impl Pak {
    /// Parse a directory from the head of an archive blob.
    pub fn parse(stream: &mut EntryReadStream) -> Result<Self> {
        let version = stream.read_u32()?;
        if version != PAK_VERSION {
            return Err(PakError::UnsupportedVersion(version));
        }

        let named_count = stream.read_u32()?;
        let mut name_map = HashMap::with_capacity(named_count as usize);
        let mut name_hints = HashMap::with_capacity(named_count as usize);
        for _ in 0..named_count {
            let _kind = FourCc::read_from(stream)?;
            let id = UniqueId64::read_from(stream)?;
            let name = stream.read_string()?;
            // First name wins as the display hint
            name_hints.entry(id).or_insert_with(|| name.clone());
            name_map.insert(name, id);
        }

        let entry_count = stream.read_u32()?;
        let mut entries = Vec::with_capacity(entry_count as usize);
        let mut id_map = HashMap::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            let compression = Compression::from_u32(stream.read_u32()?)?;
            let kind = FourCc::read_from(stream)?;
            let id = UniqueId64::read_from(stream)?;
            let stored_size = stream.read_u32()? as u64;
            let offset = stream.read_u64()?;
            let crc32 = stream.read_u32()?;
            id_map.insert(id, entries.len());
            entries.push(PakEntry {
                id,
                kind,
                compression,
                offset,
                stored_size,
                crc32,
                uniqueness: Uniqueness::NotFound,
            });
        }

        Ok(Self {
            entries,
            id_map,
            name_map,
            name_hints,
        })
    }

    /// Serialize the directory (without entry payloads).
    pub fn write_directory(&self, out: &mut Vec<u8>) {
        write_u32(out, PAK_VERSION);

        write_u32(out, self.name_map.len() as u32);
        // Stable output: sort names for deterministic directories
        let mut names: Vec<_> = self.name_map.iter().collect();
        names.sort_by(|a, b| a.0.cmp(b.0));
        for (name, id) in names {
            let kind = self
                .lookup_entry(*id)
                .map(|e| e.kind)
                .unwrap_or(FourCc::new(b"\0\0\0\0"));
            kind.write_to(out);
            id.write_to(out);
            write_string(out, name);
        }

        write_u32(out, self.entries.len() as u32);
        for entry in &self.entries {
            write_u32(out, entry.compression as u32);
            entry.kind.write_to(out);
            entry.id.write_to(out);
            write_u32(out, entry.stored_size as u32);
            write_u64(out, entry.offset);
            write_u32(out, entry.crc32);
        }
    }

    pub fn entries(&self) -> &[PakEntry] {
        &self.entries
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn lookup_entry(&self, id: UniqueId64) -> Option<&PakEntry> {
        self.id_map.get(&id).map(|&idx| &self.entries[idx])
    }

    pub fn lookup_name(&self, name: &str) -> Option<UniqueId64> {
        self.name_map.get(name).copied()
    }

    /// Best-effort display name: name hint if one exists, else `"<TYPE>_<hex>"`.
    pub fn best_entry_name(&self, entry: &PakEntry) -> String {
        if let Some(name) = self.name_hints.get(&entry.id) {
            return name.clone();
        }
        format!("{}_{}", entry.kind, entry.id)
    }

    pub(crate) fn set_uniqueness(&mut self, index: usize, uniqueness: Uniqueness) {
        self.entries[index].uniqueness = uniqueness;
    }
}
