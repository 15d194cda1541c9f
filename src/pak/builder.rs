//! PAK archive writer
//!
//! Builds a complete archive blob: directory at the head, entry payloads after
//! it. Offsets are assigned once the directory size is known; CRCs always cover
//! the uncompressed payload.

use crate::id::{FourCc, UniqueId64};
use crate::pak::format::{Compression, PAK_VERSION};
use crate::stream::{write_string, write_u32, write_u64};

struct PendingEntry {
    kind: FourCc,
    id: UniqueId64,
    compression: Compression,
    stored: Vec<u8>,
    crc32: u32,
}

/// Incremental PAK archive builder
#[derive(Default)]
pub struct PakBuilder {
    entries: Vec<PendingEntry>,
    names: Vec<(String, UniqueId64)>,
}

impl PakBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an uncompressed entry.
    pub fn add_entry(&mut self, kind: FourCc, id: UniqueId64, data: &[u8]) {
        self.add_entry_with_compression(kind, id, data, Compression::None);
    }

    /// Add an entry, optionally LZ4-compressing its payload.
    pub fn add_entry_with_compression(
        &mut self,
        kind: FourCc,
        id: UniqueId64,
        data: &[u8],
        compression: Compression,
    ) {
        let crc32 = crc32fast::hash(data);
        let stored = match compression {
            Compression::None => data.to_vec(),
            Compression::Lz4 => lz4_flex::compress_prepend_size(data),
        };
        self.entries.push(PendingEntry {
            kind,
            id,
            compression,
            stored,
            crc32,
        });
    }

    /// Register a display-name hint for an id.
    pub fn add_name(&mut self, name: impl Into<String>, id: UniqueId64) {
        self.names.push((name.into(), id));
    }

    /// Serialize the archive: directory, then payloads in insertion order.
    pub fn finish(self) -> Vec<u8> {
        let mut dir_size = 4 + 4 + 4; // version + named_count + entry_count
        for (name, _) in &self.names {
            dir_size += 4 + 8 + 4 + name.len();
        }
        dir_size += self.entries.len() * (4 + 4 + 8 + 4 + 8 + 4);

        let mut out = Vec::with_capacity(dir_size);
        write_u32(&mut out, PAK_VERSION);

        write_u32(&mut out, self.names.len() as u32);
        for (name, id) in &self.names {
            let kind = self
                .entries
                .iter()
                .find(|e| e.id == *id)
                .map(|e| e.kind)
                .unwrap_or(FourCc::new(b"\0\0\0\0"));
            kind.write_to(&mut out);
            id.write_to(&mut out);
            write_string(&mut out, name);
        }

        write_u32(&mut out, self.entries.len() as u32);
        let mut offset = dir_size as u64;
        for entry in &self.entries {
            write_u32(&mut out, entry.compression as u32);
            entry.kind.write_to(&mut out);
            entry.id.write_to(&mut out);
            write_u32(&mut out, entry.stored.len() as u32);
            write_u64(&mut out, offset);
            write_u32(&mut out, entry.crc32);
            offset += entry.stored.len() as u64;
        }

        debug_assert_eq!(out.len(), dir_size);
        for entry in &self.entries {
            out.extend_from_slice(&entry.stored);
        }
        out
    }
}
