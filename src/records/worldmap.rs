//! World map records (`MAPW`)
//!
//! An ordered list of per-area map resource ids, cross-referenced from the
//! level manifest by area index.

use crate::error::{PakError, Result};
use crate::id::UniqueId64;
use crate::paths::ProjectPath;
use crate::record::BinaryRecord;
use crate::stream::{write_u32, EntryReadStream};
use serde::{Deserialize, Serialize};
use std::fs::File;

pub const MAPW_MAGIC: u32 = 0x4D415057;
pub const MAPW_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldMap {
    pub area_maps: Vec<UniqueId64>,
}

impl BinaryRecord for WorldMap {
    fn read_from(stream: &mut EntryReadStream) -> Result<Self> {
        let magic = stream.read_u32()?;
        if magic != MAPW_MAGIC {
            return Err(PakError::InvalidFormat(format!(
                "bad MAPW magic {:08x}",
                magic
            )));
        }
        let version = stream.read_u32()?;
        if version != MAPW_VERSION {
            return Err(PakError::UnsupportedVersion(version));
        }

        let area_count = stream.read_u32()?;
        let mut area_maps = Vec::with_capacity(area_count as usize);
        for _ in 0..area_count {
            area_maps.push(UniqueId64::read_from(stream)?);
        }
        Ok(Self { area_maps })
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        write_u32(out, MAPW_MAGIC);
        write_u32(out, MAPW_VERSION);
        write_u32(out, self.area_maps.len() as u32);
        for id in &self.area_maps {
            id.write_to(out);
        }
        Ok(())
    }
}

pub fn extract(mut stream: EntryReadStream, dest: &ProjectPath) -> Result<()> {
    let map = WorldMap::read_from(&mut stream)?;
    let file = File::create(dest.as_path())?;
    serde_json::to_writer_pretty(file, &map)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_roundtrip() {
        let map = WorldMap {
            area_maps: vec![UniqueId64::new(0xA1), UniqueId64::new(0xA2)],
        };
        let mut bytes = map.to_bytes().unwrap();
        bytes.push(0);
        let len = bytes.len() as u64;
        let mut stream = EntryReadStream::new(bytes, len, 0).unwrap();
        let back = WorldMap::read_from(&mut stream).unwrap();
        assert_eq!(back.area_maps, map.area_maps);
    }
}
