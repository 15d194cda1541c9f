//! Level manifest records (`MLVL`)
//!
//! The root manifest of one level: name and world-map cross-references plus the
//! area list with per-area layer flags. Layer names live in one flat list
//! consumed sequentially across all areas, and layer index 0 of every area is
//! implicitly always active, so an area with `layer_count == n` contributes
//! `n - 1` names to the list.

use crate::error::{PakError, Result};
use crate::extract::RouteCtx;
use crate::id::UniqueId64;
use crate::paths::ProjectPath;
use crate::record::BinaryRecord;
use crate::stream::{write_string, write_u32, write_u64, EntryReadStream};
use serde::{Deserialize, Serialize};
use std::fs::File;

pub const MLVL_MAGIC: u32 = 0x4D4C564C;
pub const MLVL_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaRef {
    /// String-table entry naming the area (may be absent from the archive)
    pub area_name_id: UniqueId64,
    /// The area payload entry itself
    pub area_id: UniqueId64,
    /// Authoring-time name, used when no string table resolves
    pub internal_name: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LayerFlags {
    /// Layer count including the implicit always-active layer 0
    pub layer_count: u32,
    /// Bit `l-1` set means layer `l` starts active
    pub flags: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelManifest {
    pub world_name_id: UniqueId64,
    pub world_map_id: UniqueId64,
    pub areas: Vec<AreaRef>,
    pub layer_flags: Vec<LayerFlags>,
    pub layer_names: Vec<String>,
}

impl BinaryRecord for LevelManifest {
    fn read_from(stream: &mut EntryReadStream) -> Result<Self> {
        let magic = stream.read_u32()?;
        if magic != MLVL_MAGIC {
            return Err(PakError::InvalidFormat(format!(
                "bad MLVL magic {:08x}",
                magic
            )));
        }
        let version = stream.read_u32()?;
        if version != MLVL_VERSION {
            return Err(PakError::UnsupportedVersion(version));
        }

        let world_name_id = UniqueId64::read_from(stream)?;
        let world_map_id = UniqueId64::read_from(stream)?;

        let area_count = stream.read_u32()?;
        let mut areas = Vec::with_capacity(area_count as usize);
        for _ in 0..area_count {
            areas.push(AreaRef {
                area_name_id: UniqueId64::read_from(stream)?,
                area_id: UniqueId64::read_from(stream)?,
                internal_name: stream.read_string()?,
            });
        }

        let mut layer_flags = Vec::with_capacity(area_count as usize);
        for _ in 0..area_count {
            layer_flags.push(LayerFlags {
                layer_count: stream.read_u32()?,
                flags: stream.read_u64()?,
            });
        }

        let name_count = stream.read_u32()?;
        let mut layer_names = Vec::with_capacity(name_count as usize);
        for _ in 0..name_count {
            layer_names.push(stream.read_string()?);
        }

        Ok(Self {
            world_name_id,
            world_map_id,
            areas,
            layer_flags,
            layer_names,
        })
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        write_u32(out, MLVL_MAGIC);
        write_u32(out, MLVL_VERSION);
        self.world_name_id.write_to(out);
        self.world_map_id.write_to(out);

        write_u32(out, self.areas.len() as u32);
        for area in &self.areas {
            area.area_name_id.write_to(out);
            area.area_id.write_to(out);
            write_string(out, &area.internal_name);
        }
        for flags in &self.layer_flags {
            write_u32(out, flags.layer_count);
            write_u64(out, flags.flags);
        }
        write_u32(out, self.layer_names.len() as u32);
        for name in &self.layer_names {
            write_string(out, name);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct LevelWorking {
    #[serde(flatten)]
    manifest: LevelManifest,
    /// Working paths of area entries defined in the same archive
    area_paths: Vec<Option<String>>,
}

/// Working-tree extraction: manifest JSON with router-resolved area locations.
pub fn extract(mut stream: EntryReadStream, dest: &ProjectPath, ctx: &RouteCtx) -> Result<()> {
    let manifest = LevelManifest::read_from(&mut stream)?;

    let mut area_paths = Vec::with_capacity(manifest.areas.len());
    for area in &manifest.areas {
        let path = match ctx.archive.pak().lookup_entry(area.area_id) {
            Some(entry) => Some(ctx.working_path(entry)?.as_path().display().to_string()),
            None => None,
        };
        area_paths.push(path);
    }

    let working = LevelWorking {
        manifest,
        area_paths,
    };
    let file = File::create(dest.as_path())?;
    serde_json::to_writer_pretty(file, &working)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_roundtrip() {
        let manifest = LevelManifest {
            world_name_id: UniqueId64::new(0x100),
            world_map_id: UniqueId64::new(0x200),
            areas: vec![
                AreaRef {
                    area_name_id: UniqueId64::new(0x301),
                    area_id: UniqueId64::new(0x401),
                    internal_name: "intro_underwater".into(),
                },
                AreaRef {
                    area_name_id: UniqueId64::new(0x302),
                    area_id: UniqueId64::new(0x402),
                    internal_name: String::new(),
                },
            ],
            layer_flags: vec![
                LayerFlags {
                    layer_count: 3,
                    flags: 0b01,
                },
                LayerFlags {
                    layer_count: 1,
                    flags: 0,
                },
            ],
            layer_names: vec!["1st Pass".into(), "2nd Pass".into()],
        };

        let mut bytes = manifest.to_bytes().unwrap();
        bytes.push(0);
        let len = bytes.len() as u64;
        let mut stream = EntryReadStream::new(bytes, len, 0).unwrap();
        let back = LevelManifest::read_from(&mut stream).unwrap();

        assert_eq!(back.world_name_id, manifest.world_name_id);
        assert_eq!(back.areas.len(), 2);
        assert_eq!(back.areas[0].internal_name, "intro_underwater");
        assert_eq!(back.layer_flags[0].layer_count, 3);
        assert_eq!(back.layer_names, manifest.layer_names);
    }
}
