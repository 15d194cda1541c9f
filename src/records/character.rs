//! Animation character descriptor records (`CHAR`)
//!
//! Forward-references a model, skin, and rig by id. Extraction is routed: the
//! working representation embeds the resolved working path of the referenced
//! model, which is why characters extract in a later weight tier than models.

use crate::error::{PakError, Result};
use crate::extract::RouteCtx;
use crate::id::UniqueId64;
use crate::paths::ProjectPath;
use crate::record::BinaryRecord;
use crate::stream::{write_string, write_u32, EntryReadStream};
use serde::{Deserialize, Serialize};
use std::fs::File;

pub const CHAR_MAGIC: u32 = 0x43484152;
pub const CHAR_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Overlay {
    pub name: String,
    pub model_id: UniqueId64,
    pub skin_id: UniqueId64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterDescriptor {
    pub name: String,
    pub model_id: UniqueId64,
    pub skin_id: UniqueId64,
    pub rig_id: UniqueId64,
    pub overlays: Vec<Overlay>,
}

impl BinaryRecord for CharacterDescriptor {
    fn read_from(stream: &mut EntryReadStream) -> Result<Self> {
        let magic = stream.read_u32()?;
        if magic != CHAR_MAGIC {
            return Err(PakError::InvalidFormat(format!(
                "bad CHAR magic {:08x}",
                magic
            )));
        }
        let version = stream.read_u32()?;
        if version != CHAR_VERSION {
            return Err(PakError::UnsupportedVersion(version));
        }

        let name = stream.read_string()?;
        let model_id = UniqueId64::read_from(stream)?;
        let skin_id = UniqueId64::read_from(stream)?;
        let rig_id = UniqueId64::read_from(stream)?;

        let overlay_count = stream.read_u32()?;
        let mut overlays = Vec::with_capacity(overlay_count as usize);
        for _ in 0..overlay_count {
            overlays.push(Overlay {
                name: stream.read_string()?,
                model_id: UniqueId64::read_from(stream)?,
                skin_id: UniqueId64::read_from(stream)?,
            });
        }

        Ok(Self {
            name,
            model_id,
            skin_id,
            rig_id,
            overlays,
        })
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        write_u32(out, CHAR_MAGIC);
        write_u32(out, CHAR_VERSION);
        write_string(out, &self.name);
        self.model_id.write_to(out);
        self.skin_id.write_to(out);
        self.rig_id.write_to(out);
        write_u32(out, self.overlays.len() as u32);
        for overlay in &self.overlays {
            write_string(out, &overlay.name);
            overlay.model_id.write_to(out);
            overlay.skin_id.write_to(out);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct CharacterWorking {
    #[serde(flatten)]
    descriptor: CharacterDescriptor,
    /// Resolved working path of the referenced model, when this archive defines it
    model_path: Option<String>,
}

/// Working-tree extraction with dependency-aware model path resolution.
pub fn extract(mut stream: EntryReadStream, dest: &ProjectPath, ctx: &RouteCtx) -> Result<()> {
    let descriptor = CharacterDescriptor::read_from(&mut stream)?;

    let model_path = match ctx.archive.pak().lookup_entry(descriptor.model_id) {
        Some(entry) => Some(ctx.working_path(entry)?.as_path().display().to_string()),
        None => None,
    };

    let working = CharacterWorking {
        descriptor,
        model_path,
    };
    let file = File::create(dest.as_path())?;
    serde_json::to_writer_pretty(file, &working)?;
    Ok(())
}
