//! Model records (`CMDL`)

use crate::error::{PakError, Result};
use crate::paths::ProjectPath;
use crate::record::BinaryRecord;
use crate::stream::{write_u32, EntryReadStream};
use serde::{Deserialize, Serialize};
use std::fs::File;

pub const CMDL_MAGIC: u32 = 0x434D444C;
pub const CMDL_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    pub vertex_count: u32,
    pub triangle_count: u32,
    /// Raw geometry payload, opaque to the router
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl BinaryRecord for Model {
    fn read_from(stream: &mut EntryReadStream) -> Result<Self> {
        let magic = stream.read_u32()?;
        if magic != CMDL_MAGIC {
            return Err(PakError::InvalidFormat(format!(
                "bad CMDL magic {:08x}",
                magic
            )));
        }
        let version = stream.read_u32()?;
        if version != CMDL_VERSION {
            return Err(PakError::UnsupportedVersion(version));
        }

        let vertex_count = stream.read_u32()?;
        let triangle_count = stream.read_u32()?;

        // Geometry runs to end-of-record; the lenient read drains what remains
        let mut data = vec![0u8; stream.remaining() as usize];
        let copied = stream.read_bytes(&mut data);
        data.truncate(copied);

        Ok(Self {
            vertex_count,
            triangle_count,
            data,
        })
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        write_u32(out, CMDL_MAGIC);
        write_u32(out, CMDL_VERSION);
        write_u32(out, self.vertex_count);
        write_u32(out, self.triangle_count);
        out.extend_from_slice(&self.data);
        Ok(())
    }
}

/// Working-tree extraction: geometry summary as JSON.
pub fn extract(mut stream: EntryReadStream, dest: &ProjectPath) -> Result<()> {
    let model = Model::read_from(&mut stream)?;
    let file = File::create(dest.as_path())?;
    serde_json::to_writer_pretty(file, &model)?;
    Ok(())
}
