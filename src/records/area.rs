//! Area payload records (`AREA`)
//!
//! Per-layer dependency id lists. List 0 belongs to the implicit always-active
//! layer; list `l` belongs to explicit layer `l`. The dependency builder unions
//! all lists into the area's membership set and keeps per-layer sets for
//! layer-depth routing.

use crate::error::{PakError, Result};
use crate::extract::RouteCtx;
use crate::id::UniqueId64;
use crate::paths::ProjectPath;
use crate::record::BinaryRecord;
use crate::stream::{write_u32, EntryReadStream};
use serde::{Deserialize, Serialize};
use std::fs::File;

pub const AREA_MAGIC: u32 = 0x41524541;
pub const AREA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaPayload {
    /// One dependency list per layer, index 0 always active
    pub layer_deps: Vec<Vec<UniqueId64>>,
}

impl BinaryRecord for AreaPayload {
    fn read_from(stream: &mut EntryReadStream) -> Result<Self> {
        let magic = stream.read_u32()?;
        if magic != AREA_MAGIC {
            return Err(PakError::InvalidFormat(format!(
                "bad AREA magic {:08x}",
                magic
            )));
        }
        let version = stream.read_u32()?;
        if version != AREA_VERSION {
            return Err(PakError::UnsupportedVersion(version));
        }

        let layer_count = stream.read_u32()?;
        let mut layer_deps = Vec::with_capacity(layer_count as usize);
        for _ in 0..layer_count {
            let dep_count = stream.read_u32()?;
            let mut deps = Vec::with_capacity(dep_count as usize);
            for _ in 0..dep_count {
                deps.push(UniqueId64::read_from(stream)?);
            }
            layer_deps.push(deps);
        }
        Ok(Self { layer_deps })
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        write_u32(out, AREA_MAGIC);
        write_u32(out, AREA_VERSION);
        write_u32(out, self.layer_deps.len() as u32);
        for deps in &self.layer_deps {
            write_u32(out, deps.len() as u32);
            for id in deps {
                id.write_to(out);
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct AreaWorking {
    layers: Vec<Vec<UniqueId64>>,
    /// Working paths of dependencies defined in the same archive
    resolved: Vec<ResolvedDep>,
}

#[derive(Serialize)]
struct ResolvedDep {
    id: UniqueId64,
    path: String,
}

/// Working-tree extraction: dependency lists plus router-resolved locations of
/// every dependency this archive defines.
pub fn extract(mut stream: EntryReadStream, dest: &ProjectPath, ctx: &RouteCtx) -> Result<()> {
    let payload = AreaPayload::read_from(&mut stream)?;

    let mut resolved = Vec::new();
    for deps in &payload.layer_deps {
        for &id in deps {
            if let Some(entry) = ctx.archive.pak().lookup_entry(id) {
                let path = ctx.working_path(entry)?;
                resolved.push(ResolvedDep {
                    id,
                    path: path.as_path().display().to_string(),
                });
            }
        }
    }

    let working = AreaWorking {
        layers: payload.layer_deps,
        resolved,
    };
    let file = File::create(dest.as_path())?;
    serde_json::to_writer_pretty(file, &working)?;
    Ok(())
}
