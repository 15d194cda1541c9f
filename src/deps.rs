//! Level/Area/Layer dependency tree builder
//!
//! Walks one archive's level manifests to produce the spatial hierarchy that
//! drives unique-resource routing depth. Names are resolved through a fallback
//! chain (string table, internal name, synthesized `TYPE_hex`), trimmed of the
//! trailing whitespace the shipped string tables are known to carry, and
//! prefixed with a two-digit index so downstream tooling sorts stably.

use crate::error::Result;
use crate::id::UniqueId64;
use crate::pak::Pak;
use crate::record::BinaryRecord;
use crate::records::strtab::ENGL;
use crate::records::{AreaPayload, LevelManifest, StringTable, WorldMap};
use crate::router::Uniqueness;
use crate::source::{open_entry, EntrySource};
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub const MLVL: crate::id::FourCc = crate::id::FourCc::new(b"MLVL");

/// One explicit layer of an area (enumeration starts at 1; index 0 is the
/// implicit always-active layer and is not listed)
#[derive(Debug, Clone, Default)]
pub struct Layer {
    pub name: String,
    pub active: bool,
    pub resources: HashSet<UniqueId64>,
}

/// One area with its layer list and resource-membership set
#[derive(Debug, Clone, Default)]
pub struct Area {
    pub name: String,
    pub layers: Vec<Layer>,
    pub resources: HashSet<UniqueId64>,
}

/// One level keyed by its manifest entry id
#[derive(Debug, Clone, Default)]
pub struct Level {
    pub name: String,
    pub areas: HashMap<UniqueId64, Area>,
}

/// Resolve a display name through a string table: entry lookup, ENGL index 0,
/// trailing-whitespace trim. Absent table or empty result yields `None`.
fn strg_name(pak: &Pak, source: &dyn EntrySource, id: UniqueId64) -> Result<Option<String>> {
    let entry = match pak.lookup_entry(id) {
        Some(entry) => entry,
        None => return Ok(None),
    };
    let mut stream = open_entry(source, entry)?;
    let table = StringTable::read_from(&mut stream)?;
    let name = match table.get(ENGL, 0) {
        Some(name) => name.trim_end().to_string(),
        None => return Ok(None),
    };
    Ok((!name.is_empty()).then_some(name))
}

fn layer_display_name(raw: &str) -> String {
    let sanitized: String = raw
        .chars()
        .map(|ch| if ch == '/' || ch == '\\' { '-' } else { ch })
        .collect();
    sanitized.trim_end().to_string()
}

/// Build the per-archive level dependency tree.
pub fn build_levels(pak: &Pak, source: &dyn EntrySource) -> Result<HashMap<UniqueId64, Level>> {
    let mut levels = HashMap::new();
    let mut level_idx = 0u32;

    for entry in pak.entries().iter().filter(|e| e.kind == MLVL) {
        let manifest = {
            let mut stream = open_entry(source, entry)?;
            LevelManifest::read_from(&mut stream)?
        };

        let base_name = match strg_name(pak, source, manifest.world_name_id)? {
            Some(name) => name,
            None => pak.best_entry_name(entry),
        };
        let name = format!("{:02} {}", level_idx, base_name);
        level_idx += 1;

        // World map cross-reference; absence is expected data variance
        let area_maps = match pak.lookup_entry(manifest.world_map_id) {
            Some(map_entry) => {
                let mut stream = open_entry(source, map_entry)?;
                WorldMap::read_from(&mut stream)?.area_maps
            }
            None => Vec::new(),
        };

        let mut areas = HashMap::with_capacity(manifest.areas.len());
        let mut layer_name_idx = 0usize;
        for (ai, area_ref) in manifest.areas.iter().enumerate() {
            let base = match strg_name(pak, source, area_ref.area_name_id)? {
                Some(name) => name,
                None if !area_ref.internal_name.is_empty() => area_ref.internal_name.clone(),
                None => format!("AREA_{}", area_ref.area_id),
            };
            let mut area = Area {
                name: format!("{:02} {}", ai, base),
                layers: Vec::new(),
                resources: HashSet::new(),
            };

            // Explicit layers start at index 1; names come from the manifest's
            // flat running list
            let flags = manifest.layer_flags.get(ai).copied().unwrap_or_default();
            if flags.layer_count > 0 {
                area.layers.reserve(flags.layer_count as usize - 1);
                for l in 1..flags.layer_count {
                    let raw = manifest
                        .layer_names
                        .get(layer_name_idx)
                        .map(String::as_str)
                        .unwrap_or("");
                    layer_name_idx += 1;
                    area.layers.push(Layer {
                        name: format!("{:02} {}", l - 1, layer_display_name(raw)),
                        active: flags.flags >> (l - 1) & 1 == 1,
                        resources: HashSet::new(),
                    });
                }
            }

            // Transitive deps from the area payload, unioned into the area set
            // and partitioned per layer for layer-depth routing
            if let Some(area_entry) = pak.lookup_entry(area_ref.area_id) {
                let mut stream = open_entry(source, area_entry)?;
                let payload = AreaPayload::read_from(&mut stream)?;
                for (li, deps) in payload.layer_deps.iter().enumerate() {
                    for &id in deps {
                        area.resources.insert(id);
                        if li >= 1 {
                            if let Some(layer) = area.layers.get_mut(li - 1) {
                                layer.resources.insert(id);
                            }
                        }
                    }
                }
            }

            // The area's own manifest entry is always a member
            area.resources.insert(area_ref.area_id);
            if let Some(&map_id) = area_maps.get(ai) {
                area.resources.insert(map_id);
            }

            areas.insert(area_ref.area_id, area);
        }

        debug!(level = %name, areas = areas.len(), "built level dependency tree");
        levels.insert(entry.id, Level { name, areas });
    }

    Ok(levels)
}

/// Classify one id against the archive's level trees: how many areas claim it
/// determines its routing depth.
pub fn classify(levels: &HashMap<UniqueId64, Level>, id: UniqueId64) -> Uniqueness {
    let mut hits: Vec<&Area> = Vec::new();
    for level in levels.values() {
        for area in level.areas.values() {
            if area.resources.contains(&id) {
                hits.push(area);
            }
        }
    }

    match hits.len() {
        0 => Uniqueness::NotFound,
        1 => {
            let area = hits[0];
            let layer_hits: Vec<&Layer> = area
                .layers
                .iter()
                .filter(|layer| layer.resources.contains(&id))
                .collect();
            if layer_hits.len() == 1 {
                Uniqueness::Layer {
                    area: area.name.clone(),
                    layer: layer_hits[0].name.clone(),
                }
            } else {
                Uniqueness::Area {
                    area: area.name.clone(),
                }
            }
        }
        _ => Uniqueness::Level,
    }
}
