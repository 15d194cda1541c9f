//! Cross-archive resource routing
//!
//! [`ResourceRouter`] ingests every archive's entry table, partitions ids into
//! unique-to-one-archive and shared-across-archives, and answers per-entry
//! working/cooked path queries. The partition is a single linear pass over all
//! archives' entries with hash-map membership tests; it is recomputed from
//! scratch on every [`ResourceRouter::build`] so a changed archive set never
//! inherits stale classifications.

use crate::deps::{build_levels, classify, Level};
use crate::error::{PakError, Result};
use crate::extract::ResExtractor;
use crate::id::UniqueId64;
use crate::pak::{Pak, PakEntry};
use crate::paths::ProjectPath;
use crate::source::{open_entry, EntrySource};
use crate::stream::EntryReadStream;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Where a unique resource lives under its archive root
///
/// Depth follows the spatial hierarchy: a resource claimed by several areas
/// (or none) sits at the archive root, one area's resource in its area
/// directory, one layer's resource one level deeper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Uniqueness {
    #[default]
    NotFound,
    Level,
    Area {
        area: String,
    },
    Layer {
        area: String,
        layer: String,
    },
}

impl Uniqueness {
    /// Resolve (and materialize) the routing directory under `pak_root`.
    pub fn unique_path(&self, pak_root: &ProjectPath) -> Result<ProjectPath> {
        match self {
            Uniqueness::NotFound | Uniqueness::Level => Ok(pak_root.clone()),
            Uniqueness::Area { area } => {
                let area_dir = pak_root.join(area);
                area_dir.make_dir()?;
                Ok(area_dir)
            }
            Uniqueness::Layer { area, layer } => {
                let area_dir = pak_root.join(area);
                area_dir.make_dir()?;
                let layer_dir = area_dir.join(layer);
                layer_dir.make_dir()?;
                Ok(layer_dir)
            }
        }
    }
}

/// One archive bound to its byte source, directory, and dependency tree
pub struct PakArchive {
    name: String,
    pak: Pak,
    source: Box<dyn EntrySource>,
    levels: HashMap<UniqueId64, Level>,
}

impl PakArchive {
    /// Parse the directory from the head of the source.
    pub fn open(name: impl Into<String>, source: Box<dyn EntrySource>) -> Result<Self> {
        let bytes = source.read_range(0, source.len())?;
        let len = bytes.len() as u64;
        let mut stream = EntryReadStream::new(bytes, len, 0)?;
        let pak = Pak::parse(&mut stream)?;
        Ok(Self {
            name: name.into(),
            pak,
            source,
            levels: HashMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Archive name without its `.pak` suffix; names the per-archive output
    /// subtree.
    pub fn base_name(&self) -> &str {
        self.name.strip_suffix(".pak").unwrap_or(&self.name)
    }

    pub fn pak(&self) -> &Pak {
        &self.pak
    }

    pub fn levels(&self) -> &HashMap<UniqueId64, Level> {
        &self.levels
    }

    /// Comma-joined display names of every level this archive defines, for
    /// listings and log lines. Empty before [`PakArchive::build`]. Sorted so
    /// the summary is stable across runs.
    pub fn level_string(&self) -> String {
        let mut names: Vec<&str> = self.levels.values().map(|l| l.name.as_str()).collect();
        names.sort_unstable();
        names.join(", ")
    }

    /// Fresh bounded stream over one entry's decompressed payload.
    pub fn open_entry(&self, entry: &PakEntry) -> Result<EntryReadStream> {
        open_entry(self.source.as_ref(), entry)
    }

    /// Build the dependency tree and classify every entry's uniqueness.
    /// Recomputed from scratch on every call.
    pub fn build(&mut self) -> Result<()> {
        self.levels = build_levels(&self.pak, self.source.as_ref())?;
        let classifications: Vec<Uniqueness> = self
            .pak
            .entries()
            .iter()
            .map(|entry| classify(&self.levels, entry.id))
            .collect();
        for (index, uniqueness) in classifications.into_iter().enumerate() {
            self.pak.set_uniqueness(index, uniqueness);
        }
        debug!(archive = %self.name, levels = self.levels.len(), "archive build complete");
        Ok(())
    }
}

struct EnteredPak {
    working: ProjectPath,
    cooked: ProjectPath,
}

/// Router state machine: unbuilt, built, then entered per archive context
pub struct ResourceRouter {
    game_working: ProjectPath,
    game_cooked: ProjectPath,
    shared_working: ProjectPath,
    shared_cooked: ProjectPath,
    unique_entries: HashMap<UniqueId64, usize>,
    shared_entries: HashMap<UniqueId64, usize>,
    built: bool,
    entered: Option<EnteredPak>,
}

impl ResourceRouter {
    pub fn new(working: ProjectPath, cooked: ProjectPath) -> Self {
        let shared_working = working.join("Shared");
        let shared_cooked = cooked.join("Shared");
        Self {
            game_working: working,
            game_cooked: cooked,
            shared_working,
            shared_cooked,
            unique_entries: HashMap::new(),
            shared_entries: HashMap::new(),
            built: false,
            entered: None,
        }
    }

    /// Partition every archive's ids into unique and shared. Clears all prior
    /// state first; re-entrant calls recompute rather than merge.
    ///
    /// The first archive defining an id stays the canonical slot when the id
    /// turns out shared. Duplicate definitions are expected to be
    /// byte-identical; the directory CRC and size are compared and a mismatch
    /// logged, but content is still taken from the first archive.
    pub fn build(
        &mut self,
        archives: &mut [PakArchive],
        progress: &mut dyn FnMut(f32),
    ) -> Result<()> {
        self.unique_entries.clear();
        self.shared_entries.clear();
        self.entered = None;
        self.built = false;

        let total = archives.len().max(1) as f32;
        for idx in 0..archives.len() {
            archives[idx].build()?;

            // A directory may list the same id more than once; only presence
            // in a second archive makes an id shared
            let mut seen = HashSet::new();
            let entry_meta: Vec<(UniqueId64, u32, u64)> = archives[idx]
                .pak()
                .entries()
                .iter()
                .filter(|e| seen.insert(e.id))
                .map(|e| (e.id, e.crc32, e.stored_size))
                .collect();
            for (id, crc32, stored_size) in entry_meta {
                if let Some(&canonical_idx) = self.shared_entries.get(&id) {
                    // Third or later definition: stays shared
                    self.verify_duplicate(archives, canonical_idx, id, crc32, stored_size);
                } else if let Some(canonical_idx) = self.unique_entries.remove(&id) {
                    self.verify_duplicate(archives, canonical_idx, id, crc32, stored_size);
                    self.shared_entries.insert(id, canonical_idx);
                } else {
                    self.unique_entries.insert(id, idx);
                }
            }

            progress((idx + 1) as f32 / total);
        }

        self.built = true;
        debug!(
            unique = self.unique_entries.len(),
            shared = self.shared_entries.len(),
            "router partition complete"
        );
        Ok(())
    }

    fn verify_duplicate(
        &self,
        archives: &[PakArchive],
        canonical_idx: usize,
        id: UniqueId64,
        crc32: u32,
        stored_size: u64,
    ) {
        if let Some(canonical) = archives[canonical_idx].pak().lookup_entry(id) {
            if canonical.crc32 != crc32 || canonical.stored_size != stored_size {
                warn!(
                    id = %id,
                    canonical_archive = %archives[canonical_idx].name(),
                    "shared entry payload differs between archives; keeping first definition"
                );
            }
        }
    }

    /// Establish which archive's output roots subsequent path queries resolve
    /// against. May be called repeatedly to switch contexts.
    pub fn enter_archive(&mut self, archive: &PakArchive) -> Result<()> {
        if !self.built {
            return Err(PakError::RouterNotBuilt);
        }
        let working = self.game_working.join(archive.base_name());
        working.make_dir()?;
        let cooked = self.game_cooked.join(archive.base_name());
        cooked.make_dir()?;
        self.entered = Some(EnteredPak { working, cooked });
        Ok(())
    }

    fn entered(&self) -> Result<&EnteredPak> {
        if !self.built {
            return Err(PakError::RouterNotBuilt);
        }
        self.entered.as_ref().ok_or(PakError::ArchiveNotEntered)
    }

    /// Working-tree destination for one entry. Shared entries resolve under
    /// the common `Shared` subtree, with a link from the per-archive location
    /// when the extractor produces working output at all.
    pub fn working_path(
        &self,
        archive: &PakArchive,
        entry: &PakEntry,
        extractor: &ResExtractor,
    ) -> Result<ProjectPath> {
        let entered = self.entered()?;
        let mut name = archive.pak().best_entry_name(entry);
        if !extractor.file_ext.is_empty() {
            name.push_str(extractor.file_ext);
        }

        if self.unique_entries.contains_key(&entry.id) {
            let dir = entry.uniqueness.unique_path(&entered.working)?;
            return Ok(dir.join(name));
        }
        if self.shared_entries.contains_key(&entry.id) {
            self.shared_working.make_dir()?;
            let shared = self.shared_working.join(&name);
            if extractor.has_fn() {
                let unique_dir = entry.uniqueness.unique_path(&entered.working)?;
                unique_dir.join(&name).make_link_to(&shared)?;
            }
            return Ok(shared);
        }
        Err(PakError::EntryNotFound(entry.id.to_string()))
    }

    /// Cooked-tree destination: byte-exact copy named by the display name
    /// alone, no extension.
    pub fn cooked_path(&self, archive: &PakArchive, entry: &PakEntry) -> Result<ProjectPath> {
        let entered = self.entered()?;
        let name = archive.pak().best_entry_name(entry);

        if self.unique_entries.contains_key(&entry.id) {
            let dir = entry.uniqueness.unique_path(&entered.cooked)?;
            return Ok(dir.join(name));
        }
        if self.shared_entries.contains_key(&entry.id) {
            self.shared_cooked.make_dir()?;
            return Ok(self.shared_cooked.join(name));
        }
        Err(PakError::EntryNotFound(entry.id.to_string()))
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn unique_count(&self) -> usize {
        self.unique_entries.len()
    }

    pub fn shared_count(&self) -> usize {
        self.shared_entries.len()
    }

    pub fn is_shared(&self, id: UniqueId64) -> bool {
        self.shared_entries.contains_key(&id)
    }

    pub fn is_unique(&self, id: UniqueId64) -> bool {
        self.unique_entries.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::FourCc;
    use crate::pak::PakBuilder;
    use crate::source::MemorySource;

    const TXTR: FourCc = FourCc::new(b"TXTR");

    fn archive(name: &str, ids: &[u64]) -> PakArchive {
        let mut builder = PakBuilder::new();
        for &id in ids {
            builder.add_entry(TXTR, UniqueId64::new(id), format!("data-{id}").as_bytes());
        }
        PakArchive::open(name, Box::new(MemorySource::new(builder.finish()))).unwrap()
    }

    fn built_router(archives: &mut [PakArchive]) -> (ResourceRouter, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let mut router = ResourceRouter::new(
            ProjectPath::new(tmp.path().join("working")),
            ProjectPath::new(tmp.path().join("cooked")),
        );
        router.build(archives, &mut |_| {}).unwrap();
        (router, tmp)
    }

    #[test]
    fn disjoint_archives_have_no_shared_entries() {
        let mut archives = vec![archive("a.pak", &[0x01, 0x02]), archive("b.pak", &[0x03, 0x04])];
        let (router, _tmp) = built_router(&mut archives);

        assert_eq!(router.unique_count(), 4);
        assert_eq!(router.shared_count(), 0);
        for id in [0x01, 0x02, 0x03, 0x04] {
            assert!(router.is_unique(UniqueId64::new(id)));
        }
    }

    #[test]
    fn overlapping_id_moves_to_shared() {
        let mut archives = vec![archive("a.pak", &[0x01, 0x02]), archive("b.pak", &[0x02, 0x03])];
        let (router, _tmp) = built_router(&mut archives);

        assert_eq!(router.unique_count(), 2);
        assert_eq!(router.shared_count(), 1);
        assert!(router.is_unique(UniqueId64::new(0x01)));
        assert!(router.is_unique(UniqueId64::new(0x03)));
        assert!(router.is_shared(UniqueId64::new(0x02)));
        // Strict partition
        assert!(!router.is_unique(UniqueId64::new(0x02)));
    }

    #[test]
    fn duplicate_id_within_one_archive_stays_unique() {
        // Two directory rows for the same id in a single archive; the id is
        // still defined by only one archive
        let mut builder = PakBuilder::new();
        builder.add_entry(TXTR, UniqueId64::new(0x42), b"first copy");
        builder.add_entry(TXTR, UniqueId64::new(0x42), b"second copy");
        builder.add_entry(TXTR, UniqueId64::new(0x43), b"other");
        let mut archives = vec![
            PakArchive::open("a.pak", Box::new(MemorySource::new(builder.finish()))).unwrap(),
        ];
        let (router, _tmp) = built_router(&mut archives);

        assert!(router.is_unique(UniqueId64::new(0x42)));
        assert!(!router.is_shared(UniqueId64::new(0x42)));
        assert_eq!(router.unique_count(), 2);
        assert_eq!(router.shared_count(), 0);
    }

    #[test]
    fn duplicated_id_still_moves_to_shared_across_archives() {
        let mut builder = PakBuilder::new();
        builder.add_entry(TXTR, UniqueId64::new(0x42), b"payload");
        builder.add_entry(TXTR, UniqueId64::new(0x42), b"payload");
        let mut archives = vec![
            PakArchive::open("a.pak", Box::new(MemorySource::new(builder.finish()))).unwrap(),
            archive("b.pak", &[0x42]),
        ];
        let (router, _tmp) = built_router(&mut archives);

        assert!(router.is_shared(UniqueId64::new(0x42)));
        assert!(!router.is_unique(UniqueId64::new(0x42)));
    }

    #[test]
    fn level_string_joins_built_level_names() {
        use crate::deps::MLVL;
        use crate::record::BinaryRecord;
        use crate::records::LevelManifest;

        let mut builder = PakBuilder::new();
        let manifest = LevelManifest::default();
        builder.add_entry(MLVL, UniqueId64::new(0x300), &manifest.to_bytes().unwrap());
        builder.add_entry(MLVL, UniqueId64::new(0x301), &manifest.to_bytes().unwrap());
        let mut archive =
            PakArchive::open("Worlds.pak", Box::new(MemorySource::new(builder.finish()))).unwrap();

        assert_eq!(archive.level_string(), "");
        archive.build().unwrap();
        assert_eq!(
            archive.level_string(),
            "00 MLVL_0000000000000300, 01 MLVL_0000000000000301"
        );
    }

    #[test]
    fn three_way_duplicate_stays_shared() {
        let mut archives = vec![
            archive("a.pak", &[0x05]),
            archive("b.pak", &[0x05]),
            archive("c.pak", &[0x05, 0x06]),
        ];
        let (router, _tmp) = built_router(&mut archives);

        assert!(router.is_shared(UniqueId64::new(0x05)));
        assert!(!router.is_unique(UniqueId64::new(0x05)));
        assert!(router.is_unique(UniqueId64::new(0x06)));
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut archives = vec![archive("a.pak", &[0x01, 0x02]), archive("b.pak", &[0x02, 0x03])];
        let tmp = tempfile::tempdir().unwrap();
        let mut router = ResourceRouter::new(
            ProjectPath::new(tmp.path().join("working")),
            ProjectPath::new(tmp.path().join("cooked")),
        );
        router.build(&mut archives, &mut |_| {}).unwrap();
        let (unique1, shared1) = (router.unique_count(), router.shared_count());
        router.build(&mut archives, &mut |_| {}).unwrap();
        assert_eq!(router.unique_count(), unique1);
        assert_eq!(router.shared_count(), shared1);
    }

    #[test]
    fn path_queries_before_build_and_enter_are_usage_errors() {
        let mut archives = vec![archive("a.pak", &[0x01])];
        let tmp = tempfile::tempdir().unwrap();
        let mut router = ResourceRouter::new(
            ProjectPath::new(tmp.path().join("working")),
            ProjectPath::new(tmp.path().join("cooked")),
        );

        let entry = archives[0].pak().entries()[0].clone();
        let err = router
            .cooked_path(&archives[0], &entry)
            .unwrap_err();
        assert!(matches!(err, PakError::RouterNotBuilt));
        assert!(err.is_fatal());

        router.build(&mut archives, &mut |_| {}).unwrap();
        let err = router
            .cooked_path(&archives[0], &entry)
            .unwrap_err();
        assert!(matches!(err, PakError::ArchiveNotEntered));

        router.enter_archive(&archives[0]).unwrap();
        assert!(router.cooked_path(&archives[0], &entry).is_ok());
    }

    #[test]
    fn unknown_id_is_a_data_integrity_error() {
        let mut archives = vec![archive("a.pak", &[0x01])];
        let (mut router, _tmp) = built_router(&mut archives);
        router.enter_archive(&archives[0]).unwrap();

        let mut ghost = archives[0].pak().entries()[0].clone();
        ghost.id = UniqueId64::new(0xFFFF);
        let err = router.cooked_path(&archives[0], &ghost).unwrap_err();
        assert!(matches!(err, PakError::EntryNotFound(_)));
        assert!(err.is_fatal());
        assert!(err.to_string().contains("000000000000FFFF"));
    }

    #[test]
    fn cooked_path_is_deterministic() {
        let mut archives = vec![archive("a.pak", &[0x01])];
        let (mut router, _tmp) = built_router(&mut archives);
        router.enter_archive(&archives[0]).unwrap();

        let entry = archives[0].pak().entries()[0].clone();
        let first = router.cooked_path(&archives[0], &entry).unwrap();
        let second = router.cooked_path(&archives[0], &entry).unwrap();
        assert_eq!(first, second);
    }
}
