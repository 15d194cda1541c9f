//! Per-type extraction dispatch
//!
//! Every resource type maps to an extractor descriptor: an optional working
//! function (plain or router-aware), a file extension, and a weight tier.
//! Extraction runs ascending weight passes over the whole entry table so
//! dependent types (characters, levels, areas) always process after the types
//! they reference. Re-scanning all entries per pass is O(passes × entries),
//! which is cheap next to the I/O and keeps the ordering trivially auditable.

use crate::error::{PakError, Result};
use crate::id::{FourCc, UniqueId64};
use crate::pak::PakEntry;
use crate::paths::{PathKind, ProjectPath};
use crate::records;
use crate::router::{PakArchive, ResourceRouter};
use crate::stream::EntryReadStream;
use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Extraction function with no cross-entry dependencies
pub type BytesExtractFn = fn(EntryReadStream, &ProjectPath) -> Result<()>;

/// Extraction function that resolves other entries' paths through the router
pub type RoutedExtractFn = fn(EntryReadStream, &ProjectPath, &RouteCtx) -> Result<()>;

/// Per-type extractor descriptor; at most one function field is populated
#[derive(Clone, Copy, Default)]
pub struct ResExtractor {
    pub bytes_fn: Option<BytesExtractFn>,
    pub routed_fn: Option<RoutedExtractFn>,
    pub file_ext: &'static str,
    pub weight: u32,
}

impl ResExtractor {
    pub fn bytes(f: BytesExtractFn, file_ext: &'static str, weight: u32) -> Self {
        Self {
            bytes_fn: Some(f),
            routed_fn: None,
            file_ext,
            weight,
        }
    }

    pub fn routed(f: RoutedExtractFn, file_ext: &'static str, weight: u32) -> Self {
        Self {
            bytes_fn: None,
            routed_fn: Some(f),
            file_ext,
            weight,
        }
    }

    /// Cooked byte copy only; no working-tree output.
    pub fn passthrough() -> Self {
        Self::default()
    }

    pub fn has_fn(&self) -> bool {
        self.bytes_fn.is_some() || self.routed_fn.is_some()
    }
}

/// Type-tag dispatch table, explicitly owned rather than process-global so
/// each router/test gets its own instance
#[derive(Default)]
pub struct ExtractorRegistry {
    table: HashMap<FourCc, ResExtractor>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in type set. Weights order the passes: flat formats first, then
    /// models, then characters referencing models, then the level/area
    /// manifests referencing everything else.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            FourCc::new(b"STRG"),
            ResExtractor::bytes(records::strtab::extract, ".json", 0),
        );
        registry.register(
            FourCc::new(b"MAPW"),
            ResExtractor::bytes(records::worldmap::extract, ".json", 0),
        );
        registry.register(FourCc::new(b"TXTR"), ResExtractor::passthrough());
        registry.register(
            FourCc::new(b"CMDL"),
            ResExtractor::bytes(records::model::extract, ".json", 1),
        );
        registry.register(
            FourCc::new(b"CHAR"),
            ResExtractor::routed(records::character::extract, ".json", 2),
        );
        registry.register(
            FourCc::new(b"MLVL"),
            ResExtractor::routed(records::level::extract, ".json", 3),
        );
        registry.register(
            FourCc::new(b"AREA"),
            ResExtractor::routed(records::area::extract, ".json", 4),
        );
        registry
    }

    pub fn register(&mut self, kind: FourCc, extractor: ResExtractor) {
        self.table.insert(kind, extractor);
    }

    /// Descriptor for a type tag; unknown types get the no-op passthrough.
    pub fn get(&self, kind: FourCc) -> ResExtractor {
        self.table.get(&kind).copied().unwrap_or_default()
    }

    pub fn max_weight(&self) -> u32 {
        self.table.values().map(|e| e.weight).max().unwrap_or(0)
    }
}

/// Context handed to routed extractors for dependency-aware path resolution
pub struct RouteCtx<'a> {
    pub router: &'a ResourceRouter,
    pub archive: &'a PakArchive,
    pub registry: &'a ExtractorRegistry,
}

impl RouteCtx<'_> {
    /// Working path of another entry, using its own registered extractor.
    pub fn working_path(&self, entry: &PakEntry) -> Result<ProjectPath> {
        let extractor = self.registry.get(entry.kind);
        self.router.working_path(self.archive, entry, &extractor)
    }

    pub fn cooked_path(&self, entry: &PakEntry) -> Result<ProjectPath> {
        self.router.cooked_path(self.archive, entry)
    }
}

/// Extraction controls
#[derive(Default)]
pub struct ExtractOptions<'a> {
    /// Overwrite outputs that already exist
    pub force: bool,
    /// Cooperative cancellation, checked once per entry
    pub cancel: Option<&'a AtomicBool>,
}

/// One entry whose working-function failed
#[derive(Debug)]
pub struct ExtractFailure {
    pub id: UniqueId64,
    pub kind: FourCc,
    pub error: PakError,
}

/// Outcome of one archive's extraction pass
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Entries processed, in completion order
    pub extracted: Vec<(FourCc, UniqueId64)>,
    /// Non-fatal per-entry failures, surfaced instead of swallowed
    pub failures: Vec<ExtractFailure>,
    /// Set when the cancel flag stopped the pass early
    pub interrupted: bool,
}

/// Extract every entry of one archive in ascending weight order.
///
/// The cooked tree always receives a byte-exact copy of the decompressed
/// payload (skipped when present unless `force`). The working tree receives
/// the extractor's converted output. Fatal errors abort the pass; per-entry
/// failures are collected in the report and the batch continues, so an
/// interrupted or partially-failed run can simply be re-run.
pub fn extract_archive(
    router: &mut ResourceRouter,
    archive: &PakArchive,
    registry: &ExtractorRegistry,
    options: &ExtractOptions,
    progress: &mut dyn FnMut(f32),
) -> Result<ExtractReport> {
    router.enter_archive(archive)?;

    let total = archive.pak().entry_count().max(1) as f32;
    let mut report = ExtractReport::default();
    let mut count = 0usize;

    'passes: for weight in 0..=registry.max_weight() {
        for entry in archive.pak().entries() {
            let extractor = registry.get(entry.kind);
            if extractor.weight != weight {
                continue;
            }
            if let Some(cancel) = options.cancel {
                if cancel.load(Ordering::Relaxed) {
                    report.interrupted = true;
                    break 'passes;
                }
            }

            // Cooked output: verbatim payload, open/write/close per entry
            let cooked = router.cooked_path(archive, entry)?;
            if options.force || cooked.kind() == PathKind::None {
                match archive.open_entry(entry) {
                    Ok(stream) => {
                        if let Err(error) = fs::write(cooked.as_path(), stream.data()) {
                            report.failures.push(ExtractFailure {
                                id: entry.id,
                                kind: entry.kind,
                                error: error.into(),
                            });
                        }
                    }
                    Err(error) if error.is_fatal() => return Err(error),
                    Err(error) => {
                        report.failures.push(ExtractFailure {
                            id: entry.id,
                            kind: entry.kind,
                            error,
                        });
                    }
                }
            }

            // Working output: converted representation via the extractor
            let working = router.working_path(archive, entry, &extractor)?;
            if extractor.has_fn() && (options.force || working.kind() == PathKind::None) {
                let result = archive.open_entry(entry).and_then(|stream| {
                    if let Some(f) = extractor.bytes_fn {
                        f(stream, &working)
                    } else if let Some(f) = extractor.routed_fn {
                        let ctx = RouteCtx {
                            router,
                            archive,
                            registry,
                        };
                        f(stream, &working, &ctx)
                    } else {
                        Ok(())
                    }
                });
                match result {
                    Ok(()) => {}
                    Err(error) if error.is_fatal() => return Err(error),
                    Err(error) => {
                        report.failures.push(ExtractFailure {
                            id: entry.id,
                            kind: entry.kind,
                            error,
                        });
                    }
                }
            }

            report.extracted.push((entry.kind, entry.id));
            count += 1;
            progress(count as f32 / total);
        }
    }

    debug!(
        archive = %archive.name(),
        extracted = report.extracted.len(),
        failures = report.failures.len(),
        "extraction pass complete"
    );
    Ok(report)
}
