//! Pakroute: resource-archive routing and extraction for game PAK files
//!
//! This library implements the full pipeline from raw PAK archives to a
//! browsable project tree:
//! - Big-endian directory parsing with LZ4 entry compression and CRC checks
//! - Cross-archive id partitioning into unique and shared resources
//! - Dependency-driven placement (level / area / layer directory depth)
//! - Weighted multi-pass extraction into cooked and working output trees
//!
//! # Example
//!
//! ```no_run
//! use pakroute::{
//!     extract_archive, ExtractOptions, ExtractorRegistry, FileSource, PakArchive,
//!     ProjectPath, ResourceRouter,
//! };
//!
//! let source = FileSource::open("Worlds.pak")?;
//! let mut archives = vec![PakArchive::open("Worlds.pak", Box::new(source))?];
//!
//! let mut router = ResourceRouter::new(
//!     ProjectPath::new("out/working"),
//!     ProjectPath::new("out/cooked"),
//! );
//! router.build(&mut archives, &mut |_| {})?;
//!
//! let registry = ExtractorRegistry::with_defaults();
//! let report = extract_archive(
//!     &mut router,
//!     &archives[0],
//!     &registry,
//!     &ExtractOptions::default(),
//!     &mut |_| {},
//! )?;
//! println!("extracted {} entries", report.extracted.len());
//! # Ok::<(), pakroute::PakError>(())
//! ```

// Core modules
pub mod deps;
pub mod error;
pub mod extract;
pub mod id;
pub mod pak;
pub mod paths;
pub mod record;
pub mod records;
pub mod router;
pub mod source;
pub mod stream;

// Re-export commonly used types
pub use error::{PakError, Result};
pub use extract::{
    extract_archive, ExtractFailure, ExtractOptions, ExtractReport, ExtractorRegistry,
    ResExtractor, RouteCtx,
};
pub use id::{FourCc, UniqueId128, UniqueId32, UniqueId64};
pub use pak::{Compression, Pak, PakBuilder, PakEntry, PAK_VERSION};
pub use paths::{PathKind, ProjectPath};
pub use record::{BinaryRecord, TextRecord};
pub use router::{PakArchive, ResourceRouter, Uniqueness};
pub use source::{EntrySource, FileSource, MemorySource};
pub use stream::{EntryReadStream, Whence};
