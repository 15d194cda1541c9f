mod builder;
mod format;

pub use builder::PakBuilder;
pub use format::{Compression, Pak, PakEntry, PAK_VERSION};
