//! Typed chunk formats carried inside PAK entries
//!
//! Each format implements [`crate::record::BinaryRecord`] for its big-endian
//! layout and exposes an `extract` function that writes the working-tree
//! representation. Layouts are magic+version headed so corrupt or misrouted
//! payloads fail early.

pub mod area;
pub mod character;
pub mod level;
pub mod model;
pub mod strtab;
pub mod worldmap;

pub use area::AreaPayload;
pub use character::CharacterDescriptor;
pub use level::LevelManifest;
pub use model::Model;
pub use strtab::StringTable;
pub use worldmap::WorldMap;
