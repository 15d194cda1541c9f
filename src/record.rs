//! Generic contract for fixed- and variable-layout binary records
//!
//! Every typed chunk format in [`crate::records`] implements [`BinaryRecord`]:
//! reads consume an exact big-endian layout from an [`EntryReadStream`], writes
//! emit the identical layout, and `write(read(bytes)) == bytes` for well-formed
//! input. The optional textual round-trip rides on serde/JSON.

use crate::error::Result;
use crate::stream::EntryReadStream;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Binary codec contract for archive record types
pub trait BinaryRecord: Sized {
    /// Read one record from the cursor, consuming exactly its layout.
    fn read_from(stream: &mut EntryReadStream) -> Result<Self>;

    /// Append this record's exact binary layout to `out`.
    fn write_to(&self, out: &mut Vec<u8>) -> Result<()>;

    /// Serialize to a standalone byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }
}

/// Textual round-trip for records that also carry a serde representation
pub trait TextRecord: Serialize + DeserializeOwned {
    fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn from_text(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl<T: Serialize + DeserializeOwned> TextRecord for T {}
