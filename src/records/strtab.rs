//! String table records (`STRG`)
//!
//! Per-language string lists used for level and area display names. Names
//! pulled from these tables are known to carry trailing whitespace in shipped
//! data; consumers trim before use.

use crate::error::{PakError, Result};
use crate::id::FourCc;
use crate::paths::ProjectPath;
use crate::record::BinaryRecord;
use crate::stream::{write_string, write_u32, EntryReadStream};
use serde::{Deserialize, Serialize};
use std::fs::File;

pub const STRG_MAGIC: u32 = 0x53545247;
pub const STRG_VERSION: u32 = 1;

pub const ENGL: FourCc = FourCc::new(b"ENGL");
pub const FREN: FourCc = FourCc::new(b"FREN");
pub const GERM: FourCc = FourCc::new(b"GERM");
pub const JAPN: FourCc = FourCc::new(b"JAPN");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageTable {
    pub lang: FourCc,
    pub strings: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StringTable {
    pub languages: Vec<LanguageTable>,
}

impl StringTable {
    pub fn get(&self, lang: FourCc, idx: usize) -> Option<&str> {
        self.languages
            .iter()
            .find(|table| table.lang == lang)
            .and_then(|table| table.strings.get(idx))
            .map(String::as_str)
    }
}

impl BinaryRecord for StringTable {
    fn read_from(stream: &mut EntryReadStream) -> Result<Self> {
        let magic = stream.read_u32()?;
        if magic != STRG_MAGIC {
            return Err(PakError::InvalidFormat(format!(
                "bad STRG magic {:08x}",
                magic
            )));
        }
        let version = stream.read_u32()?;
        if version != STRG_VERSION {
            return Err(PakError::UnsupportedVersion(version));
        }

        let lang_count = stream.read_u32()?;
        let string_count = stream.read_u32()?;

        let mut tags = Vec::with_capacity(lang_count as usize);
        for _ in 0..lang_count {
            tags.push(FourCc::read_from(stream)?);
        }

        let mut languages = Vec::with_capacity(lang_count as usize);
        for lang in tags {
            let mut strings = Vec::with_capacity(string_count as usize);
            for _ in 0..string_count {
                strings.push(stream.read_string()?);
            }
            languages.push(LanguageTable { lang, strings });
        }
        Ok(Self { languages })
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        let string_count = self
            .languages
            .first()
            .map(|t| t.strings.len())
            .unwrap_or(0);
        write_u32(out, STRG_MAGIC);
        write_u32(out, STRG_VERSION);
        write_u32(out, self.languages.len() as u32);
        write_u32(out, string_count as u32);
        for table in &self.languages {
            table.lang.write_to(out);
        }
        for table in &self.languages {
            for s in &table.strings {
                write_string(out, s);
            }
        }
        Ok(())
    }
}

/// Working-tree extraction: decoded table as JSON.
pub fn extract(mut stream: EntryReadStream, dest: &ProjectPath) -> Result<()> {
    let table = StringTable::read_from(&mut stream)?;
    let file = File::create(dest.as_path())?;
    serde_json::to_writer_pretty(file, &table)?;
    Ok(())
}
