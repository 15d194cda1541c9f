//! Fixed-width resource identifiers and four-character type tags
//!
//! Every resource in a PAK is keyed by an opaque fixed-width id read and written
//! big-endian. Equality and hashing operate on the whole bit pattern; the
//! 128-bit variant compares as a single `u128`, never per half, so equality and
//! hashing can never disagree.

use crate::error::Result;
use crate::stream::EntryReadStream;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Four-character resource type tag (e.g. `MLVL`, `STRG`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const fn new(tag: &[u8; 4]) -> Self {
        Self(*tag)
    }

    pub fn read_from(stream: &mut EntryReadStream) -> Result<Self> {
        Ok(Self(stream.read_array::<4>()?))
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            let ch = if b.is_ascii_graphic() { b as char } else { '?' };
            write!(f, "{}", ch)?;
        }
        Ok(())
    }
}

impl Serialize for FourCc {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FourCc {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = s.as_bytes();
        if bytes.len() != 4 {
            return Err(de::Error::custom("fourcc must be exactly 4 bytes"));
        }
        Ok(FourCc([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

macro_rules! unique_id {
    ($name:ident, $prim:ty, $bytes:expr, $hex_width:expr) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name($prim);

        impl $name {
            pub const fn new(value: $prim) -> Self {
                Self(value)
            }

            /// Consumes the id's exact width big-endian from the stream.
            pub fn read_from(stream: &mut EntryReadStream) -> Result<Self> {
                Ok(Self(<$prim>::from_be_bytes(
                    stream.read_array::<{ $bytes }>()?,
                )))
            }

            /// Emits the id's exact width big-endian.
            pub fn write_to(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.0.to_be_bytes());
            }

            pub fn value(&self) -> $prim {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:0width$X}", self.0, width = $hex_width)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                <$prim>::from_str_radix(s, 16).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                struct HexVisitor;
                impl<'de> Visitor<'de> for HexVisitor {
                    type Value = $name;
                    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        write!(f, "a {}-digit hex string", $hex_width)
                    }
                    fn visit_str<E: de::Error>(
                        self,
                        v: &str,
                    ) -> std::result::Result<Self::Value, E> {
                        v.parse().map_err(de::Error::custom)
                    }
                }
                deserializer.deserialize_str(HexVisitor)
            }
        }
    };
}

unique_id!(UniqueId32, u32, 4, 8);
unique_id!(UniqueId64, u64, 8, 16);
unique_id!(UniqueId128, u128, 16, 32);
