use std::io;
use thiserror::Error;

/// Result type for pakroute operations
pub type Result<T> = std::result::Result<T, PakError>;

/// Unified error type for all pakroute operations
///
/// Errors fall into two tiers. *Fatal* errors ([`PakError::is_fatal`]) indicate
/// either a caller bug (router queried before build/enter) or archive corruption
/// that cannot be safely guessed around (cursor overrun, a referenced id with no
/// definition). A harness should catch these at the top of an extraction pass and
/// stop; retrying will not help. Everything else is ordinary recoverable data or
/// I/O failure.
#[derive(Debug, Error)]
pub enum PakError {
    // Stream errors
    #[error("PAK stream cursor overrun: position {pos} past length {len}")]
    StreamOverrun { pos: u64, len: u64 },

    #[error("truncated record: needed {needed} bytes, {remaining} remaining")]
    TruncatedRecord { needed: u64, remaining: u64 },

    // Directory / record format errors
    #[error("invalid PAK format: {0}")]
    InvalidFormat(String),

    #[error("unsupported PAK directory version: {0}")]
    UnsupportedVersion(u32),

    #[error("invalid compression method: {0}")]
    InvalidCompression(u32),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("CRC mismatch: expected {expected:08x}, got {actual:08x}")]
    CrcMismatch { expected: u32, actual: u32 },

    // Router errors
    #[error("router not built: ResourceRouter::build() must be called first")]
    RouterNotBuilt,

    #[error("no archive entered: ResourceRouter::enter_archive() must be called before path queries")]
    ArchiveNotEntered,

    #[error("unable to find entry {0}")]
    EntryNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PakError {
    /// Whether this error is unrecoverable by retry: a programming error in the
    /// caller or corruption that must not be guessed around.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PakError::StreamOverrun { .. }
                | PakError::TruncatedRecord { .. }
                | PakError::RouterNotBuilt
                | PakError::ArchiveNotEntered
                | PakError::EntryNotFound(_)
        )
    }
}
