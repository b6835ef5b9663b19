//! Network-level error types.

use thiserror::Error;

use sr_core::CoreError;
use sr_street::{RouterError, StreetError};

/// Reasons a serialized network cannot be read back.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("bad magic bytes {found:?}")]
    BadMagic { found: Vec<u8> },

    #[error("unsupported format version {found} (this build reads {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },

    #[error("input truncated at byte {offset}: {needed} more byte(s) needed")]
    Truncated { offset: usize, needed: usize },

    #[error("checksum mismatch: stored {stored:#018x}, computed {computed:#018x}")]
    ChecksumMismatch { stored: u64, computed: u64 },

    #[error("invalid network data: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Street(#[from] StreetError),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("query parse error: {0}")]
    Parse(String),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
