//! # Design
//!
//! - Codec failures name the pipeline step that rejected the token.
//! - Transport and file failures carry the operation and keep the IO source.
//! - No variant implies a partial write: the store is only touched after every step passes.

use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::PathBuf;

use starnight_store::StoreError;
use thiserror::Error;

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// Import pipeline stage that failed to decode a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStep {
    /// Base64 decoding, inflation, or UTF-8 conversion.
    Decompress,
    /// JSON parsing of the inflated text.
    Parse,
}

impl Display for DecodeStep {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Decompress => "decompress",
            Self::Parse => "parse",
        })
    }
}

/// Errors produced by export, import, and snapshot persistence.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Token does not start with the export prefix.
    #[error("token is not an export token")]
    BadFormat,
    /// Token payload could not be decoded.
    #[error("token payload failed to {step}")]
    DecodeFailure {
        /// Stage that rejected the payload.
        step: DecodeStep,
        /// Decoder diagnostic.
        detail: String,
    },
    /// Decoded data does not fit the store layout.
    #[error("token data does not match the store layout")]
    ShapeMismatch(#[source] StoreError),
    /// Snapshot could not be serialized or compressed.
    #[error("export encoding failure")]
    Encode {
        /// Encoder diagnostic.
        detail: String,
    },
    /// Reading or writing the token carrier failed.
    #[error("token transport failure")]
    Transport {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Reading or writing a snapshot file failed.
    #[error("snapshot file failure")]
    SnapshotFile {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// File involved in the failure.
        path: PathBuf,
        /// Underlying error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
