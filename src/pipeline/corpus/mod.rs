pub mod builder;
pub mod fallback;
pub mod store;
pub mod types;

pub use builder::*;
pub use store::*;
pub use types::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Pattern corpus not found at {0}")]
    NotFound(PathBuf),

    #[error("Malformed pattern corpus: {0}")]
    Malformed(String),

    #[error("Unsupported corpus format version {0}")]
    UnsupportedVersion(u32),

    #[error("Corpus checksum mismatch (expected {expected}, found {actual})")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Pattern corpus contains no patterns")]
    Empty,

    #[error("Invalid sample {path}: {reason}")]
    InvalidSample { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
