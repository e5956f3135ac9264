//! Error type shared by run generation, merge and query.
//!
//! Every I/O failure is fatal to the operation that hit it. Variants carry the
//! file and offset involved so the calling layer can report where a stage
//! failed. Library code returns [`SortError`]; the binaries wrap it with
//! `anyhow` context naming the stage.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SortError>;

#[derive(Debug, Error)]
pub enum SortError {
    /// Input, run or output file could not be opened or created.
    #[error("cannot open '{}': {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Fewer elements were available than required.
    #[error(
        "short read from '{}' at byte offset {offset}: expected {expected} elements, got {actual}",
        path.display()
    )]
    Read {
        path: PathBuf,
        offset: u64,
        expected: usize,
        actual: usize,
        #[source]
        source: Option<io::Error>,
    },

    #[error("cannot seek '{}' to byte offset {offset}: {source}", path.display())]
    Seek {
        path: PathBuf,
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// Fewer bytes were written than requested.
    #[error("write of {len} bytes to '{}' at byte offset {offset} failed: {source}", path.display())]
    Write {
        path: PathBuf,
        offset: u64,
        len: usize,
        #[source]
        source: io::Error,
    },

    #[error("cannot allocate a buffer of {elements} elements")]
    Allocation { elements: usize },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("'{}' holds no elements", path.display())]
    EmptyFile { path: PathBuf },
}

impl SortError {
    pub(crate) fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SortError::FileOpen {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SortError::Configuration(msg.into())
    }
}
