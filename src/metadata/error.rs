//! Errors raised by metadata collaborators (fetchers and parsers).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cache::CacheError;

/// Result type for metadata collaborator operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

#[derive(Error, Debug)]
pub enum MetadataError {
    /// Reading a local metadata file failed.
    #[error("failed to read metadata from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The payload is not a valid record document.
    #[error("failed to decode metadata records: {0}")]
    Decode(#[from] serde_json::Error),

    /// The payload cache could not be read or written.
    #[error("metadata cache error: {0}")]
    Cache(#[from] CacheError),

    /// The remote source reported an error.
    #[error("metadata source error: {0}")]
    Source(String),

    /// The fetch observed its cancellation signal.
    #[error("metadata fetch cancelled")]
    Cancelled,
}

impl MetadataError {
    pub fn source_error(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
