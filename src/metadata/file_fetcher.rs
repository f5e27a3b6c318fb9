//! Fetcher that reads the metadata payload from a local file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::{MetadataError, MetadataResult};
use super::provider::MetadataFetcher;

/// Reads the payload from disk.
///
/// Mostly useful for offline inspection and tests, where a service's
/// metadata was captured to a file ahead of time.
#[derive(Debug, Clone)]
pub struct FileMetadataFetcher {
    path: PathBuf,
}

impl FileMetadataFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MetadataFetcher for FileMetadataFetcher {
    async fn fetch_metadata(&self, cancel: &CancellationToken) -> MetadataResult<String> {
        debug!(path = %self.path.display(), "reading metadata file");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(MetadataError::Cancelled),
            result = tokio::fs::read_to_string(&self.path) => {
                result.map_err(|source| MetadataError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }

    fn source_id(&self) -> String {
        format!("file://{}", self.path.display())
    }
}
