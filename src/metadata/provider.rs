//! Collaborator traits for obtaining and decoding metadata.
//!
//! The schema core never talks to the network or understands the document
//! grammar itself. A [`MetadataFetcher`] produces the raw payload and a
//! [`MetadataParser`] turns it into flat [`MetadataRecords`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::MetadataResult;
use super::types::MetadataRecords;

/// Fetches the raw metadata payload of a service.
///
/// Implementations should return [`MetadataError::Cancelled`] promptly once
/// `cancel` fires. Timeouts are the implementation's own policy.
///
/// [`MetadataError::Cancelled`]: super::MetadataError::Cancelled
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch_metadata(&self, cancel: &CancellationToken) -> MetadataResult<String>;

    /// Stable identity of the metadata source (URL, file path, ...).
    ///
    /// Used for cache keys and diagnostics.
    fn source_id(&self) -> String;
}

/// Decodes a raw payload into flat records.
pub trait MetadataParser: Send + Sync {
    fn parse_metadata(&self, payload: &str) -> MetadataResult<MetadataRecords>;
}

#[async_trait]
impl<T: MetadataFetcher + ?Sized> MetadataFetcher for Arc<T> {
    async fn fetch_metadata(&self, cancel: &CancellationToken) -> MetadataResult<String> {
        (**self).fetch_metadata(cancel).await
    }

    fn source_id(&self) -> String {
        (**self).source_id()
    }
}

impl<T: MetadataParser + ?Sized> MetadataParser for Arc<T> {
    fn parse_metadata(&self, payload: &str) -> MetadataResult<MetadataRecords> {
        (**self).parse_metadata(payload)
    }
}
