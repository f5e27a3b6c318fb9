//! Fetcher decorator backed by the persistent payload cache.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::{MetadataError, MetadataResult};
use super::provider::{MetadataFetcher, MetadataParser};
use crate::cache::{CacheError, CacheResult, MetadataCache};

/// Serves payloads from a [`MetadataCache`] and falls back to the wrapped
/// fetcher on a miss or an expired entry.
///
/// Only payloads that `parser` accepts are written to the cache, and a
/// cached payload it rejects is evicted and refetched. A malformed document
/// therefore never outlives the fetch that produced it.
///
/// Cache failures never fail a fetch: a broken cache degrades to a direct
/// fetch and a warning. SQLite work runs on the blocking pool.
pub struct CachingFetcher<F, P> {
    inner: F,
    parser: P,
    cache: Arc<Mutex<MetadataCache>>,
    ttl: Option<Duration>,
}

impl<F: MetadataFetcher, P: MetadataParser> CachingFetcher<F, P> {
    /// Wrap `inner`. A `ttl` of `None` keeps entries until cleared.
    pub fn new(inner: F, parser: P, cache: MetadataCache, ttl: Option<Duration>) -> Self {
        Self {
            inner,
            parser,
            cache: Arc::new(Mutex::new(cache)),
            ttl,
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Run `op` against the cache on the blocking pool.
    async fn with_cache<T, Op>(&self, op: Op) -> MetadataResult<T>
    where
        T: Send + 'static,
        Op: FnOnce(&MetadataCache) -> CacheResult<T> + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        let joined = tokio::task::spawn_blocking(move || {
            let cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
            op(&cache)
        })
        .await;

        match joined {
            Ok(result) => Ok(result?),
            Err(e) => Err(MetadataError::Cache(CacheError::Io(io::Error::other(e)))),
        }
    }

    async fn lookup(&self, source_id: &str) -> Option<String> {
        let key = source_id.to_string();
        let ttl = self.ttl;
        let payload = match self.with_cache(move |c| c.get_fresh(&key, ttl)).await {
            Ok(entry) => entry?.payload,
            Err(e) => {
                warn!(error = %e, "metadata cache read failed");
                return None;
            }
        };

        if let Err(e) = self.parser.parse_metadata(&payload) {
            warn!(source = %source_id, error = %e, "evicting unparseable cached metadata");
            self.evict(source_id).await;
            return None;
        }
        Some(payload)
    }

    async fn store(&self, source_id: &str, payload: &str) {
        if let Err(e) = self.parser.parse_metadata(payload) {
            debug!(source = %source_id, error = %e, "not caching unparseable metadata");
            return;
        }

        let key = source_id.to_string();
        let payload = payload.to_string();
        if let Err(e) = self.with_cache(move |c| c.put(&key, &payload)).await {
            warn!(error = %e, "metadata cache write failed");
        }
    }

    async fn evict(&self, source_id: &str) {
        let key = source_id.to_string();
        if let Err(e) = self.with_cache(move |c| c.delete(&key)).await {
            warn!(error = %e, "metadata cache delete failed");
        }
    }
}

#[async_trait]
impl<F: MetadataFetcher, P: MetadataParser> MetadataFetcher for CachingFetcher<F, P> {
    async fn fetch_metadata(&self, cancel: &CancellationToken) -> MetadataResult<String> {
        let source_id = self.inner.source_id();

        if let Some(payload) = self.lookup(&source_id).await {
            debug!(source = %source_id, "metadata served from cache");
            return Ok(payload);
        }

        let payload = self.inner.fetch_metadata(cancel).await?;
        self.store(&source_id, &payload).await;
        Ok(payload)
    }

    fn source_id(&self) -> String {
        self.inner.source_id()
    }
}
