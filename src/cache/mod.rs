//! SQLite-backed metadata payload cache.
//!
//! Stores raw metadata payloads so constructing a new client for a service
//! that was seen recently does not refetch its metadata document.
//!
//! # Design
//!
//! - One row per metadata source, keyed by the SHA-256 of its identity
//! - Optional TTL, checked on read against the stored fetch time
//! - Versioned - auto-clears on version mismatch
//!
//! # Key Format
//!
//! ```text
//! payload:{sha256(source_id)} -> raw metadata payload
//! ```

mod hash;
pub use hash::hash_source;

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension};

/// Current cache schema version. Bump this when the cache format changes.
const CACHE_VERSION: i32 = 1;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to determine cache directory")]
    NoCacheDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// A cached payload with its fetch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPayload {
    pub payload: String,
    /// Seconds since the Unix epoch.
    pub fetched_at: i64,
}

impl CachedPayload {
    /// Whether the entry is older than `ttl` at time `now` (epoch seconds).
    pub fn is_expired(&self, ttl: Option<Duration>, now: i64) -> bool {
        match ttl {
            Some(ttl) => now.saturating_sub(self.fetched_at) > ttl.as_secs() as i64,
            None => false,
        }
    }
}

/// SQLite-based metadata payload cache.
pub struct MetadataCache {
    conn: Connection,
}

impl MetadataCache {
    /// Open or create the cache database at the default location.
    ///
    /// The cache is stored at `{cache_dir}/odata-schema/metadata.db`.
    pub fn open() -> CacheResult<Self> {
        Self::open_at(Self::default_path()?)
    }

    /// Open or create the cache database at `path`.
    ///
    /// If the cache version doesn't match, it's automatically cleared.
    pub fn open_at(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.init()?;

        Ok(cache)
    }

    /// Open an in-memory cache (for testing).
    pub fn open_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.init()?;
        Ok(cache)
    }

    /// Get the default path of the cache database.
    pub fn default_path() -> CacheResult<PathBuf> {
        let base = dirs::cache_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(base.join("odata-schema").join("metadata.db"))
    }

    fn init(&self) -> CacheResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS payloads (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                fetched_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored_version: Option<i32> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                let s: String = row.get(0)?;
                Ok(s.parse().unwrap_or(0))
            })
            .optional()?;

        match stored_version {
            Some(v) if v == CACHE_VERSION => {}
            Some(_) => {
                self.clear_all()?;
                self.set_version()?;
            }
            None => {
                self.set_version()?;
            }
        }

        Ok(())
    }

    fn set_version(&self) -> CacheResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?)",
            params![CACHE_VERSION.to_string()],
        )?;
        Ok(())
    }

    /// Get the cached payload for a metadata source.
    pub fn get(&self, source_id: &str) -> CacheResult<Option<CachedPayload>> {
        let entry = self
            .conn
            .query_row(
                "SELECT payload, fetched_at FROM payloads WHERE key = ?",
                params![CacheKey::payload(source_id)],
                |row| {
                    Ok(CachedPayload {
                        payload: row.get(0)?,
                        fetched_at: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// Get the cached payload if it is younger than `ttl`.
    pub fn get_fresh(
        &self,
        source_id: &str,
        ttl: Option<Duration>,
    ) -> CacheResult<Option<CachedPayload>> {
        Ok(self
            .get(source_id)?
            .filter(|entry| !entry.is_expired(ttl, unix_now())))
    }

    /// Store a payload, stamped with the current time.
    pub fn put(&self, source_id: &str, payload: &str) -> CacheResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO payloads (key, payload, fetched_at) VALUES (?, ?, ?)",
            params![CacheKey::payload(source_id), payload, unix_now()],
        )?;
        Ok(())
    }

    /// Delete the payload of a metadata source.
    pub fn delete(&self, source_id: &str) -> CacheResult<bool> {
        let rows = self.conn.execute(
            "DELETE FROM payloads WHERE key = ?",
            params![CacheKey::payload(source_id)],
        )?;
        Ok(rows > 0)
    }

    /// Clear all cached payloads (but keep metadata).
    pub fn clear_all(&self) -> CacheResult<()> {
        self.conn.execute("DELETE FROM payloads", [])?;
        Ok(())
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheResult<CacheStats> {
        let entry_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM payloads", [], |row| row.get(0))?;

        let total_size: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(payload)), 0) FROM payloads",
            [],
            |row| row.get(0),
        )?;

        Ok(CacheStats {
            entry_count: entry_count as usize,
            total_size_bytes: total_size as usize,
        })
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached payloads.
    pub entry_count: usize,
    /// Total size of all payloads in bytes.
    pub total_size_bytes: usize,
}

/// Helper for generating cache keys.
pub struct CacheKey;

impl CacheKey {
    /// Key for the raw payload of a metadata source.
    pub fn payload(source_id: &str) -> String {
        format!("payload:{}", hash_source(source_id))
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
