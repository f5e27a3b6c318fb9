#[path = "../common/trippin.rs"]
mod trippin;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use odata_schema::cache::MetadataCache;
    use odata_schema::metadata::{
        CachingFetcher, FileMetadataFetcher, JsonRecordParser, MetadataError, MetadataFetcher,
        MetadataParser,
    };
    use odata_schema::schema::{Schema, SchemaError, SchemaState};
    use tokio_util::sync::CancellationToken;

    use super::trippin::{trippin_json, trippin_records, StaticFetcher};

    #[tokio::test]
    async fn test_file_fetcher_reads_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trippin.json");
        std::fs::write(&path, trippin_json()).unwrap();

        let fetcher = FileMetadataFetcher::new(&path);
        let payload = fetcher.fetch_metadata(&CancellationToken::new()).await.unwrap();

        let records = JsonRecordParser::new().parse_metadata(&payload).unwrap();
        assert_eq!(records, trippin_records());
        assert!(fetcher.source_id().starts_with("file://"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FileMetadataFetcher::new(dir.path().join("missing.json"));

        let err = fetcher
            .fetch_metadata(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MetadataError::Io { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trippin.json");
        std::fs::write(&path, trippin_json()).unwrap();

        let token = CancellationToken::new();
        token.cancel();

        let err = FileMetadataFetcher::new(&path)
            .fetch_metadata(&token)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_schema_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trippin.json");
        std::fs::write(&path, trippin_json()).unwrap();

        let schema = Schema::new(FileMetadataFetcher::new(&path), JsonRecordParser::new());
        schema.resolve(&CancellationToken::new()).await.unwrap();

        assert_eq!(schema.state(), SchemaState::Resolved);
        assert!(schema.has_table("People").unwrap());
    }

    #[tokio::test]
    async fn test_schema_over_missing_file_is_fetch_failure() {
        let schema = Schema::new(
            FileMetadataFetcher::new("/definitely/not/here.json"),
            JsonRecordParser::new(),
        );

        let err = schema.resolve(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, SchemaError::FetchFailed(_)));
        assert_eq!(schema.state(), SchemaState::Failed);
    }

    #[tokio::test]
    async fn test_caching_fetcher_serves_second_fetch_from_cache() {
        let cache = MetadataCache::open_in_memory().unwrap();
        let fetcher =
            CachingFetcher::new(StaticFetcher::trippin(), JsonRecordParser::new(), cache, None);
        let token = CancellationToken::new();

        let first = fetcher.fetch_metadata(&token).await.unwrap();
        let second = fetcher.fetch_metadata(&token).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.inner().calls(), 1);
        assert_eq!(fetcher.source_id(), "memory://trippin");
    }

    #[tokio::test]
    async fn test_cached_payload_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cache").join("metadata.db");
        let token = CancellationToken::new();

        let warm = CachingFetcher::new(
            StaticFetcher::trippin(),
            JsonRecordParser::new(),
            MetadataCache::open_at(&db).unwrap(),
            Some(Duration::from_secs(3600)),
        );
        warm.fetch_metadata(&token).await.unwrap();
        assert_eq!(warm.inner().calls(), 1);
        drop(warm);

        let cold = CachingFetcher::new(
            StaticFetcher::trippin(),
            JsonRecordParser::new(),
            MetadataCache::open_at(&db).unwrap(),
            Some(Duration::from_secs(3600)),
        );
        let payload = cold.fetch_metadata(&token).await.unwrap();
        assert_eq!(payload, trippin_json());
        assert_eq!(cold.inner().calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = MetadataCache::open_in_memory().unwrap();
        let fetcher = CachingFetcher::new(
            StaticFetcher::trippin().fail_first(),
            JsonRecordParser::new(),
            cache,
            None,
        );
        let token = CancellationToken::new();

        assert!(fetcher.fetch_metadata(&token).await.is_err());
        assert!(fetcher.fetch_metadata(&token).await.is_ok());
        assert!(fetcher.fetch_metadata(&token).await.is_ok());
        assert_eq!(fetcher.inner().calls(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_payload_is_not_cached() {
        let cache = MetadataCache::open_in_memory().unwrap();
        let fetcher = CachingFetcher::new(
            StaticFetcher::trippin().truncate_first(),
            JsonRecordParser::new(),
            cache,
            None,
        );
        let schema = Schema::new(fetcher, JsonRecordParser::new());
        let token = CancellationToken::new();

        let err = schema.resolve(&token).await.unwrap_err();
        assert!(matches!(err, SchemaError::ParseFailed(_)));
        assert!(err.is_retriable());

        schema.resolve(&token).await.unwrap();
        schema.resolve(&token).await.unwrap();
        assert_eq!(schema.state(), SchemaState::Resolved);
        assert_eq!(schema.fetcher().inner().calls(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_cached_payload_is_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("metadata.db");
        MetadataCache::open_at(&db)
            .unwrap()
            .put("memory://trippin", "{ truncated")
            .unwrap();

        let fetcher = CachingFetcher::new(
            StaticFetcher::trippin(),
            JsonRecordParser::new(),
            MetadataCache::open_at(&db).unwrap(),
            None,
        );
        let payload = fetcher.fetch_metadata(&CancellationToken::new()).await.unwrap();
        assert_eq!(payload, trippin_json());
        assert_eq!(fetcher.inner().calls(), 1);
        drop(fetcher);

        let stored = MetadataCache::open_at(&db)
            .unwrap()
            .get("memory://trippin")
            .unwrap()
            .unwrap();
        assert_eq!(stored.payload, trippin_json());
    }
}
