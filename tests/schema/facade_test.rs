#[path = "../common/trippin.rs"]
mod trippin;

use std::sync::Arc;
use std::time::Duration;

use odata_schema::metadata::{EntityTypeRecord, JsonRecordParser, MetadataRecords};
use odata_schema::schema::{Schema, SchemaError, SchemaState};
use tokio_util::sync::CancellationToken;
use trippin::{resolved_trippin, schema_for, trippin_records, trippin_schema, StaticFetcher};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_resolves_fetch_once() {
    let schema = Arc::new(Schema::new(
        StaticFetcher::trippin().with_delay(Duration::from_millis(20)),
        JsonRecordParser::new(),
    ));
    let token = CancellationToken::new();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let schema = Arc::clone(&schema);
            let token = token.clone();
            tokio::spawn(async move { schema.resolve(&token).await })
        })
        .collect();

    let mut resolved = Vec::new();
    for handle in handles {
        resolved.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(schema.fetcher().calls(), 1);
    assert!(resolved.iter().all(|r| Arc::ptr_eq(r, &resolved[0])));
    assert_eq!(schema.state(), SchemaState::Resolved);
}

#[tokio::test]
async fn test_lookups_before_resolve() {
    let schema = trippin_schema();

    assert_eq!(schema.state(), SchemaState::Unresolved);
    assert!(matches!(schema.find_table("People"), Err(SchemaError::NotResolved)));
    assert!(matches!(
        schema.find_base_table("People/Trips"),
        Err(SchemaError::NotResolved)
    ));
    assert!(matches!(schema.tables().err(), Some(SchemaError::NotResolved)));
    assert!(matches!(schema.has_function("ShareTrip"), Err(SchemaError::NotResolved)));
}

#[tokio::test]
async fn test_trippin_paths_through_facade() {
    let schema = resolved_trippin().await;

    let concrete = schema
        .find_concrete_table("People/Trips/PlanItems/Flight")
        .unwrap()
        .unwrap();
    assert_eq!(concrete.name, "Flight");

    let base = schema
        .find_base_table("People/Trips/PlanItems/Flight")
        .unwrap()
        .unwrap();
    assert_eq!(base.name, "PlanItems");

    let err = schema
        .find_concrete_table("People/Trips/PlanItems/Bogus")
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnresolvablePath { ref segment, .. } if segment == "Bogus"));

    assert!(schema.find_concrete_table("Nowhere").unwrap().is_none());
}

#[tokio::test]
async fn test_has_matches_find() {
    let schema = resolved_trippin().await;

    for name in ["People", "Flight", "people", "Bogus", ""] {
        assert_eq!(
            schema.has_table(name).unwrap(),
            schema.find_table(name).unwrap().is_some(),
            "table {name}"
        );
    }
    for name in ["ShareTrip", "GetNearestAirport", "Bogus"] {
        assert_eq!(
            schema.has_function(name).unwrap(),
            schema.find_function(name).unwrap().is_some(),
            "function {name}"
        );
    }
    for (path, column) in [("Flight", "ConfirmationCode"), ("People", "Bogus")] {
        assert_eq!(
            schema.has_column(path, column).unwrap(),
            schema.find_column(path, column).unwrap().is_some(),
            "column {path}.{column}"
        );
    }
    assert!(schema.has_association("People/Trips", "PlanItems").unwrap());
}

#[tokio::test]
async fn test_enumerations() {
    let schema = resolved_trippin().await;

    assert_eq!(schema.tables().unwrap().count(), 8);
    assert_eq!(schema.functions().unwrap().count(), 5);
    assert_eq!(schema.entity_types().unwrap().count(), 9);
    assert_eq!(schema.complex_types().unwrap().count(), 4);
    assert!(schema.find_entity_type("Flight").unwrap().is_some());
    assert!(schema.find_complex_type("EventLocation").unwrap().is_some());
    assert!(schema.metadata_as_string().unwrap().contains("PlanItems"));
}

#[tokio::test]
async fn test_cancel_mid_flight_then_retry() {
    let schema = Schema::new(StaticFetcher::trippin().hang_first(), JsonRecordParser::new());
    let token = CancellationToken::new();

    let (result, _) = tokio::join!(schema.resolve(&token), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
    });

    assert!(matches!(result, Err(SchemaError::Cancelled)));
    assert_eq!(schema.state(), SchemaState::Unresolved);
    assert!(schema.last_error().is_none());

    schema.resolve(&CancellationToken::new()).await.unwrap();
    assert_eq!(schema.state(), SchemaState::Resolved);
    assert_eq!(schema.fetcher().calls(), 2);
}

#[tokio::test]
async fn test_cancel_reaches_every_waiter() {
    let schema = Schema::new(StaticFetcher::trippin().hang_first(), JsonRecordParser::new());
    let initiator = CancellationToken::new();
    let bystander = CancellationToken::new();

    let (first, second, _) = tokio::join!(
        schema.resolve(&initiator),
        schema.resolve(&bystander),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            initiator.cancel();
        }
    );

    assert!(matches!(first, Err(SchemaError::Cancelled)));
    assert!(matches!(second, Err(SchemaError::Cancelled)));
    assert_eq!(schema.fetcher().calls(), 1);
    assert_eq!(schema.state(), SchemaState::Unresolved);
}

#[tokio::test]
async fn test_transport_failure_is_retriable() {
    let schema = Schema::new(StaticFetcher::trippin().fail_first(), JsonRecordParser::new());
    let token = CancellationToken::new();

    let err = schema.resolve(&token).await.unwrap_err();
    assert!(matches!(err, SchemaError::FetchFailed(_)));
    assert!(err.is_retriable());
    assert_eq!(schema.state(), SchemaState::Failed);

    schema.resolve(&token).await.unwrap();
    assert_eq!(schema.state(), SchemaState::Resolved);
}

#[tokio::test]
async fn test_malformed_payload_is_parse_failure() {
    let schema = Schema::new(StaticFetcher::new("{ not json"), JsonRecordParser::new());

    let err = schema.resolve(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, SchemaError::ParseFailed(_)));
    assert!(err.is_retriable());
    assert!(!err.is_structural());
}

#[tokio::test]
async fn test_duplicate_tables_fail_permanently() {
    let records = trippin_records().with_table("People", "Person");
    let schema = schema_for(&records);
    let token = CancellationToken::new();

    let first = schema.resolve(&token).await.unwrap_err();
    assert!(matches!(first, SchemaError::DuplicateDefinition { .. }));
    assert_eq!(schema.state(), SchemaState::Failed);

    let second = schema.resolve(&token).await.unwrap_err();
    assert!(matches!(second, SchemaError::DuplicateDefinition { .. }));
    assert_eq!(schema.fetcher().calls(), 1);
    assert!(schema.last_error().is_some_and(|e| e.is_structural()));
}

#[tokio::test]
async fn test_cyclic_hierarchy_fails_permanently() {
    let records = MetadataRecords::new()
        .with_entity_type(EntityTypeRecord::new("A", "Ns").derives_from("B"))
        .with_entity_type(EntityTypeRecord::new("B", "Ns").derives_from("A"));
    let schema = schema_for(&records);

    let err = schema.resolve(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, SchemaError::CyclicHierarchy(_)));
    assert_eq!(schema.state(), SchemaState::Failed);
}
