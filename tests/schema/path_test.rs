#[path = "../common/trippin.rs"]
mod trippin;

use odata_schema::metadata::{ColumnRecord, EntityTypeRecord, MetadataRecords};
use odata_schema::schema::{EntityKind, ResolvedSchema, SchemaError};
use trippin::{trippin_records, NAMESPACE};

fn trippin() -> ResolvedSchema {
    ResolvedSchema::build(String::new(), trippin_records()).unwrap()
}

#[test]
fn test_navigation_then_type_cast() {
    let schema = trippin();

    let table = schema.resolve_path("People/Trips/PlanItems/Flight").unwrap();
    assert_eq!(table.name, "Flight");

    assert_eq!(
        schema.find_concrete_table("People/Trips/PlanItems/Flight").unwrap().name,
        "Flight"
    );
    assert_eq!(
        schema.find_base_table("People/Trips/PlanItems/Flight").unwrap().name,
        "PlanItems"
    );
}

#[test]
fn test_unknown_segment_names_the_segment() {
    let schema = trippin();

    let err = schema.resolve_path("People/Trips/PlanItems/Bogus").unwrap_err();
    assert!(err.is_lookup_miss());
    insta::assert_snapshot!(err, @"cannot resolve segment 'Bogus' after 'People/Trips/PlanItems'");
}

#[test]
fn test_unknown_first_segment_is_not_found() {
    let schema = trippin();

    let err = schema.resolve_path("Bogus/Trips").unwrap_err();
    assert!(matches!(
        err,
        SchemaError::NotFound { kind: EntityKind::Table, ref name } if name == "Bogus"
    ));
    assert!(matches!(
        schema.resolve_path(""),
        Err(SchemaError::NotFound { .. })
    ));
}

#[test]
fn test_single_segment_path() {
    let schema = trippin();

    assert_eq!(schema.find_concrete_table("Airports").unwrap().name, "Airports");
    assert_eq!(schema.find_base_table("Airports").unwrap().name, "Airports");
    assert_eq!(schema.find_base_table("Flight").unwrap().name, "PlanItems");
}

#[test]
fn test_unnarrowed_path_is_its_own_concrete_table() {
    let schema = trippin();

    assert_eq!(
        schema.find_concrete_table("People/Trips/PlanItems").unwrap().name,
        "PlanItems"
    );
    assert_eq!(
        schema.find_base_table("People/Trips/PlanItems").unwrap().name,
        "PlanItems"
    );
}

#[test]
fn test_dot_delimited_path() {
    let schema = trippin();

    assert_eq!(schema.resolve_path("People.Trips.PlanItems").unwrap().name, "PlanItems");
}

#[test]
fn test_narrow_by_qualified_type_name() {
    let schema = trippin();

    let path = format!("PlanItems/{}.Event", NAMESPACE);
    assert_eq!(schema.resolve_path(&path).unwrap().name, "Event");
}

#[test]
fn test_navigate_from_derived_table() {
    let schema = trippin();

    let airline = schema
        .find_association("People/Trips/PlanItems/Flight", "Airline")
        .unwrap();
    assert_eq!(airline.target, "Airlines");

    let table = schema
        .resolve_path("People/Trips/PlanItems/Flight/From")
        .unwrap();
    assert_eq!(table.name, "Airports");
}

#[test]
fn test_association_only_on_derived_table() {
    let schema = trippin();

    let err = schema.resolve_path("PlanItems/Airline").unwrap_err();
    assert!(matches!(err, SchemaError::UnresolvablePath { ref segment, .. } if segment == "Airline"));
}

#[test]
fn test_sibling_is_not_a_derived_table() {
    let schema = trippin();

    let err = schema.resolve_path("PlanItems/Flight/Event").unwrap_err();
    assert!(matches!(err, SchemaError::UnresolvablePath { ref resolved, .. } if resolved == "PlanItems/Flight"));
}

#[test]
fn test_columns_are_inherited() {
    let schema = trippin();

    let inherited = schema
        .find_column("People/Trips/PlanItems/Flight", "ConfirmationCode")
        .unwrap();
    assert_eq!(inherited.type_name, "Edm.String");

    let own = schema.find_column("Flight", "FlightNumber").unwrap();
    assert_eq!(own.name, "FlightNumber");

    assert!(schema.find_column("PlanItems", "FlightNumber").is_err());

    let key = schema.find_column("Flight", "PlanItemId").unwrap();
    assert!(!key.nullable);
}

#[test]
fn test_missing_column_names_the_table() {
    let schema = trippin();

    let err = schema.find_column("People/Trips", "Bogus").unwrap_err();
    assert!(matches!(
        err,
        SchemaError::NotFound { kind: EntityKind::Column, ref name } if name == "Trips.Bogus"
    ));
}

fn shadowing_records() -> MetadataRecords {
    MetadataRecords::new()
        .with_entity_type(EntityTypeRecord::new("Document", "Docs").with_key("Id", "Edm.Int32"))
        .with_entity_type(EntityTypeRecord::new("Invoice", "Docs").derives_from("Document"))
        .with_table("Documents", "Document")
        .with_table("Invoices", "Invoice")
        .with_column_record(ColumnRecord::new("Documents", "Id", "Edm.Int32").required())
        .with_column("Documents", "Title", "Edm.String")
        .with_column("Invoices", "Title", "Edm.String")
        .with_column_record(ColumnRecord::new("Invoices", "Total", "Edm.Decimal").required())
}

#[test]
fn test_derived_column_shadows_base_column() {
    let schema = ResolvedSchema::build(String::new(), shadowing_records()).unwrap();

    let invoices = schema.find_table("Invoices").unwrap();
    let documents = schema.find_table("Documents").unwrap();
    let derived = schema.find_column("Invoices", "Title").unwrap();
    let base = schema.find_column("Documents", "Title").unwrap();

    assert!(std::ptr::eq(derived, invoices.own_column("Title").unwrap()));
    assert!(std::ptr::eq(base, documents.own_column("Title").unwrap()));
    assert!(!std::ptr::eq(derived, base));

    let visible: Vec<_> = schema
        .table_index()
        .all_columns(invoices)
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(visible, vec!["Id", "Title", "Total"]);
}

#[test]
fn test_ambiguous_type_cast_prefers_deepest_table() {
    let records = MetadataRecords::new()
        .with_entity_type(EntityTypeRecord::new("Item", "Ns").with_key("Id", "Edm.Int32"))
        .with_entity_type(EntityTypeRecord::new("Special", "Ns").derives_from("Item"))
        .with_table("Items", "Item")
        .with_table("Specials", "Special")
        .with_table("ArchivedSpecials", "Special");

    let schema = ResolvedSchema::build(String::new(), records).unwrap();

    // Both derived tables are over `Special` at the same depth; the later one wins.
    assert_eq!(schema.resolve_path("Items/Special").unwrap().name, "ArchivedSpecials");
    // A table name is never ambiguous.
    assert_eq!(schema.resolve_path("Items/Specials").unwrap().name, "Specials");
}
