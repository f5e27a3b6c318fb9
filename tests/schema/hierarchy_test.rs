#[path = "../common/trippin.rs"]
mod trippin;

#[cfg(test)]
mod tests {
    use super::trippin::{trippin_records, NAMESPACE};
    use odata_schema::metadata::{ComplexTypeRecord, EntityTypeRecord, MetadataRecords};
    use odata_schema::schema::{ResolvedSchema, SchemaError};

    fn trippin() -> ResolvedSchema {
        ResolvedSchema::build(String::new(), trippin_records()).unwrap()
    }

    #[test]
    fn test_is_base_type_of() {
        let schema = trippin();

        assert!(schema.is_base_type_of("PlanItem", "Flight").unwrap());
        assert!(schema.is_base_type_of("PublicTransportation", "Flight").unwrap());
        assert!(schema
            .is_base_type_of(&format!("{}.PlanItem", NAMESPACE), "Event")
            .unwrap());
        assert!(!schema.is_base_type_of("Flight", "PlanItem").unwrap());
        assert!(!schema.is_base_type_of("Event", "Flight").unwrap());
        assert!(!schema.is_base_type_of("Unknown", "Flight").unwrap());
    }

    #[test]
    fn test_derived_entity_types() {
        let schema = trippin();

        assert_eq!(
            schema.derived_entity_types("PlanItem"),
            ["PublicTransportation", "Event", "Flight"]
        );
        assert_eq!(schema.derived_entity_types("PublicTransportation"), ["Flight"]);
        assert!(schema.derived_entity_types("Person").is_empty());
    }

    #[test]
    fn test_complex_type_hierarchy() {
        let schema = trippin();
        let complex = schema.complex_hierarchy();

        assert_eq!(complex.base_of("AirportLocation"), Some("Location"));
        assert_eq!(complex.direct_derived("Location"), vec!["AirportLocation", "EventLocation"]);
        assert_eq!(complex.roots(), vec!["City", "Location"]);
    }

    #[test]
    fn test_inherited_properties_root_first() {
        let schema = trippin();

        let names: Vec<_> = schema
            .entity_type_properties("Flight")
            .unwrap()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "PlanItemId",
                "ConfirmationCode",
                "StartsAt",
                "EndsAt",
                "Duration",
                "SeatNumber",
                "FlightNumber"
            ]
        );
    }

    #[test]
    fn test_keys_inherited_from_root() {
        let schema = trippin();

        assert_eq!(schema.entity_type_keys("Flight").unwrap(), vec!["PlanItemId"]);
        assert_eq!(schema.entity_type_keys("Person").unwrap(), vec!["UserName"]);
        assert!(matches!(
            schema.entity_type_keys("Nope"),
            Err(SchemaError::NotFound { .. })
        ));
    }

    #[test]
    fn test_cyclic_entity_types_rejected() {
        let records = MetadataRecords::new()
            .with_entity_type(EntityTypeRecord::new("A", "Ns").derives_from("B"))
            .with_entity_type(EntityTypeRecord::new("B", "Ns").derives_from("C"))
            .with_entity_type(EntityTypeRecord::new("C", "Ns").derives_from("A"));

        let err = ResolvedSchema::build(String::new(), records).unwrap_err();
        match &err {
            SchemaError::CyclicHierarchy(cycle) => {
                assert_eq!(cycle.len(), 4);
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("expected CyclicHierarchy, got {:?}", other),
        }
        assert!(err.is_structural());
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_cyclic_complex_types_rejected() {
        let records = MetadataRecords::new()
            .with_complex_type(ComplexTypeRecord::new("Location", "Ns").derives_from("Ns.Place"))
            .with_complex_type(ComplexTypeRecord::new("Place", "Ns").derives_from("Location"));

        let err = ResolvedSchema::build(String::new(), records).unwrap_err();
        assert!(matches!(err, SchemaError::CyclicHierarchy(_)));
    }

    #[test]
    fn test_deep_chain_is_not_a_cycle() {
        let mut records = MetadataRecords::new().with_entity_type(EntityTypeRecord::new("T0", "Ns"));
        for i in 1..50 {
            records = records.with_entity_type(
                EntityTypeRecord::new(format!("T{}", i), "Ns").derives_from(format!("T{}", i - 1)),
            );
        }

        let schema = ResolvedSchema::build(String::new(), records).unwrap();
        assert_eq!(schema.entity_hierarchy().depth("T49"), 49);
        assert_eq!(schema.derived_entity_types("T0").len(), 49);
    }
}
