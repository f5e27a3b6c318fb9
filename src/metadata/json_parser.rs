//! JSON record parser.

use tracing::debug;

use super::error::MetadataResult;
use super::provider::MetadataParser;
use super::types::MetadataRecords;

/// Decodes a [`MetadataRecords`] document serialized as JSON.
///
/// ```json
/// {
///   "tables": [{ "name": "People", "entity_type": "Person" }],
///   "entity_types": [{ "name": "Person", "namespace": "Trippin" }]
/// }
/// ```
///
/// Missing sections decode as empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordParser;

impl JsonRecordParser {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataParser for JsonRecordParser {
    fn parse_metadata(&self, payload: &str) -> MetadataResult<MetadataRecords> {
        let records: MetadataRecords = serde_json::from_str(payload)?;
        debug!(
            tables = records.tables.len(),
            entity_types = records.entity_types.len(),
            functions = records.functions.len(),
            "decoded metadata records"
        );
        Ok(records)
    }
}
