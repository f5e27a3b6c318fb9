//! # odata-schema
//!
//! Lazily resolved, read-only schema model for OData services.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          MetadataFetcher (file, cached, custom)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │ raw payload
//!                          ▼ [MetadataParser]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  MetadataRecords                         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [Schema::resolve, once]
//! ┌─────────────────────────────────────────────────────────┐
//! │   ResolvedSchema: tables, functions, type hierarchies    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//!          lookups: find_table, find_column, paths, ...
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use odata_schema::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::new(
//!     FileMetadataFetcher::new("trippin.json"),
//!     JsonRecordParser::new(),
//! );
//! schema.resolve(&CancellationToken::new()).await?;
//!
//! let flight = schema.find_concrete_table("People/Trips/PlanItems/Flight")?;
//! let base = schema.find_base_table("People/Trips/PlanItems/Flight")?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod metadata;
pub mod schema;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::metadata::{
        CachingFetcher, FileMetadataFetcher, JsonRecordParser, MetadataError, MetadataFetcher,
        MetadataParser, MetadataRecords,
    };
    pub use crate::schema::{
        Association, Column, EdmComplexType, EdmEntityType, Function, Multiplicity,
        ResolvedSchema, Schema, SchemaError, SchemaResult, SchemaState, Table,
    };
    pub use tokio_util::sync::CancellationToken;
}

pub use schema::{Schema, SchemaError, SchemaResult, SchemaState};
