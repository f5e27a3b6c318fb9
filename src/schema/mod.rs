//! Schema resolution and lookup.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  MetadataRecords (flat, parsed)                 │
//! └─────────────────────────────────────────────────────────────────┘
//!                                 │
//!                                 ▼ [registry]
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   EntityRegistry: tables, functions, entity and complex types   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                 │
//!                                 ▼ [hierarchy]
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   TypeHierarchy (entity types)     TypeHierarchy (complex)      │
//! └─────────────────────────────────────────────────────────────────┘
//!                                 │
//!                                 ▼ [table_index]
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   TableIndex: base/derived tables, inherited columns            │
//! └─────────────────────────────────────────────────────────────────┘
//!                                 │
//!                                 ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   ResolvedSchema  ◄──  PathResolver ("People/Trips/PlanItems")  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`Schema`] drives the pipeline lazily and shares one resolution between
//! concurrent callers.

mod error;
mod facade;
mod hierarchy;
mod model;
mod path;
mod registry;
mod resolved;
mod table_index;

pub use error::{EntityKind, SchemaError, SchemaResult};
pub use facade::{Schema, SchemaState};
pub use hierarchy::TypeHierarchy;
pub use model::{
    Association, Column, EdmComplexType, EdmEntityType, EdmProperty, Function, Multiplicity,
    Parameter, Table,
};
pub use path::{PathResolver, TablePath};
pub use registry::EntityRegistry;
pub use resolved::ResolvedSchema;
pub use table_index::TableIndex;
