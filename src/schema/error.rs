//! Error types for schema resolution and lookup.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::metadata::MetadataError;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// The kinds of named items the registry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Table,
    Column,
    Association,
    Function,
    EntityType,
    ComplexType,
    Property,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Table => "table",
            EntityKind::Column => "column",
            EntityKind::Association => "association",
            EntityKind::Function => "function",
            EntityKind::EntityType => "entity type",
            EntityKind::ComplexType => "complex type",
            EntityKind::Property => "property",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while resolving or querying a schema.
///
/// `Clone` so that one failed resolution attempt can be handed to every
/// caller waiting on it.
#[derive(Error, Debug, Clone)]
pub enum SchemaError {
    /// A lookup was made before the schema resolved successfully.
    #[error("schema has not been resolved")]
    NotResolved,

    /// The fetch collaborator failed.
    #[error("failed to fetch metadata: {0}")]
    FetchFailed(#[source] Arc<MetadataError>),

    /// The parse collaborator failed.
    #[error("failed to parse metadata: {0}")]
    ParseFailed(#[source] Arc<MetadataError>),

    /// Two items of the same kind share a name.
    #[error("duplicate {kind} definition: '{name}'")]
    DuplicateDefinition { kind: EntityKind, name: String },

    /// The base-type relation loops back on itself.
    #[error("cyclic type hierarchy: {}", .0.join(" -> "))]
    CyclicHierarchy(Vec<String>),

    /// A record names something that does not exist.
    #[error("{kind} '{name}' references unknown {target_kind} '{target}'")]
    DanglingReference {
        kind: EntityKind,
        name: String,
        target_kind: EntityKind,
        target: String,
    },

    /// A name or path lookup missed.
    #[error("{kind} not found: '{name}'")]
    NotFound { kind: EntityKind, name: String },

    /// A table path segment matched neither an association nor a derived table.
    #[error("cannot resolve segment '{segment}' after '{resolved}'")]
    UnresolvablePath { segment: String, resolved: String },

    /// The resolution attempt was cancelled.
    #[error("metadata resolution cancelled")]
    Cancelled,
}

impl SchemaError {
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn duplicate(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::DuplicateDefinition {
            kind,
            name: name.into(),
        }
    }

    pub fn dangling(
        kind: EntityKind,
        name: impl Into<String>,
        target_kind: EntityKind,
        target: impl Into<String>,
    ) -> Self {
        Self::DanglingReference {
            kind,
            name: name.into(),
            target_kind,
            target: target.into(),
        }
    }

    /// Wrap a fetch collaborator error. Cancellation stays cancellation.
    pub fn fetch(err: MetadataError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::FetchFailed(Arc::new(err))
        }
    }

    pub fn parse(err: MetadataError) -> Self {
        Self::ParseFailed(Arc::new(err))
    }

    /// "Try again later": the next attempt may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed(_) | Self::ParseFailed(_) | Self::Cancelled
        )
    }

    /// "The service's metadata is malformed": retrying reproduces the defect.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::DuplicateDefinition { .. }
                | Self::CyclicHierarchy(_)
                | Self::DanglingReference { .. }
        )
    }

    /// "This name is wrong".
    pub fn is_lookup_miss(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::UnresolvablePath { .. })
    }
}

/// Folds plain not-found misses into `None`, keeping every other error.
pub(crate) trait OptionalLookup<T> {
    fn optional(self) -> SchemaResult<Option<T>>;
}

impl<T> OptionalLookup<T> for SchemaResult<T> {
    fn optional(self) -> SchemaResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(SchemaError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
