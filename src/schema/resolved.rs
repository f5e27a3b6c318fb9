//! The fully built, immutable schema graph.

use tracing::debug;

use super::error::{EntityKind, SchemaResult};
use super::hierarchy::TypeHierarchy;
use super::model::{
    Association, Column, EdmComplexType, EdmEntityType, EdmProperty, Function, Table,
};
use super::path::PathResolver;
use super::registry::EntityRegistry;
use super::table_index::TableIndex;
use crate::metadata::MetadataRecords;

/// Everything resolution produced from one metadata payload.
///
/// Lookups here report misses as `NotFound` errors; the
/// [`Schema`](super::Schema) facade folds those into `None`.
#[derive(Debug)]
pub struct ResolvedSchema {
    metadata: String,
    registry: EntityRegistry,
    entity_hierarchy: TypeHierarchy,
    complex_hierarchy: TypeHierarchy,
    tables: TableIndex,
}

impl ResolvedSchema {
    /// Build the schema graph from parsed records.
    ///
    /// `metadata` is the raw payload the records came from, kept for
    /// diagnostics.
    pub fn build(metadata: String, records: MetadataRecords) -> SchemaResult<Self> {
        let mut registry = EntityRegistry::from_records(records)?;

        let entity_hierarchy = TypeHierarchy::build(
            EntityKind::EntityType,
            registry.entity_type_links(),
        )?;
        let complex_hierarchy = TypeHierarchy::build(
            EntityKind::ComplexType,
            registry.complex_type_links(),
        )?;
        registry.validate_inherited_properties(&entity_hierarchy, &complex_hierarchy)?;

        let tables = TableIndex::build(registry.take_tables(), &entity_hierarchy)?;

        debug!(
            tables = tables.len(),
            entity_types = entity_hierarchy.len(),
            complex_types = complex_hierarchy.len(),
            "schema graph built"
        );

        Ok(Self {
            metadata,
            registry,
            entity_hierarchy,
            complex_hierarchy,
            tables,
        })
    }

    /// The raw metadata payload.
    pub fn metadata_as_string(&self) -> &str {
        &self.metadata
    }

    // =========================================================================
    // Tables and paths
    // =========================================================================

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.tables()
    }

    pub fn table_index(&self) -> &TableIndex {
        &self.tables
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.has_table(name)
    }

    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.find_table(name)
    }

    pub fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(&self.tables, &self.registry)
    }

    pub fn resolve_path(&self, path: &str) -> SchemaResult<&Table> {
        self.resolver().resolve(path)
    }

    pub fn find_base_table(&self, path: &str) -> SchemaResult<&Table> {
        self.resolver().base_table(path)
    }

    pub fn find_concrete_table(&self, path: &str) -> SchemaResult<&Table> {
        self.resolver().concrete_table(path)
    }

    pub fn find_column(&self, path: &str, name: &str) -> SchemaResult<&Column> {
        self.resolver().column(path, name)
    }

    pub fn find_association(&self, path: &str, name: &str) -> SchemaResult<&Association> {
        self.resolver().association(path, name)
    }

    // =========================================================================
    // Functions
    // =========================================================================

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.registry.functions()
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.registry.find_function(name).is_some()
    }

    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.registry.find_function(name)
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub fn entity_types(&self) -> impl Iterator<Item = &EdmEntityType> {
        self.registry.entity_types()
    }

    pub fn complex_types(&self) -> impl Iterator<Item = &EdmComplexType> {
        self.registry.complex_types()
    }

    /// Find an entity type by short or namespace-qualified name.
    pub fn find_entity_type(&self, name: &str) -> Option<&EdmEntityType> {
        self.registry.find_entity_type(name)
    }

    /// Find a complex type by short or namespace-qualified name.
    pub fn find_complex_type(&self, name: &str) -> Option<&EdmComplexType> {
        self.registry.find_complex_type(name)
    }

    pub fn entity_hierarchy(&self) -> &TypeHierarchy {
        &self.entity_hierarchy
    }

    pub fn complex_hierarchy(&self) -> &TypeHierarchy {
        &self.complex_hierarchy
    }

    /// True if entity type `candidate` is `base` or derives from it.
    ///
    /// Both names may be short or qualified. Unknown names are never related.
    pub fn is_base_type_of(&self, base: &str, candidate: &str) -> SchemaResult<bool> {
        match (
            self.registry.entity_type_key(base),
            self.registry.entity_type_key(candidate),
        ) {
            (Some(base), Some(candidate)) => self.entity_hierarchy.is_base_of(base, candidate),
            _ => Ok(false),
        }
    }

    /// All entity types transitively derived from `name`.
    pub fn derived_entity_types(&self, name: &str) -> &[String] {
        match self.registry.entity_type_key(name) {
            Some(key) => self.entity_hierarchy.derived_types(key),
            None => &[],
        }
    }

    /// Declared and inherited properties of an entity type, root type first.
    pub fn entity_type_properties(&self, name: &str) -> SchemaResult<Vec<&EdmProperty>> {
        let (key, ty) = self
            .registry
            .entity_type_entry(name)
            .ok_or_else(|| super::SchemaError::not_found(EntityKind::EntityType, name))?;

        let mut lineage = vec![ty];
        for ancestor in self.entity_hierarchy.ancestors(key)? {
            if let Some(base) = self.registry.find_entity_type(ancestor) {
                lineage.push(base);
            }
        }

        Ok(lineage
            .into_iter()
            .rev()
            .flat_map(|t| t.properties.iter())
            .collect())
    }

    /// Key property names of an entity type, inherited from the root type
    /// when the type declares none.
    pub fn entity_type_keys(&self, name: &str) -> SchemaResult<Vec<&str>> {
        let (key, ty) = self
            .registry
            .entity_type_entry(name)
            .ok_or_else(|| super::SchemaError::not_found(EntityKind::EntityType, name))?;

        if !ty.keys.is_empty() {
            return Ok(ty.keys.iter().map(String::as_str).collect());
        }
        for ancestor in self.entity_hierarchy.ancestors(key)? {
            if let Some(base) = self.registry.find_entity_type(ancestor) {
                if !base.keys.is_empty() {
                    return Ok(base.keys.iter().map(String::as_str).collect());
                }
            }
        }
        Ok(Vec::new())
    }
}
