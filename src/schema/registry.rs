//! Entity registry: turns flat records into keyed, immutable entities.
//!
//! Every kind is stored in an insertion-ordered map so that iteration follows
//! the order the metadata declared things in. Type references in records may
//! use either the short or the namespace-qualified name; the registry stores
//! them normalized to the type's key.
//!
//! A type is keyed by its short name unless another namespace declares the
//! same short name, in which case both are keyed by qualified name and only
//! qualified references reach them.

use std::collections::{HashMap, HashSet};

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::debug;

use super::error::{EntityKind, SchemaError, SchemaResult};
use super::hierarchy::TypeHierarchy;
use super::model::{
    Association, Column, EdmComplexType, EdmEntityType, EdmProperty, Function, Parameter, Table,
};
use crate::metadata::{MetadataRecords, PropertyRecord};

/// Canonical set of entities, keyed by name per kind.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    pub(crate) tables: IndexMap<String, Table>,
    pub(crate) functions: IndexMap<String, Function>,
    pub(crate) entity_types: IndexMap<String, EdmEntityType>,
    pub(crate) complex_types: IndexMap<String, EdmComplexType>,
    /// Qualified entity type name -> key.
    entity_aliases: HashMap<String, String>,
    /// Qualified complex type name -> key.
    complex_aliases: HashMap<String, String>,
}

impl EntityRegistry {
    /// Build the registry from parsed records.
    ///
    /// Fails with `DuplicateDefinition` on a name collision within a kind and
    /// with `DanglingReference` when a record names something unknown.
    pub fn from_records(records: MetadataRecords) -> SchemaResult<Self> {
        let mut registry = Self::default();

        let shared = repeated_names(records.entity_types.iter().map(|r| r.name.as_str()));
        for record in records.entity_types {
            let properties = build_properties(&record.name, record.properties)?;
            let entity_type = EdmEntityType {
                name: record.name,
                namespace: record.namespace,
                properties,
                base_type: record.base_type,
                keys: record.keys,
                is_abstract: record.is_abstract,
            };
            let qualified = entity_type.qualified_name();
            let key = type_key(&shared, &entity_type.name, &qualified);
            match registry.entity_types.entry(key) {
                Entry::Occupied(slot) => {
                    return Err(SchemaError::duplicate(EntityKind::EntityType, slot.key()))
                }
                Entry::Vacant(slot) => {
                    registry.entity_aliases.insert(qualified, slot.key().clone());
                    slot.insert(entity_type);
                }
            }
        }

        let shared = repeated_names(records.complex_types.iter().map(|r| r.name.as_str()));
        for record in records.complex_types {
            let properties = build_properties(&record.name, record.properties)?;
            let complex_type = EdmComplexType {
                name: record.name,
                namespace: record.namespace,
                properties,
                base_type: record.base_type,
            };
            let qualified = complex_type.qualified_name();
            let key = type_key(&shared, &complex_type.name, &qualified);
            match registry.complex_types.entry(key) {
                Entry::Occupied(slot) => {
                    return Err(SchemaError::duplicate(EntityKind::ComplexType, slot.key()))
                }
                Entry::Vacant(slot) => {
                    registry.complex_aliases.insert(qualified, slot.key().clone());
                    slot.insert(complex_type);
                }
            }
        }

        registry.normalize_base_types()?;

        for record in records.tables {
            let entity_type = registry
                .entity_type_key(&record.entity_type)
                .ok_or_else(|| {
                    SchemaError::dangling(
                        EntityKind::Table,
                        &record.name,
                        EntityKind::EntityType,
                        &record.entity_type,
                    )
                })?
                .to_string();
            match registry.tables.entry(record.name) {
                Entry::Occupied(slot) => {
                    return Err(SchemaError::duplicate(EntityKind::Table, slot.key()))
                }
                Entry::Vacant(slot) => {
                    let table = Table::new(slot.key().clone(), entity_type);
                    slot.insert(table);
                }
            }
        }

        for record in records.columns {
            let table = registry.tables.get_mut(&record.table).ok_or_else(|| {
                SchemaError::dangling(
                    EntityKind::Column,
                    &record.name,
                    EntityKind::Table,
                    &record.table,
                )
            })?;
            if table.own_column(&record.name).is_some() {
                return Err(SchemaError::duplicate(
                    EntityKind::Column,
                    format!("{}.{}", record.table, record.name),
                ));
            }
            table.columns.push(Column {
                name: record.name,
                type_name: record.type_name,
                nullable: record.nullable,
            });
        }

        for record in records.associations {
            if !registry.tables.contains_key(&record.target) {
                return Err(SchemaError::dangling(
                    EntityKind::Association,
                    format!("{}.{}", record.table, record.name),
                    EntityKind::Table,
                    &record.target,
                ));
            }
            let table = registry.tables.get_mut(&record.table).ok_or_else(|| {
                SchemaError::dangling(
                    EntityKind::Association,
                    &record.name,
                    EntityKind::Table,
                    &record.table,
                )
            })?;
            if table.own_association(&record.name).is_some() {
                return Err(SchemaError::duplicate(
                    EntityKind::Association,
                    format!("{}.{}", record.table, record.name),
                ));
            }
            table.associations.push(Association {
                name: record.name,
                target: record.target,
                source_multiplicity: record.source_multiplicity,
                target_multiplicity: record.target_multiplicity,
            });
        }

        for record in records.functions {
            let function = Function {
                name: record.name,
                parameters: record
                    .parameters
                    .into_iter()
                    .map(|p| Parameter {
                        name: p.name,
                        type_name: p.type_name,
                        nullable: p.nullable,
                    })
                    .collect(),
                return_type: record.return_type,
                bound_to: record.bound_to,
                is_action: record.is_action,
            };
            match registry.functions.entry(function.name.clone()) {
                Entry::Occupied(_) => {
                    return Err(SchemaError::duplicate(EntityKind::Function, function.name))
                }
                Entry::Vacant(slot) => {
                    slot.insert(function);
                }
            }
        }

        debug!(
            tables = registry.tables.len(),
            functions = registry.functions.len(),
            entity_types = registry.entity_types.len(),
            complex_types = registry.complex_types.len(),
            "entity registry built"
        );

        Ok(registry)
    }

    /// Rewrite every base type reference to the registry key it names.
    fn normalize_base_types(&mut self) -> SchemaResult<()> {
        let mut resolved = Vec::new();
        for (name, ty) in &self.entity_types {
            if let Some(base) = &ty.base_type {
                let key = self.entity_type_key(base).ok_or_else(|| {
                    SchemaError::dangling(EntityKind::EntityType, name, EntityKind::EntityType, base)
                })?;
                resolved.push((name.clone(), key.to_string()));
            }
        }
        for (name, base) in resolved {
            if let Some(ty) = self.entity_types.get_mut(&name) {
                ty.base_type = Some(base);
            }
        }

        let mut resolved = Vec::new();
        for (name, ty) in &self.complex_types {
            if let Some(base) = &ty.base_type {
                let key = self.complex_type_key(base).ok_or_else(|| {
                    SchemaError::dangling(
                        EntityKind::ComplexType,
                        name,
                        EntityKind::ComplexType,
                        base,
                    )
                })?;
                resolved.push((name.clone(), key.to_string()));
            }
        }
        for (name, base) in resolved {
            if let Some(ty) = self.complex_types.get_mut(&name) {
                ty.base_type = Some(base);
            }
        }

        Ok(())
    }

    /// Check that no type redeclares a property it inherits.
    pub(crate) fn validate_inherited_properties(
        &self,
        entity_hierarchy: &TypeHierarchy,
        complex_hierarchy: &TypeHierarchy,
    ) -> SchemaResult<()> {
        for (key, ty) in &self.entity_types {
            check_inherited(key, &ty.properties, entity_hierarchy, |name| {
                self.entity_types.get(name).map(|t| t.properties.as_slice())
            })?;
        }
        for (key, ty) in &self.complex_types {
            check_inherited(key, &ty.properties, complex_hierarchy, |name| {
                self.complex_types.get(name).map(|t| t.properties.as_slice())
            })?;
        }
        Ok(())
    }

    /// Hand the tables over to the table index.
    pub(crate) fn take_tables(&mut self) -> IndexMap<String, Table> {
        std::mem::take(&mut self.tables)
    }

    /// Registry key for an entity type reference (short or qualified).
    pub fn entity_type_key<'a>(&'a self, reference: &'a str) -> Option<&'a str> {
        if let Some((key, _)) = self.entity_types.get_key_value(reference) {
            return Some(key.as_str());
        }
        self.entity_aliases.get(reference).map(String::as_str)
    }

    /// Registry key for a complex type reference (short or qualified).
    pub fn complex_type_key<'a>(&'a self, reference: &'a str) -> Option<&'a str> {
        if let Some((key, _)) = self.complex_types.get_key_value(reference) {
            return Some(key.as_str());
        }
        self.complex_aliases.get(reference).map(String::as_str)
    }

    /// Entity type and its registry key, by short or qualified reference.
    pub(crate) fn entity_type_entry(&self, reference: &str) -> Option<(&str, &EdmEntityType)> {
        let key = self.entity_type_key(reference)?;
        self.entity_types
            .get_key_value(key)
            .map(|(key, ty)| (key.as_str(), ty))
    }

    /// `(key, base key)` for every entity type, in declaration order.
    pub(crate) fn entity_type_links(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entity_types
            .iter()
            .map(|(key, ty)| (key.as_str(), ty.base_type.as_deref()))
    }

    /// `(key, base key)` for every complex type, in declaration order.
    pub(crate) fn complex_type_links(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.complex_types
            .iter()
            .map(|(key, ty)| (key.as_str(), ty.base_type.as_deref()))
    }

    pub fn find_entity_type(&self, reference: &str) -> Option<&EdmEntityType> {
        self.entity_type_key(reference)
            .and_then(|key| self.entity_types.get(key))
    }

    pub fn find_complex_type(&self, reference: &str) -> Option<&EdmComplexType> {
        self.complex_type_key(reference)
            .and_then(|key| self.complex_types.get(key))
    }

    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &EdmEntityType> {
        self.entity_types.values()
    }

    pub fn complex_types(&self) -> impl Iterator<Item = &EdmComplexType> {
        self.complex_types.values()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }
}

/// Short names declared more than once.
fn repeated_names<'a>(names: impl Iterator<Item = &'a str>) -> HashSet<String> {
    let mut seen = HashSet::new();
    names
        .filter(|name| !seen.insert(*name))
        .map(str::to_string)
        .collect()
}

fn type_key(repeated: &HashSet<String>, name: &str, qualified: &str) -> String {
    if repeated.contains(name) {
        qualified.to_string()
    } else {
        name.to_string()
    }
}

fn build_properties(owner: &str, records: Vec<PropertyRecord>) -> SchemaResult<Vec<EdmProperty>> {
    let mut seen = HashSet::new();
    let mut properties = Vec::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.name.clone()) {
            return Err(SchemaError::duplicate(
                EntityKind::Property,
                format!("{}.{}", owner, record.name),
            ));
        }
        properties.push(EdmProperty {
            name: record.name,
            type_name: record.type_name,
            nullable: record.nullable,
        });
    }
    Ok(properties)
}

fn check_inherited<'a>(
    name: &str,
    properties: &[EdmProperty],
    hierarchy: &TypeHierarchy,
    properties_of: impl Fn(&str) -> Option<&'a [EdmProperty]>,
) -> SchemaResult<()> {
    let ancestors = hierarchy.ancestors(name)?;
    for ancestor in ancestors {
        let Some(inherited) = properties_of(ancestor) else {
            continue;
        };
        if let Some(clash) = properties
            .iter()
            .find(|p| inherited.iter().any(|i| i.name == p.name))
        {
            return Err(SchemaError::duplicate(
                EntityKind::Property,
                format!("{}.{}", name, clash.name),
            ));
        }
    }
    Ok(())
}
