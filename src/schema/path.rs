//! Table path resolution.
//!
//! A table path starts at a table and then, segment by segment, either
//! navigates an association or narrows to a derived table:
//!
//! ```text
//! People/Trips/PlanItems/Flight
//! ──┬─── ──┬── ────┬──── ──┬───
//!   │      │       │       └─ type cast: Flight derives from PlanItems
//!   │      │       └───────── association Trips.PlanItems
//!   │      └───────────────── association People.Trips
//!   └──────────────────────── table
//! ```
//!
//! Segments are separated by `/`; a path without any `/` is split on `.`.

use super::error::{EntityKind, SchemaError, SchemaResult};
use super::model::{names_type, Association, Column, Table};
use super::registry::EntityRegistry;
use super::table_index::TableIndex;

/// A table path split into its non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePath<'p> {
    pub delimiter: char,
    pub segments: Vec<&'p str>,
}

impl<'p> TablePath<'p> {
    pub fn parse(path: &'p str) -> Self {
        let delimiter = if path.contains('/') { '/' } else { '.' };
        let segments = path
            .split(delimiter)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            delimiter,
            segments,
        }
    }

    /// The first `n` segments joined back together.
    fn prefix(&self, n: usize) -> String {
        self.segments[..n.min(self.segments.len())].join(&self.delimiter.to_string())
    }
}

/// Resolves table paths against a built table index.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    tables: &'a TableIndex,
    registry: &'a EntityRegistry,
}

impl<'a> PathResolver<'a> {
    pub fn new(tables: &'a TableIndex, registry: &'a EntityRegistry) -> Self {
        Self { tables, registry }
    }

    /// Resolve `path` to the table it names.
    ///
    /// Fails with `NotFound` if the first segment is not a table and with
    /// `UnresolvablePath` at the first segment that is neither an association
    /// of the current table nor a table derived from it.
    pub fn resolve(&self, path: &str) -> SchemaResult<&'a Table> {
        let table_path = TablePath::parse(path);
        let Some((first, rest)) = table_path.segments.split_first() else {
            return Err(SchemaError::not_found(EntityKind::Table, path));
        };

        let mut current = self.tables.table(first)?;

        for (i, segment) in rest.iter().enumerate() {
            current = if let Some(association) = self.tables.find_association(current, segment) {
                self.tables.table(&association.target)?
            } else if let Some(derived) = self.narrow(current, segment) {
                derived
            } else {
                return Err(SchemaError::UnresolvablePath {
                    segment: segment.to_string(),
                    resolved: table_path.prefix(i + 1),
                });
            };
        }

        Ok(current)
    }

    /// Resolve `path`, then climb to the top of the table's inheritance chain.
    pub fn base_table(&self, path: &str) -> SchemaResult<&'a Table> {
        let table = self.resolve(path)?;
        Ok(self.tables.root_table(table))
    }

    /// Resolve `path` to the most specific table it names.
    ///
    /// A path ending in a type-cast segment yields the derived table; a path
    /// without one yields the table reached by navigation, unnarrowed.
    pub fn concrete_table(&self, path: &str) -> SchemaResult<&'a Table> {
        self.resolve(path)
    }

    pub fn column(&self, path: &str, name: &str) -> SchemaResult<&'a Column> {
        let table = self.resolve(path)?;
        self.tables
            .find_column(table, name)
            .ok_or_else(|| SchemaError::not_found(EntityKind::Column, format!("{}.{}", table.name, name)))
    }

    pub fn association(&self, path: &str, name: &str) -> SchemaResult<&'a Association> {
        let table = self.resolve(path)?;
        self.tables.find_association(table, name).ok_or_else(|| {
            SchemaError::not_found(EntityKind::Association, format!("{}.{}", table.name, name))
        })
    }

    /// Find the table derived from `current` that `segment` names.
    ///
    /// A derived table's own name wins. Otherwise the segment may name the
    /// derived table's entity type, short or qualified; among several such
    /// tables the deepest wins, then the most recently defined.
    fn narrow(&self, current: &'a Table, segment: &str) -> Option<&'a Table> {
        let descendants = self.tables.descendants(current);

        if let Some(table) = descendants.iter().find(|t| t.name == segment) {
            return Some(*table);
        }

        descendants
            .into_iter()
            .filter(|t| {
                self.registry
                    .find_entity_type(&t.entity_type)
                    .is_some_and(|ty| names_type(segment, &ty.namespace, &ty.name))
            })
            .max_by_key(|t| {
                (
                    self.tables.lineage(t).len(),
                    self.tables.position(&t.name).unwrap_or(0),
                )
            })
    }
}
