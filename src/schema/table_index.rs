//! Table index: name lookup plus inheritance-aware column and association
//! lookup.
//!
//! A table's base table is the table of the nearest ancestor entity type
//! that has one. Intermediate types without a table (TripPin's
//! `PublicTransportation`) are skipped, so `Flight`'s base table is
//! `PlanItems`.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;

use super::error::{EntityKind, SchemaError, SchemaResult};
use super::hierarchy::TypeHierarchy;
use super::model::{Association, Column, Table};

#[derive(Debug, Clone)]
pub struct TableIndex {
    tables: IndexMap<String, Table>,
    /// Entity type name -> first table defined over it.
    by_entity_type: HashMap<String, String>,
}

impl TableIndex {
    /// Link each table to its base and derived tables through the entity
    /// type hierarchy.
    pub fn build(mut tables: IndexMap<String, Table>, hierarchy: &TypeHierarchy) -> SchemaResult<Self> {
        let mut by_entity_type: HashMap<String, String> = HashMap::new();
        for table in tables.values() {
            by_entity_type
                .entry(table.entity_type.clone())
                .or_insert_with(|| table.name.clone());
        }

        let mut links = Vec::new();
        for table in tables.values() {
            for ancestor in hierarchy.ancestors(&table.entity_type)? {
                if let Some(base_table) = by_entity_type.get(ancestor) {
                    links.push((table.name.clone(), base_table.clone()));
                    break;
                }
            }
        }

        for (derived, base) in links {
            if let Some(table) = tables.get_mut(&derived) {
                table.base_table = Some(base.clone());
            }
            if let Some(table) = tables.get_mut(&base) {
                table.derived_tables.push(derived);
            }
        }

        Ok(Self {
            tables,
            by_entity_type,
        })
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Like [`find_table`](Self::find_table) but a miss is a `NotFound` error.
    pub fn table(&self, name: &str) -> SchemaResult<&Table> {
        self.find_table(name)
            .ok_or_else(|| SchemaError::not_found(EntityKind::Table, name))
    }

    /// The first table defined over `entity_type`.
    pub fn table_for_entity_type(&self, entity_type: &str) -> Option<&Table> {
        self.by_entity_type
            .get(entity_type)
            .and_then(|name| self.tables.get(name))
    }

    /// Definition order of the table named `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.tables.get_index_of(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// `table` followed by its ancestor tables, nearest first.
    pub fn lineage<'a>(&'a self, table: &'a Table) -> Vec<&'a Table> {
        let mut lineage = vec![table];
        let mut current = table;
        // The base relation is a forest; the bound only guards the walk.
        while lineage.len() <= self.tables.len() {
            let Some(base) = current
                .base_table
                .as_deref()
                .and_then(|name| self.tables.get(name))
            else {
                break;
            };
            lineage.push(base);
            current = base;
        }
        lineage
    }

    /// The root-most ancestor of `table` (`table` itself for a root).
    pub fn root_table<'a>(&'a self, table: &'a Table) -> &'a Table {
        self.lineage(table).last().copied().unwrap_or(table)
    }

    /// True if `candidate` is a strict descendant of `base`.
    pub fn is_derived_from(&self, candidate: &Table, base: &Table) -> bool {
        self.lineage(candidate)
            .iter()
            .skip(1)
            .any(|t| t.name == base.name)
    }

    /// All tables derived from `table`, breadth first.
    pub fn descendants<'a>(&'a self, table: &'a Table) -> Vec<&'a Table> {
        let mut result = Vec::new();
        let mut queue: VecDeque<&Table> = VecDeque::from([table]);
        while let Some(current) = queue.pop_front() {
            for name in &current.derived_tables {
                if let Some(derived) = self.tables.get(name) {
                    result.push(derived);
                    queue.push_back(derived);
                }
            }
        }
        result
    }

    /// Column lookup across the inheritance chain; the most-derived
    /// definition wins.
    pub fn find_column<'a>(&'a self, table: &'a Table, name: &str) -> Option<&'a Column> {
        self.lineage(table)
            .into_iter()
            .find_map(|t| t.own_column(name))
    }

    /// Association lookup across the inheritance chain; the most-derived
    /// definition wins.
    pub fn find_association<'a>(&'a self, table: &'a Table, name: &str) -> Option<&'a Association> {
        self.lineage(table)
            .into_iter()
            .find_map(|t| t.own_association(name))
    }

    /// Every column visible on `table`: inherited columns first, in root to
    /// leaf order, each shadowed in place by a redefinition further down.
    pub fn all_columns<'a>(&'a self, table: &'a Table) -> Vec<&'a Column> {
        let mut columns: IndexMap<&str, &Column> = IndexMap::new();
        for t in self.lineage(table).into_iter().rev() {
            for column in &t.columns {
                columns.insert(column.name.as_str(), column);
            }
        }
        columns.into_values().collect()
    }

    /// Every association visible on `table`, ordered like
    /// [`all_columns`](Self::all_columns).
    pub fn all_associations<'a>(&'a self, table: &'a Table) -> Vec<&'a Association> {
        let mut associations: IndexMap<&str, &Association> = IndexMap::new();
        for t in self.lineage(table).into_iter().rev() {
            for association in &t.associations {
                associations.insert(association.name.as_str(), association);
            }
        }
        associations.into_values().collect()
    }
}
