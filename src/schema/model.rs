//! Immutable schema entities.
//!
//! Everything here is built once during resolution and never mutated
//! afterwards. Cross references are names, looked up through the owning
//! [`ResolvedSchema`](super::ResolvedSchema).

use serde::{Deserialize, Serialize};

/// Multiplicity of one end of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    One,
    ZeroOrOne,
    Many,
}

impl Multiplicity {
    pub fn many() -> Self {
        Multiplicity::Many
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Multiplicity::Many)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Multiplicity::One => "1",
            Multiplicity::ZeroOrOne => "0..1",
            Multiplicity::Many => "*",
        }
    }
}

impl std::fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    /// Name of the entity type describing this table's rows.
    pub entity_type: String,
    /// Columns declared on this table (not inherited ones).
    pub columns: Vec<Column>,
    /// Associations declared on this table (not inherited ones).
    pub associations: Vec<Association>,
    /// Nearest ancestor table in the inheritance chain.
    pub base_table: Option<String>,
    /// Tables whose base table is this one, in definition order.
    pub derived_tables: Vec<String>,
}

impl Table {
    pub(crate) fn new(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            columns: Vec::new(),
            associations: Vec::new(),
            base_table: None,
            derived_tables: Vec::new(),
        }
    }

    /// Find a column declared directly on this table.
    pub fn own_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Find an association declared directly on this table.
    pub fn own_association(&self, name: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.name == name)
    }

    pub fn has_base_table(&self) -> bool {
        self.base_table.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Association {
    pub name: String,
    /// Target table name.
    pub target: String,
    pub source_multiplicity: Multiplicity,
    pub target_multiplicity: Multiplicity,
}

impl Association {
    /// Does navigating this association yield a collection?
    pub fn is_collection(&self) -> bool {
        self.target_multiplicity.is_collection()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
}

/// A service-level function or action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub bound_to: Option<String>,
    pub is_action: bool,
}

impl Function {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn is_bound(&self) -> bool {
        self.bound_to.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdmProperty {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdmEntityType {
    pub name: String,
    pub namespace: String,
    /// Properties declared on this type (not inherited ones).
    pub properties: Vec<EdmProperty>,
    pub base_type: Option<String>,
    pub keys: Vec<String>,
    pub is_abstract: bool,
}

impl EdmEntityType {
    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }

    pub fn property(&self, name: &str) -> Option<&EdmProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdmComplexType {
    pub name: String,
    pub namespace: String,
    pub properties: Vec<EdmProperty>,
    pub base_type: Option<String>,
}

impl EdmComplexType {
    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }

    pub fn property(&self, name: &str) -> Option<&EdmProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}

/// Does `candidate` name the type `name` in `namespace`, short or qualified?
pub(crate) fn names_type(candidate: &str, namespace: &str, name: &str) -> bool {
    if candidate == name {
        return true;
    }
    candidate
        .strip_suffix(name)
        .and_then(|prefix| prefix.strip_suffix('.'))
        .is_some_and(|ns| ns == namespace)
}
