//! Flat metadata records produced by a [`MetadataParser`](super::MetadataParser).
//!
//! Records reference each other by name only. Turning them into the linked,
//! inheritance-aware schema is the job of [`crate::schema`].

use serde::{Deserialize, Serialize};

use crate::schema::Multiplicity;

fn default_nullable() -> bool {
    true
}

/// Every record the parser extracted from one metadata payload.
///
/// Each sequence keeps the order in which the payload declared its items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataRecords {
    pub tables: Vec<TableRecord>,
    pub columns: Vec<ColumnRecord>,
    pub associations: Vec<AssociationRecord>,
    pub functions: Vec<FunctionRecord>,
    pub entity_types: Vec<EntityTypeRecord>,
    pub complex_types: Vec<ComplexTypeRecord>,
}

impl MetadataRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.tables.push(TableRecord {
            name: name.into(),
            entity_type: entity_type.into(),
        });
        self
    }

    /// Add a nullable column to `table`.
    pub fn with_column(
        self,
        table: impl Into<String>,
        name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        self.with_column_record(ColumnRecord::new(table, name, type_name))
    }

    pub fn with_column_record(mut self, column: ColumnRecord) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_association(mut self, association: AssociationRecord) -> Self {
        self.associations.push(association);
        self
    }

    pub fn with_function(mut self, function: FunctionRecord) -> Self {
        self.functions.push(function);
        self
    }

    pub fn with_entity_type(mut self, entity_type: EntityTypeRecord) -> Self {
        self.entity_types.push(entity_type);
        self
    }

    pub fn with_complex_type(mut self, complex_type: ComplexTypeRecord) -> Self {
        self.complex_types.push(complex_type);
        self
    }

    /// Total number of records across all kinds.
    pub fn len(&self) -> usize {
        self.tables.len()
            + self.columns.len()
            + self.associations.len()
            + self.functions.len()
            + self.entity_types.len()
            + self.complex_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An entity set and the entity type describing its rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub name: String,
    pub entity_type: String,
}

/// A column declared directly on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRecord {
    /// Owning table name.
    pub table: String,
    pub name: String,
    pub type_name: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

impl ColumnRecord {
    pub fn new(
        table: impl Into<String>,
        name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
        }
    }

    /// Mark the column as non-nullable.
    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// A navigation from one table to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationRecord {
    /// Owning table name.
    pub table: String,
    pub name: String,
    /// Target table name.
    pub target: String,
    #[serde(default = "Multiplicity::many")]
    pub source_multiplicity: Multiplicity,
    #[serde(default = "Multiplicity::many")]
    pub target_multiplicity: Multiplicity,
}

impl AssociationRecord {
    /// A collection-valued navigation (`table` many → many `target`).
    pub fn many(
        table: impl Into<String>,
        name: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            target: target.into(),
            source_multiplicity: Multiplicity::Many,
            target_multiplicity: Multiplicity::Many,
        }
    }

    /// A single-valued navigation (`table` many → zero-or-one `target`).
    pub fn single(
        table: impl Into<String>,
        name: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            target: target.into(),
            source_multiplicity: Multiplicity::Many,
            target_multiplicity: Multiplicity::ZeroOrOne,
        }
    }

    pub fn with_multiplicity(mut self, source: Multiplicity, target: Multiplicity) -> Self {
        self.source_multiplicity = source;
        self.target_multiplicity = target;
        self
    }
}

/// A service-level function or action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterRecord>,
    #[serde(default)]
    pub return_type: Option<String>,
    /// Entity type the function is bound to, if any.
    #[serde(default)]
    pub bound_to: Option<String>,
    #[serde(default)]
    pub is_action: bool,
}

impl FunctionRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: None,
            bound_to: None,
            is_action: false,
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.parameters.push(ParameterRecord {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
        });
        self
    }

    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.return_type = Some(type_name.into());
        self
    }

    pub fn bound_to(mut self, type_name: impl Into<String>) -> Self {
        self.bound_to = Some(type_name.into());
        self
    }

    pub fn action(mut self) -> Self {
        self.is_action = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub name: String,
    pub type_name: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

/// A structural property declared on an entity or complex type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub name: String,
    pub type_name: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTypeRecord {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub is_abstract: bool,
}

impl EntityTypeRecord {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            base_type: None,
            properties: Vec::new(),
            keys: Vec::new(),
            is_abstract: false,
        }
    }

    pub fn derives_from(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.properties.push(PropertyRecord {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
        });
        self
    }

    /// Add a non-nullable property and make it part of the key.
    pub fn with_key(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let name = name.into();
        self.properties.push(PropertyRecord {
            name: name.clone(),
            type_name: type_name.into(),
            nullable: false,
        });
        self.keys.push(name);
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexTypeRecord {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
}

impl ComplexTypeRecord {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            base_type: None,
            properties: Vec::new(),
        }
    }

    pub fn derives_from(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.properties.push(PropertyRecord {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
        });
        self
    }
}
