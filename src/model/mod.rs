//! Schema Model
//!
//! The entity graph `DataDef -> Schema -> Table -> Column`. A table's
//! [`Reference`] list is derived at load time by [`crate::link`] and is never
//! part of the persisted form.

pub mod parse;
pub mod primary_key;

use std::collections::HashMap;

use serde::Serialize;

pub use parse::{load_file, parse_yaml};
pub use primary_key::identity_rank;

/// Root of a schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataDef {
    /// Columns implicitly appended to every table
    pub fixed: Vec<Column>,
    pub schemas: Vec<Schema>,
}

/// A named group of tables (one spreadsheet sheet per schema)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    pub name: String,
    pub description: String,
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub title: String,
    pub description: String,
    pub columns: Vec<Column>,
    /// Reverse foreign keys pointing at this table (derived, never persisted)
    pub references: Vec<Reference>,
}

/// A column definition. All attributes are kept as the author wrote them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    /// `Y` for a single-column key, or the position in a composite key
    pub identity: String,
    pub not_null: String,
    pub unique: String,
    /// Default value
    pub value: String,
    /// `table.column`
    pub foreign_key: String,
    /// `near:far`, each side one of `1`, `*`, `0..1`, `0..*`
    pub cardinality: String,
    pub title: String,
    pub index: String,
    pub description: String,
    pub computed: String,
}

/// All columns of `table` that reference `column`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub column: String,
    pub foreign: Vec<ForeignColumn>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ForeignColumn {
    pub table: String,
    pub column: String,
}

fn is_yes(flag: &str) -> bool {
    matches!(flag.trim(), "Y" | "y")
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            ..Default::default()
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: impl Into<String>) -> Self {
        self.foreign_key = foreign_key.into();
        self
    }

    pub fn with_not_null(mut self) -> Self {
        self.not_null = "Y".to_string();
        self
    }

    /// Whether the identity marker makes this column part of the primary key
    pub fn is_primary_key(&self) -> bool {
        self.identity == "Y" || self.identity.chars().any(|c| c.is_ascii_digit())
    }

    pub fn is_not_null(&self) -> bool {
        is_yes(&self.not_null)
    }

    pub fn is_unique(&self) -> bool {
        is_yes(&self.unique)
    }

    pub fn is_indexed(&self) -> bool {
        is_yes(&self.index)
    }

    /// Split the foreign-key hint on the first `.` into `(table, column)`
    pub fn foreign_key_target(&self) -> Option<(&str, &str)> {
        let fk = self.foreign_key.trim();
        if fk.is_empty() {
            return None;
        }
        fk.split_once('.')
    }

    /// Split the cardinality hint into `(near, far)`. A hint without `:`
    /// only describes the near side.
    pub fn cardinality_pair(&self) -> (&str, &str) {
        self.cardinality
            .split_once(':')
            .unwrap_or((self.cardinality.as_str(), ""))
    }

    /// Equality over every persisted attribute except the description.
    ///
    /// Two columns that are the same definition apart from prose are
    /// interchangeable for fixed-column compaction.
    pub fn same_definition(&self, other: &Column) -> bool {
        self.name == other.name
            && self.data_type == other.data_type
            && self.identity == other.identity
            && self.not_null == other.not_null
            && self.unique == other.unique
            && self.value == other.value
            && self.foreign_key == other.foreign_key
            && self.cardinality == other.cardinality
            && self.title == other.title
            && self.index == other.index
            && self.computed == other.computed
    }
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            ..Default::default()
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Derived references for one target column of this table
    pub fn references_to(&self, column: &str) -> Option<&Reference> {
        self.references.iter().find(|r| r.column == column)
    }

    /// `name - title - description`, skipping empty parts
    pub fn caption(&self) -> String {
        [&self.name, &self.title, &self.description]
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

impl Schema {
    pub fn new(name: impl Into<String>, tables: Vec<Table>) -> Self {
        Self {
            name: name.into(),
            tables,
            ..Default::default()
        }
    }
}

impl DataDef {
    pub fn new(schemas: Vec<Schema>) -> Self {
        Self {
            fixed: Vec::new(),
            schemas,
        }
    }

    /// Every table across all schemas, in declaration order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.schemas.iter().flat_map(|s| s.tables.iter())
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.schemas.iter_mut().flat_map(|s| s.tables.iter_mut())
    }

    pub fn table_count(&self) -> usize {
        self.schemas.iter().map(|s| s.tables.len()).sum()
    }

    pub fn column_count(&self) -> usize {
        self.tables().map(|t| t.columns.len()).sum::<usize>() + self.fixed.len()
    }

    /// First table with the given name, across all schemas
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables().find(|t| t.name == name)
    }

    /// Name -> table lookup, rebuilt on demand.
    ///
    /// Foreign keys address tables by bare name, so when two schemas declare
    /// the same table name the later declaration wins.
    pub fn table_index(&self) -> HashMap<&str, &Table> {
        self.tables().map(|t| (t.name.as_str(), t)).collect()
    }
}
