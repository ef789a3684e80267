//! Reference Linker
//!
//! Scans every column's foreign-key hint and records, on the target table, one
//! [`Reference`] per referenced column listing every `(table, column)` pair
//! that points at it.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use crate::model::{DataDef, ForeignColumn, Reference};

/// A foreign key whose target could not be linked. Never fatal; the verifier
/// reports the same problem as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkWarning {
    pub table: String,
    pub column: String,
    pub foreign_key: String,
}

impl fmt::Display for LinkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Table: {}] column '{}': table of foreign key '{}' not found",
            self.table, self.column, self.foreign_key
        )
    }
}

/// Compute the reference lists of every target table without touching the
/// model. Keys are target table names.
pub fn derive_references(data: &DataDef) -> (HashMap<String, Vec<Reference>>, Vec<LinkWarning>) {
    let index = data.table_index();
    let mut references: HashMap<String, Vec<Reference>> = HashMap::new();
    let mut warnings = Vec::new();

    for table in data.tables() {
        for column in &table.columns {
            if column.foreign_key.trim().is_empty() {
                continue;
            }
            let Some((target_table, target_column)) = column.foreign_key_target() else {
                debug!(
                    table = %table.name,
                    column = %column.name,
                    foreign_key = %column.foreign_key,
                    "foreign key without '.' separator, skipped"
                );
                continue;
            };

            if !index.contains_key(target_table) {
                warnings.push(LinkWarning {
                    table: table.name.clone(),
                    column: column.name.clone(),
                    foreign_key: column.foreign_key.clone(),
                });
                continue;
            }

            let foreign = ForeignColumn {
                table: table.name.clone(),
                column: column.name.clone(),
            };
            let entries = references.entry(target_table.to_string()).or_default();
            match entries.iter_mut().find(|r| r.column == target_column) {
                Some(reference) => reference.foreign.push(foreign),
                None => entries.push(Reference {
                    column: target_column.to_string(),
                    foreign: vec![foreign],
                }),
            }
        }
    }

    (references, warnings)
}

/// Replace every table's reference list with a freshly derived one.
///
/// Running this twice yields the same model. Warnings are returned and also
/// logged.
pub fn link_references(data: &mut DataDef) -> Vec<LinkWarning> {
    let (mut references, warnings) = derive_references(data);

    for table in data.tables_mut() {
        table.references = references.remove(&table.name).unwrap_or_default();
    }

    for warning in &warnings {
        warn!("{}", warning);
    }
    debug!(unresolved = warnings.len(), "linked references");
    warnings
}
