//! Integrity Verifier
//!
//! Checks every column for a name and a data type, and every foreign-key
//! hint for a resolvable target. All problems are collected; the pass never
//! stops at the first one.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::model::{Column, DataDef};

/// Pseudo table name under which `DataDef::fixed` is checked and indexed
pub const FIXED_TABLE: &str = "fixed";

// =============================================================================
// Diagnostic Codes
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    /// Column without a name
    MissingColumnName,
    /// Column without a data type
    MissingDataType,
    /// Foreign key whose table or column does not exist
    UnresolvedForeignKey,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingColumnName => "E001",
            Self::MissingDataType => "E002",
            Self::UnresolvedForeignKey => "E003",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Diagnostic
// =============================================================================

/// One problem found in the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub table: String,
    /// Zero-based position of the column within its table
    pub column_index: usize,
    pub column: String,
    pub code: DiagnosticCode,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Table: {}] {}", self.table, self.message)
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: Diagnostic) {
        self.items.push(item);
    }

    pub fn all(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.items.iter().filter(|d| d.code == code).count()
    }

    /// Order by table name, then column position
    pub fn sort(&mut self) {
        self.items
            .sort_by(|a, b| (&a.table, a.column_index).cmp(&(&b.table, b.column_index)));
    }

    /// One line per diagnostic
    pub fn format_all(&self) -> String {
        let mut output = String::new();
        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }
        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// =============================================================================
// Verification
// =============================================================================

/// Check the whole model and return every problem, sorted.
///
/// Fixed columns are checked as the pseudo table `fixed`, and foreign keys
/// may point at them as `fixed.<column>`. Call this after fixed columns have
/// been expanded to check them in the context of each table.
pub fn verify(data: &DataDef) -> Diagnostics {
    let mut index: HashMap<&str, &[Column]> = data
        .tables()
        .map(|t| (t.name.as_str(), t.columns.as_slice()))
        .collect();
    index.insert(FIXED_TABLE, data.fixed.as_slice());

    let mut diagnostics = Diagnostics::new();
    let fixed = std::iter::once((FIXED_TABLE, data.fixed.as_slice()));
    let tables = data.tables().map(|t| (t.name.as_str(), t.columns.as_slice()));

    for (table, columns) in fixed.chain(tables) {
        for (position, column) in columns.iter().enumerate() {
            check_column(&index, table, position, column, &mut diagnostics);
        }
    }

    diagnostics.sort();
    diagnostics
}

fn check_column(
    index: &HashMap<&str, &[Column]>,
    table: &str,
    position: usize,
    column: &Column,
    diagnostics: &mut Diagnostics,
) {
    let line = position + 1;
    let mut report = |code: DiagnosticCode, message: String| {
        diagnostics.push(Diagnostic {
            table: table.to_string(),
            column_index: position,
            column: column.name.clone(),
            code,
            message,
        })
    };

    if column.name.trim().is_empty() {
        report(
            DiagnosticCode::MissingColumnName,
            format!("missing column name at line {}", line),
        );
    }
    if column.data_type.trim().is_empty() {
        report(
            DiagnosticCode::MissingDataType,
            format!("missing data type of the column '{}' at line {}", column.name, line),
        );
    }

    let foreign_key = column.foreign_key.trim();
    if foreign_key.is_empty() {
        return;
    }
    let resolved = column
        .foreign_key_target()
        .and_then(|(target, target_column)| {
            index
                .get(target)
                .map(|columns| columns.iter().any(|c| c.name == target_column))
        })
        .unwrap_or(false);
    if !resolved {
        report(
            DiagnosticCode::UnresolvedForeignKey,
            format!("[FK: {}] cannot be found at line {}", foreign_key, line),
        );
    }
}
