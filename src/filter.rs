//! Selector/Filter
//!
//! Narrows a model to the schemas, tables and columns whose names match the
//! given wildcard patterns. The input model is never modified.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::model::{DataDef, Schema, Table};
use crate::pattern::WildcardPattern;

const MAX_SUGGESTIONS: usize = 3;

/// Name patterns for one selection. Empty patterns select everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl Selection {
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn tables(pattern: impl Into<String>) -> Self {
        Self {
            table: pattern.into(),
            ..Default::default()
        }
    }

    pub fn is_all(&self) -> bool {
        [&self.schema, &self.table, &self.column]
            .iter()
            .all(|p| p.trim().is_empty())
    }
}

/// Apply `selection` to `data` and return the reduced copy.
///
/// Tables left without columns and schemas left without tables are dropped.
/// Fixed columns are narrowed by the column pattern. An empty result is a
/// [`SchemaError::NoMatch`] carrying the closest table names.
pub fn filter(data: &DataDef, selection: &Selection) -> Result<DataDef> {
    let schema_pattern = WildcardPattern::parse(&selection.schema)?;
    let table_pattern = WildcardPattern::parse(&selection.table)?;
    let column_pattern = WildcardPattern::parse(&selection.column)?;

    let schemas: Vec<Schema> = data
        .schemas
        .iter()
        .filter(|s| schema_pattern.matches(&s.name))
        .filter_map(|schema| {
            let tables: Vec<Table> = schema
                .tables
                .iter()
                .filter(|t| table_pattern.matches(&t.name))
                .filter_map(|table| {
                    let columns: Vec<_> = table
                        .columns
                        .iter()
                        .filter(|c| column_pattern.matches(&c.name))
                        .cloned()
                        .collect();
                    (!columns.is_empty()).then(|| Table {
                        columns,
                        ..table.clone()
                    })
                })
                .collect();
            (!tables.is_empty()).then(|| Schema {
                name: schema.name.clone(),
                description: schema.description.clone(),
                tables,
            })
        })
        .collect();

    let filtered = DataDef {
        fixed: data
            .fixed
            .iter()
            .filter(|c| column_pattern.matches(&c.name))
            .cloned()
            .collect(),
        schemas,
    };

    if filtered.table_count() == 0 {
        return Err(SchemaError::NoMatch {
            suggestions: suggest(data, &schema_pattern, &table_pattern, &column_pattern),
        });
    }

    debug!(
        schemas = filtered.schemas.len(),
        tables = filtered.table_count(),
        "filtered model"
    );
    Ok(filtered)
}

/// Rank the names of the level whose pattern most likely holds the typo
fn suggest(
    data: &DataDef,
    schema: &WildcardPattern,
    table: &WildcardPattern,
    column: &WildcardPattern,
) -> Vec<String> {
    let (queries, candidates): (Vec<String>, Vec<&str>) = if !table.literals().is_empty() {
        (table.literals(), data.tables().map(|t| t.name.as_str()).collect())
    } else if !schema.literals().is_empty() {
        (schema.literals(), data.schemas.iter().map(|s| s.name.as_str()).collect())
    } else {
        (
            column.literals(),
            data.tables()
                .flat_map(|t| t.columns.iter().map(|c| c.name.as_str()))
                .collect(),
        )
    };

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, &str)> = Vec::new();
    for candidate in candidates {
        if scored.iter().any(|(_, name)| *name == candidate) {
            continue;
        }
        let best = queries
            .iter()
            .filter_map(|q| matcher.fuzzy_match(candidate, q))
            .max();
        if let Some(score) = best {
            scored.push((score, candidate));
        }
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, name)| name.to_string())
        .collect()
}
