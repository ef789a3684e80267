//! Fixed-Column Normalizer
//!
//! [`expand_fixed_columns`] distributes `DataDef::fixed` into every table on
//! the input path. [`compact_fixed_columns`] is its lossy inverse on the
//! output path: a column that every table carries with the same definition
//! moves back into `fixed`.

use tracing::{debug, warn};

use crate::model::{Column, DataDef};

/// Append a copy of every fixed column to every table, then clear `fixed`.
///
/// A table that already declares a column of the same name keeps its own
/// definition.
pub fn expand_fixed_columns(data: &mut DataDef) {
    if data.fixed.is_empty() {
        return;
    }
    let fixed = std::mem::take(&mut data.fixed);

    for table in data.tables_mut() {
        for column in &fixed {
            if table.has_column(&column.name) {
                warn!(
                    table = %table.name,
                    column = %column.name,
                    "table already declares fixed column, keeping table definition"
                );
                continue;
            }
            table.columns.push(column.clone());
        }
    }
    debug!(columns = fixed.len(), "expanded fixed columns");
}

/// Move columns shared by every table back into `fixed`.
///
/// A column qualifies when every table in every schema has a column that is
/// [`Column::same_definition`] to it.
///
/// This departs from a plain "carried by all tables" count when there is
/// only one table: every column of a lone table would qualify and the table
/// would be emptied into `fixed`. With fewer than two tables the model is
/// left as is, so fixed columns expanded into a single table stay there.
pub fn compact_fixed_columns(data: &mut DataDef) {
    let total = data.table_count();
    if total < 2 {
        return;
    }

    let mut shared: Vec<Column> = Vec::new();
    if let Some(first) = data.tables().next() {
        for candidate in &first.columns {
            if shared.iter().any(|c| c.same_definition(candidate)) {
                continue;
            }
            let carriers = data
                .tables()
                .filter(|t| t.columns.iter().any(|c| c.same_definition(candidate)))
                .count();
            if carriers == total {
                shared.push(candidate.clone());
            }
        }
    }

    for column in &shared {
        for table in data.tables_mut() {
            if let Some(pos) = table.columns.iter().position(|c| c.same_definition(column)) {
                table.columns.remove(pos);
            }
        }
        if !data.fixed.iter().any(|c| c.same_definition(column)) {
            data.fixed.push(column.clone());
        }
    }
    debug!(columns = shared.len(), "compacted fixed columns");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Schema, Table};

    fn audit() -> Vec<Column> {
        vec![
            Column::new("created_at", "datetime").with_not_null(),
            Column::new("updated_at", "datetime"),
        ]
    }

    fn model() -> DataDef {
        let mut data = DataDef::new(vec![
            Schema::new(
                "a",
                vec![
                    Table::new("users", vec![Column::new("id", "int").with_identity("Y")]),
                    Table::new("orders", vec![Column::new("id", "bigint").with_identity("Y")]),
                ],
            ),
            Schema::new("b", vec![Table::new("logs", vec![Column::new("msg", "text")])]),
        ]);
        data.fixed = audit();
        data
    }

    #[test]
    fn test_expand() {
        let mut data = model();
        expand_fixed_columns(&mut data);

        assert!(data.fixed.is_empty());
        for table in data.tables() {
            assert!(table.has_column("created_at"), "{}", table.name);
            assert!(table.has_column("updated_at"), "{}", table.name);
        }
        let users = data.find_table("users").unwrap();
        let names: Vec<_> = users.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "created_at", "updated_at"]);
    }

    #[test]
    fn test_expand_skips_declared_column() {
        let mut data = model();
        data.schemas[1].tables[0]
            .columns
            .push(Column::new("created_at", "timestamp"));
        expand_fixed_columns(&mut data);

        let logs = data.find_table("logs").unwrap();
        let created: Vec<_> = logs
            .columns
            .iter()
            .filter(|c| c.name == "created_at")
            .collect();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].data_type, "timestamp");
    }

    #[test]
    fn test_compact_round_trip() {
        let original = model();
        let mut data = original.clone();
        expand_fixed_columns(&mut data);
        compact_fixed_columns(&mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn test_compact_requires_every_table() {
        let mut data = model();
        expand_fixed_columns(&mut data);
        data.schemas[1].tables[0].columns.retain(|c| c.name != "updated_at");
        compact_fixed_columns(&mut data);

        assert_eq!(data.fixed.len(), 1);
        assert_eq!(data.fixed[0].name, "created_at");
        assert!(data.find_table("users").unwrap().has_column("updated_at"));
    }

    #[test]
    fn test_compact_ignores_description() {
        let mut data = model();
        expand_fixed_columns(&mut data);
        data.schemas[0].tables[1].columns[1].description = "creation time".to_string();
        compact_fixed_columns(&mut data);
        assert_eq!(data.fixed.len(), 2);
        assert!(data.tables().all(|t| !t.has_column("created_at")));
    }

    #[test]
    fn test_single_table_keeps_expanded_fixed_columns() {
        let mut data = DataDef::new(vec![Schema::new(
            "s",
            vec![Table::new("only", vec![Column::new("id", "int")])],
        )]);
        data.fixed = vec![Column::new("created_at", "datetime")];

        expand_fixed_columns(&mut data);
        compact_fixed_columns(&mut data);

        assert!(data.fixed.is_empty());
        let names: Vec<_> = data.schemas[0].tables[0]
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["id", "created_at"]);
    }

    #[test]
    fn test_compact_single_table_is_noop() {
        let mut data = DataDef::new(vec![Schema::new(
            "s",
            vec![Table::new("only", audit())],
        )]);
        let before = data.clone();
        compact_fixed_columns(&mut data);
        assert_eq!(data, before);
    }
}
