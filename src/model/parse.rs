//! Schema source parser
//!
//! Parses the YAML source format into a [`DataDef`]. Columns may be written
//! either as a record with short keys (`{na: id, ty: int, id: Y}`) or as a
//! positional sequence (`[id, int, Y]`); both produce the same [`Column`].

use std::path::Path;

use std::fmt;

use serde::de::value::MapAccessDeserializer;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use tracing::debug;

use super::{Column, DataDef, Schema, Table};
use crate::error::{Result, SchemaError};

/// Positional column slots, in order
pub const POSITIONAL_KEYS: [&str; 12] = [
    "na", "ty", "id", "nu", "un", "va", "fk", "cd", "tt", "in", "dc", "cm",
];

const DEFAULT_SCHEMA_NAME: &str = "Schema";

/// Parse a YAML document into a data definition
pub fn parse_yaml(yaml: &str) -> Result<DataDef> {
    let raw: RawDataDef = serde_yaml::from_str(yaml)?;
    convert_data_def(raw)
}

/// Read and parse a YAML schema file
pub fn load_file(path: &Path) -> Result<DataDef> {
    let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let data = parse_yaml(&content).map_err(|e| match e {
        SchemaError::Parse { message } => {
            SchemaError::parse(format!("{}: {}", path.display(), message))
        }
        other => other,
    })?;
    debug!(
        path = %path.display(),
        tables = data.table_count(),
        "loaded schema file"
    );
    Ok(data)
}

fn convert_data_def(raw: RawDataDef) -> Result<DataDef> {
    let fixed = raw
        .fixed
        .into_iter()
        .enumerate()
        .map(|(i, c)| convert_column(c, &format!("fixed[{}]", i)))
        .collect::<Result<Vec<_>>>()?;

    let schemas = raw
        .schemas
        .into_iter()
        .enumerate()
        .map(|(i, s)| convert_schema(s, &format!("schemas[{}]", i)))
        .collect::<Result<Vec<_>>>()?;

    Ok(DataDef { fixed, schemas })
}

fn convert_schema(raw: RawSchema, path: &str) -> Result<Schema> {
    let tables = raw
        .tables
        .into_iter()
        .enumerate()
        .map(|(i, t)| convert_table(t, &format!("{}.tables[{}]", path, i)))
        .collect::<Result<Vec<_>>>()?;

    Ok(Schema {
        name: raw
            .name
            .map(RawText::into_string)
            .unwrap_or_else(|| DEFAULT_SCHEMA_NAME.to_string()),
        description: string_or_empty(raw.description),
        tables,
    })
}

fn convert_table(raw: RawTable, path: &str) -> Result<Table> {
    let name = raw
        .name
        .map(RawText::into_string)
        .ok_or_else(|| SchemaError::parse(format!("{}: missing table name", path)))?;

    let columns = raw
        .columns
        .into_iter()
        .enumerate()
        .map(|(i, c)| convert_column(c, &format!("{}.columns[{}]", path, i)))
        .collect::<Result<Vec<_>>>()?;

    Ok(Table {
        name,
        title: string_or_empty(raw.title),
        description: string_or_empty(raw.description),
        columns,
        references: Vec::new(),
    })
}

fn convert_column(raw: RawColumn, path: &str) -> Result<Column> {
    let record = match raw {
        RawColumn::Positional(values) => positional_to_record(values, path)?,
        RawColumn::Record(record) => record,
    };

    let name = record
        .name
        .map(RawText::into_string)
        .ok_or_else(|| SchemaError::parse(format!("{}: missing column name", path)))?;
    let data_type = record.data_type.map(RawText::into_string).ok_or_else(|| {
        SchemaError::parse(format!("{}: missing data type of column '{}'", path, name))
    })?;

    Ok(Column {
        name,
        data_type,
        identity: string_or_empty(record.identity),
        not_null: string_or_empty(record.not_null),
        unique: string_or_empty(record.unique),
        value: string_or_empty(record.value),
        foreign_key: string_or_empty(record.foreign_key),
        cardinality: string_or_empty(record.cardinality),
        title: string_or_empty(record.title),
        index: string_or_empty(record.index),
        description: string_or_empty(record.description),
        computed: string_or_empty(record.computed),
    })
}

fn positional_to_record(values: Vec<Option<RawText>>, path: &str) -> Result<RawColumnRecord> {
    if values.len() > POSITIONAL_KEYS.len() {
        return Err(SchemaError::parse(format!(
            "{}: positional column has {} values, at most {} allowed",
            path,
            values.len(),
            POSITIONAL_KEYS.len()
        )));
    }

    let mut slots = values.into_iter();
    let mut next = || slots.next().flatten();
    Ok(RawColumnRecord {
        name: next(),
        data_type: next(),
        identity: next(),
        not_null: next(),
        unique: next(),
        value: next(),
        foreign_key: next(),
        cardinality: next(),
        title: next(),
        index: next(),
        description: next(),
        computed: next(),
    })
}

fn string_or_empty(value: Option<RawText>) -> String {
    value.map(RawText::into_string).unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw YAML structures (serde only)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawDataDef {
    #[serde(default)]
    fixed: Vec<RawColumn>,
    #[serde(default)]
    schemas: Vec<RawSchema>,
}

#[derive(Debug, Deserialize)]
struct RawSchema {
    name: Option<RawText>,
    #[serde(alias = "desc")]
    description: Option<RawText>,
    #[serde(default)]
    tables: Vec<RawTable>,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    name: Option<RawText>,
    title: Option<RawText>,
    #[serde(alias = "desc")]
    description: Option<RawText>,
    #[serde(default)]
    columns: Vec<RawColumn>,
}

/// A column as written: a positional list or a keyed record.
///
/// Deserialized by hand so scalars stream straight into [`RawText`] instead
/// of being buffered and re-typed.
#[derive(Debug)]
enum RawColumn {
    Positional(Vec<Option<RawText>>),
    Record(RawColumnRecord),
}

impl<'de> Deserialize<'de> for RawColumn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(RawColumnVisitor)
    }
}

struct RawColumnVisitor;

impl<'de> Visitor<'de> for RawColumnVisitor {
    type Value = RawColumn;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a column record or a positional column list")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<RawColumn, A::Error> {
        let mut values = Vec::new();
        while let Some(value) = seq.next_element::<Option<RawText>>()? {
            values.push(value);
        }
        Ok(RawColumn::Positional(values))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<RawColumn, A::Error> {
        RawColumnRecord::deserialize(MapAccessDeserializer::new(map)).map(RawColumn::Record)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawColumnRecord {
    #[serde(rename = "na", alias = "name")]
    name: Option<RawText>,
    #[serde(rename = "ty", alias = "type")]
    data_type: Option<RawText>,
    #[serde(rename = "id", alias = "identity")]
    identity: Option<RawText>,
    #[serde(rename = "nu", alias = "not_null")]
    not_null: Option<RawText>,
    #[serde(rename = "un", alias = "unique")]
    unique: Option<RawText>,
    #[serde(rename = "va", alias = "value", alias = "default")]
    value: Option<RawText>,
    #[serde(rename = "fk", alias = "foreign_key")]
    foreign_key: Option<RawText>,
    #[serde(rename = "cd", alias = "cardinality")]
    cardinality: Option<RawText>,
    #[serde(rename = "tt", alias = "title")]
    title: Option<RawText>,
    #[serde(rename = "in", alias = "index")]
    index: Option<RawText>,
    #[serde(rename = "dc", alias = "description")]
    description: Option<RawText>,
    #[serde(rename = "cm", alias = "computed")]
    computed: Option<RawText>,
}

/// Scalar text exactly as authored, so `va: 0.50` stays `0.50`.
/// YAML booleans become the `Y`/`N` flags.
#[derive(Debug, Clone)]
struct RawText(String);

impl RawText {
    fn into_string(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for RawText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_str(RawTextVisitor)
    }
}

struct RawTextVisitor;

impl<'de> Visitor<'de> for RawTextVisitor {
    type Value = RawText;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar value")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<RawText, E> {
        let text = match value {
            "true" | "True" | "TRUE" => "Y",
            "false" | "False" | "FALSE" => "N",
            other => other,
        };
        Ok(RawText(text.to_string()))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<RawText, E> {
        Ok(RawText(if value { "Y" } else { "N" }.to_string()))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<RawText, E> {
        Ok(RawText(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<RawText, E> {
        Ok(RawText(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<RawText, E> {
        Ok(RawText(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_schema() {
        let yaml = r#"
fixed:
  - {na: created_at, ty: datetime, nu: Y}
schemas:
  - name: sales
    description: Sales data
    tables:
      - name: orders
        title: Orders
        description: Customer orders
        columns:
          - {na: id, ty: int, id: Y}
          - {na: customer_id, ty: int, fk: customers.id, cd: "*:1"}
"#;
        let data = parse_yaml(yaml).unwrap();
        assert_eq!(data.fixed.len(), 1);
        assert_eq!(data.fixed[0].not_null, "Y");

        let schema = &data.schemas[0];
        assert_eq!(schema.name, "sales");
        assert_eq!(schema.description, "Sales data");

        let orders = &schema.tables[0];
        assert_eq!(orders.title, "Orders");
        assert_eq!(orders.columns.len(), 2);
        assert_eq!(orders.columns[1].foreign_key, "customers.id");
        assert_eq!(orders.columns[1].cardinality, "*:1");
        assert!(orders.references.is_empty());
    }

    #[test]
    fn test_positional_matches_record() {
        let yaml = r#"
schemas:
  - name: s
    tables:
      - name: t
        columns:
          - {na: code, ty: varchar(10), id: 1, nu: Y, va: "'X'", dc: Code}
          - [code, varchar(10), 1, Y, ~, "'X'", ~, ~, ~, ~, Code]
"#;
        let data = parse_yaml(yaml).unwrap();
        let columns = &data.schemas[0].tables[0].columns;
        assert_eq!(columns[0], columns[1]);
        assert_eq!(columns[1].identity, "1");
        assert_eq!(columns[1].value, "'X'");
        assert_eq!(columns[1].description, "Code");
    }

    #[test]
    fn test_short_positional() {
        let data = parse_yaml("fixed:\n  - [updated_at, datetime]\n").unwrap();
        assert_eq!(data.fixed[0].name, "updated_at");
        assert_eq!(data.fixed[0].data_type, "datetime");
        assert_eq!(data.fixed[0].identity, "");
    }

    #[test]
    fn test_long_keys_and_legacy_desc() {
        let yaml = r#"
schemas:
  - name: s
    desc: legacy description
    tables:
      - name: t
        desc: table description
        columns:
          - {name: id, type: int, identity: Y, not_null: true, default: 0}
"#;
        let data = parse_yaml(yaml).unwrap();
        assert_eq!(data.schemas[0].description, "legacy description");
        let table = &data.schemas[0].tables[0];
        assert_eq!(table.description, "table description");
        assert_eq!(table.columns[0].not_null, "Y");
        assert_eq!(table.columns[0].value, "0");
    }

    #[test]
    fn test_scalars_keep_authored_text() {
        let yaml = r#"
fixed:
  - {na: price, ty: "decimal(10,2)", va: 0.50, tt: 1.10, un: true, in: false}
  - [rate, float, ~, ~, ~, 1.0e3]
"#;
        let data = parse_yaml(yaml).unwrap();
        let price = &data.fixed[0];
        assert_eq!(price.value, "0.50");
        assert_eq!(price.title, "1.10");
        assert_eq!(price.unique, "Y");
        assert_eq!(price.index, "N");
        assert_eq!(data.fixed[1].value, "1.0e3");
    }

    #[test]
    fn test_nested_value_is_rejected() {
        let err = parse_yaml("fixed:\n  - {na: a, ty: [int]}\n").unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
    }

    #[test]
    fn test_default_schema_name() {
        let data = parse_yaml("schemas:\n  - tables: []\n").unwrap();
        assert_eq!(data.schemas[0].name, "Schema");
    }

    #[test]
    fn test_missing_table_name() {
        let yaml = "schemas:\n  - name: s\n    tables:\n      - columns: []\n";
        let err = parse_yaml(yaml).unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
        assert!(err.to_string().contains("schemas[0].tables[0]: missing table name"));
    }

    #[test]
    fn test_missing_column_name_and_type() {
        let yaml = "schemas:\n  - tables:\n      - name: t\n        columns:\n          - {ty: int}\n";
        let err = parse_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("missing column name"));

        let yaml = "schemas:\n  - tables:\n      - name: t\n        columns:\n          - [id]\n";
        let err = parse_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("missing data type of column 'id'"));
    }

    #[test]
    fn test_empty_type_is_left_to_verifier() {
        let yaml = "schemas:\n  - tables:\n      - name: t\n        columns:\n          - {na: id, ty: \"\"}\n";
        let data = parse_yaml(yaml).unwrap();
        assert_eq!(data.schemas[0].tables[0].columns[0].data_type, "");
    }

    #[test]
    fn test_too_many_positional_values() {
        let yaml = "fixed:\n  - [a, b, c, d, e, f, g, h, i, j, k, l, m]\n";
        let err = parse_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("at most 12"));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = parse_yaml("schemas: [unclosed").unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
    }
}
