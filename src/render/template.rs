//! Template output
//!
//! Renders a Jinja-style template (minijinja) against the model. The context
//! exposes:
//!
//! - `schemas`: each with `name`, `description` and `tables`; tables carry
//!   `columns`, `primary_keys` (in key order) and `references`; columns carry
//!   every attribute plus `is_primary_key`, `is_not_null`, `is_unique` and
//!   `is_indexed`
//! - `fixed`: the fixed columns, if not expanded
//! - `generated_at`: local time of the run
//! - `params`: extra string parameters such as `new_name`
//!
//! Filters: `to_camel`, `to_lower_camel`, `to_snake`, `to_java_type`,
//! `to_plural`, `to_singular`.

use std::collections::BTreeMap;
use std::path::Path;

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use minijinja::Environment;
use serde::Serialize;
use tracing::debug;

use super::Renderer;
use crate::error::{Result, SchemaError};
use crate::model::{Column, DataDef, Reference, Schema, Table};

#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    name: String,
    source: String,
    params: BTreeMap<String, String>,
}

impl TemplateRenderer {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.display().to_string(), source))
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render_to_string(&self, data: &DataDef) -> Result<String> {
        let context = TemplateContext::build(data, &self.params)?;
        let mut env = environment();
        let text = env
            .add_template_owned(self.name.clone(), self.source.clone())
            .and_then(|()| env.get_template(&self.name)?.render(&context))
            .map_err(|e| SchemaError::render(self.name.clone(), e))?;
        debug!(template = %self.name, bytes = text.len(), "rendered template");
        Ok(text)
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, data: &DataDef) -> Result<Vec<u8>> {
        self.render_to_string(data).map(String::into_bytes)
    }
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.add_filter("to_camel", |value: String| value.to_upper_camel_case());
    env.add_filter("to_lower_camel", |value: String| value.to_lower_camel_case());
    env.add_filter("to_snake", |value: String| value.to_snake_case());
    env.add_filter("to_java_type", |value: String| to_java_type(&value));
    env.add_filter("to_plural", |value: String| pluralizer::pluralize(&value, 2, false));
    env.add_filter("to_singular", |value: String| pluralizer::pluralize(&value, 1, false));
    env
}

/// Java type for a SQL data type, by substring of the lower-cased type
pub fn to_java_type(data_type: &str) -> String {
    const MAPPING: &[(&str, &str)] = &[
        ("varbinary", "byte[]"),
        ("bigint", "Long"),
        ("smallint", "Short"),
        ("tinyint", "Byte"),
        ("mediumint", "Integer"),
        ("int", "Integer"),
        ("bit", "Boolean"),
        ("datetime", "LocalDateTime"),
        ("timestamp", "Timestamp"),
        ("date", "LocalDate"),
        ("time", "LocalTime"),
        ("decimal", "BigDecimal"),
        ("numeric", "BigDecimal"),
        ("float", "Double"),
        ("double", "Double"),
        ("text", "String"),
        ("char", "String"),
    ];
    let lower = data_type.to_lowercase();
    MAPPING
        .iter()
        .find(|(sql, _)| lower.contains(sql))
        .map(|(_, java)| java.to_string())
        .unwrap_or_else(|| format!("Unknown Type: {}", data_type))
}

// =============================================================================
// Context
// =============================================================================

#[derive(Serialize)]
struct TemplateContext<'a> {
    schemas: Vec<SchemaView<'a>>,
    fixed: Vec<ColumnView<'a>>,
    generated_at: String,
    params: &'a BTreeMap<String, String>,
}

#[derive(Serialize)]
struct SchemaView<'a> {
    name: &'a str,
    description: &'a str,
    tables: Vec<TableView<'a>>,
}

#[derive(Serialize)]
struct TableView<'a> {
    name: &'a str,
    title: &'a str,
    description: &'a str,
    columns: Vec<ColumnView<'a>>,
    primary_keys: Vec<ColumnView<'a>>,
    references: &'a [Reference],
}

#[derive(Serialize)]
struct ColumnView<'a> {
    #[serde(flatten)]
    column: &'a Column,
    is_primary_key: bool,
    is_not_null: bool,
    is_unique: bool,
    is_indexed: bool,
}

impl<'a> TemplateContext<'a> {
    fn build(data: &'a DataDef, params: &'a BTreeMap<String, String>) -> Result<Self> {
        Ok(Self {
            schemas: data
                .schemas
                .iter()
                .map(SchemaView::build)
                .collect::<Result<_>>()?,
            fixed: data.fixed.iter().map(ColumnView::new).collect(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            params,
        })
    }
}

impl<'a> SchemaView<'a> {
    fn build(schema: &'a Schema) -> Result<Self> {
        Ok(Self {
            name: &schema.name,
            description: &schema.description,
            tables: schema
                .tables
                .iter()
                .map(TableView::build)
                .collect::<Result<_>>()?,
        })
    }
}

impl<'a> TableView<'a> {
    fn build(table: &'a Table) -> Result<Self> {
        Ok(Self {
            name: &table.name,
            title: &table.title,
            description: &table.description,
            columns: table.columns.iter().map(ColumnView::new).collect(),
            primary_keys: table
                .primary_key_columns()?
                .into_iter()
                .map(ColumnView::new)
                .collect(),
            references: &table.references,
        })
    }
}

impl<'a> ColumnView<'a> {
    fn new(column: &'a Column) -> Self {
        Self {
            column,
            is_primary_key: column.is_primary_key(),
            is_not_null: column.is_not_null(),
            is_unique: column.is_unique(),
            is_indexed: column.is_indexed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::link_references;

    fn shop() -> DataDef {
        let mut data = DataDef::new(vec![Schema::new(
            "shop",
            vec![
                Table::new(
                    "user_accounts",
                    vec![
                        Column::new("account_id", "bigint").with_identity("2"),
                        Column::new("region", "char(2)").with_identity("1"),
                        Column::new("created_at", "datetime").with_not_null(),
                    ],
                ),
                Table::new(
                    "orders",
                    vec![Column::new("account_id", "bigint").with_foreign_key("user_accounts.account_id")],
                ),
            ],
        )]);
        link_references(&mut data);
        data
    }

    #[test]
    fn test_java_types() {
        assert_eq!(to_java_type("BIGINT"), "Long");
        assert_eq!(to_java_type("int"), "Integer");
        assert_eq!(to_java_type("datetime"), "LocalDateTime");
        assert_eq!(to_java_type("date"), "LocalDate");
        assert_eq!(to_java_type("timestamp"), "Timestamp");
        assert_eq!(to_java_type("time"), "LocalTime");
        assert_eq!(to_java_type("varchar(20)"), "String");
        assert_eq!(to_java_type("varbinary(16)"), "byte[]");
        assert_eq!(to_java_type("decimal(10,2)"), "BigDecimal");
        assert_eq!(to_java_type("geometry"), "Unknown Type: geometry");
    }

    #[test]
    fn test_filters_and_columns() {
        let template = "{% for t in schemas[0].tables %}{{ t.name | to_camel }}:\
{% for c in t.columns %} {{ c.name | to_lower_camel }} {{ c.data_type | to_java_type }}\
{% if c.is_not_null %}!{% endif %}{% endfor %};{% endfor %}";
        let text = TemplateRenderer::new("entities", template)
            .render_to_string(&shop())
            .unwrap();
        assert_eq!(
            text,
            "UserAccounts: accountId Long region String createdAt LocalDateTime!;\
Orders: accountId Long;"
        );
    }

    #[test]
    fn test_inflection_filters() {
        let template = "{{ 'order' | to_plural }} {{ 'category' | to_plural }} {{ 'box' | to_plural }}|\
{{ 'users' | to_singular }} {{ 'categories' | to_singular }}";
        let text = TemplateRenderer::new("inflect", template)
            .render_to_string(&shop())
            .unwrap();
        assert_eq!(text, "orders categories boxes|user category");
    }

    #[test]
    fn test_primary_keys_and_references() {
        let template = "{% set t = schemas[0].tables[0] %}\
{{ t.primary_keys | map(attribute='name') | join(',') }}|\
{% for r in t.references %}{{ r.column }}<-{{ r.foreign[0].table }}.{{ r.foreign[0].column }}{% endfor %}";
        let text = TemplateRenderer::new("keys", template)
            .render_to_string(&shop())
            .unwrap();
        assert_eq!(text, "region,account_id|account_id<-orders.account_id");
    }

    #[test]
    fn test_params() {
        let text = TemplateRenderer::new("p", "{{ params.new_name | to_snake }}")
            .with_param("new_name", "DisplayName")
            .render_to_string(&shop())
            .unwrap();
        assert_eq!(text, "display_name");
    }

    #[test]
    fn test_syntax_error_is_render_error() {
        let err = TemplateRenderer::new("broken", "{% for %}")
            .render_to_string(&shop())
            .unwrap_err();
        assert!(matches!(err, SchemaError::Render { ref target, .. } if target == "broken"));
    }

    #[test]
    fn test_invalid_identity_propagates() {
        let data = DataDef::new(vec![Schema::new(
            "s",
            vec![Table::new("t", vec![Column::new("id", "int").with_identity("1a")])],
        )]);
        let err = TemplateRenderer::new("t", "").render_to_string(&data).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidIdentity { .. }));
    }
}
