//! Schema source writer
//!
//! Emits the YAML source format directly: block style for schemas and tables,
//! one flow mapping per column with the short keys in a fixed order. Scalars
//! are quoted only when YAML would read them back as something else, so `Y`
//! and `N` stay bare. Derived references are never written.

use super::{normalize_for_output, Renderer};
use crate::config::OutputConfig;
use crate::error::Result;
use crate::model::{Column, DataDef};

#[derive(Debug, Clone, Default)]
pub struct YamlRenderer {
    config: OutputConfig,
}

impl YamlRenderer {
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl Renderer for YamlRenderer {
    fn render(&self, data: &DataDef) -> Result<Vec<u8>> {
        Ok(to_yaml_string(&normalize_for_output(data, &self.config)).into_bytes())
    }
}

/// Write `data` in the source format, as is
pub fn to_yaml_string(data: &DataDef) -> String {
    let mut out = String::new();

    if !data.fixed.is_empty() {
        out.push_str("fixed:\n");
        for column in &data.fixed {
            out.push_str(&format!("  - {}\n", column_flow(column)));
        }
    }

    out.push_str("schemas:");
    if data.schemas.is_empty() {
        out.push_str(" []\n");
        return out;
    }
    out.push('\n');

    for schema in &data.schemas {
        out.push_str(&format!("  - name: {}\n", scalar(&schema.name)));
        if !schema.description.is_empty() {
            out.push_str(&format!("    description: {}\n", scalar(&schema.description)));
        }
        if schema.tables.is_empty() {
            out.push_str("    tables: []\n");
            continue;
        }
        out.push_str("    tables:\n");
        for table in &schema.tables {
            out.push_str(&format!("      - name: {}\n", scalar(&table.name)));
            if !table.title.is_empty() {
                out.push_str(&format!("        title: {}\n", scalar(&table.title)));
            }
            if !table.description.is_empty() {
                out.push_str(&format!("        description: {}\n", scalar(&table.description)));
            }
            if table.columns.is_empty() {
                out.push_str("        columns: []\n");
                continue;
            }
            out.push_str("        columns:\n");
            for column in &table.columns {
                out.push_str(&format!("          - {}\n", column_flow(column)));
            }
        }
    }
    out
}

/// `{na: id, ty: int, id: Y}`; empty optional fields are left out
fn column_flow(column: &Column) -> String {
    let fields = [
        ("na", &column.name),
        ("ty", &column.data_type),
        ("id", &column.identity),
        ("nu", &column.not_null),
        ("un", &column.unique),
        ("va", &column.value),
        ("fk", &column.foreign_key),
        ("cd", &column.cardinality),
        ("tt", &column.title),
        ("in", &column.index),
        ("dc", &column.description),
        ("cm", &column.computed),
    ];
    let parts: Vec<String> = fields
        .iter()
        .enumerate()
        .filter(|(i, (_, value))| *i < 2 || !value.is_empty())
        .map(|(_, (key, value))| format!("{}: {}", key, scalar(value)))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

/// Plain scalar when it reads back as the same string, double-quoted otherwise
fn scalar(value: &str) -> String {
    if needs_quotes(value) {
        quote(value)
    } else {
        value.to_string()
    }
}

fn needs_quotes(value: &str) -> bool {
    const INDICATORS: &[char] = &[
        '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%',
        '@', '`', '.', '+', '~',
    ];
    const FLOW_BREAKERS: &[char] = &[':', '#', ',', '[', ']', '{', '}'];
    const RESERVED: &[&str] = &["true", "false", "null", "yes", "no", "on", "off"];

    let Some(first) = value.chars().next() else {
        return true;
    };
    if value != value.trim() || INDICATORS.contains(&first) {
        return true;
    }
    if value.contains(FLOW_BREAKERS) || value.chars().any(char::is_control) {
        return true;
    }
    if RESERVED.contains(&value.to_ascii_lowercase().as_str()) {
        return true;
    }
    // only canonical integers survive a read as themselves
    if first.is_ascii_digit() {
        return value.parse::<i64>().map(|i| i.to_string() != value).unwrap_or(true);
    }
    false
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
