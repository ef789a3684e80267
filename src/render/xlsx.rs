//! Spreadsheet documentation
//!
//! One sheet per schema. Row 1 holds the column captions in B..I; each table
//! starts with a title row (`name - title - description` in column A),
//! followed by one row per column and then the fixed columns in a distinct
//! font. [`read_xlsx`] reads the same layout back.
//!
//! In simple mode a single "Tables Description" sheet lists one row per
//! table with its key columns instead.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};
use tracing::debug;

use super::{normalize_for_output, Renderer};
use crate::config::OutputConfig;
use crate::error::{Result, SchemaError};
use crate::model::{Column, DataDef, Schema, Table};

const HEADINGS: [&str; 8] = [
    "Column Name",
    "Title",
    "Data Type",
    "Identity",
    "Not Null",
    "Default",
    "Foreign Key",
    "Description",
];
const WIDTHS: [f64; 9] = [2.0, 20.0, 20.0, 15.0, 8.0, 8.0, 10.0, 25.0, 50.0];
const LAST_COL: u16 = HEADINGS.len() as u16;

const HEADER_FILL: u32 = 0xB4C7DC;
const TABLE_FILL: u32 = 0xDEE6EF;
const FIXED_FONT: u32 = 0x205375;

const TITLE_SEPARATOR: &str = " - ";

const SIMPLE_SHEET: &str = "Tables Description";
const SIMPLE_HEADINGS: [&str; 4] = ["Table ID", "Title Name", "Table Description", "Key Data Item"];
const SIMPLE_WIDTHS: [f64; 4] = [8.0, 15.0, 60.0, 30.0];
const ROW_HEIGHT: f64 = 15.0;

#[derive(Debug, Clone, Default)]
pub struct XlsxRenderer {
    config: OutputConfig,
    simple: bool,
}

impl XlsxRenderer {
    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            config: config.clone(),
            simple: config.simple_spreadsheet,
        }
    }

    /// Summary sheet instead of the full column listing
    pub fn with_simple(mut self, simple: bool) -> Self {
        self.simple = simple;
        self
    }
}

impl Renderer for XlsxRenderer {
    fn render(&self, data: &DataDef) -> Result<Vec<u8>> {
        let written = if self.simple {
            // key columns must stay in their tables, so no compaction here
            write_simple_workbook(data)
        } else {
            write_workbook(&normalize_for_output(data, &self.config))
        };
        written.map_err(|e| SchemaError::render("spreadsheet", e))
    }
}

struct Styles {
    header: Format,
    table: Format,
    fixed: Format,
    wrap: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(HEADER_FILL)),
            table: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(TABLE_FILL)),
            fixed: Format::new().set_font_color(Color::RGB(FIXED_FONT)),
            wrap: Format::new().set_text_wrap(),
        }
    }
}

fn write_workbook(data: &DataDef) -> std::result::Result<Vec<u8>, XlsxError> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();

    for schema in &data.schemas {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&schema.name)?;
        write_sheet(sheet, schema, &data.fixed, &styles)?;
    }
    if data.schemas.is_empty() {
        workbook.add_worksheet();
    }

    workbook.save_to_buffer()
}

fn write_sheet(
    sheet: &mut Worksheet,
    schema: &Schema,
    fixed: &[Column],
    styles: &Styles,
) -> std::result::Result<(), XlsxError> {
    for (col, width) in WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }

    sheet.write_blank(0, 0, &styles.header)?;
    for (i, heading) in HEADINGS.iter().enumerate() {
        sheet.write_string_with_format(0, i as u16 + 1, *heading, &styles.header)?;
    }

    let mut row: u32 = 1;
    for table in &schema.tables {
        sheet.write_string_with_format(row, 0, table.caption(), &styles.table)?;
        for col in 1..=LAST_COL {
            sheet.write_blank(row, col, &styles.table)?;
        }
        row += 1;

        for column in &table.columns {
            write_column(sheet, row, column, None)?;
            row += 1;
        }
        for column in fixed {
            write_column(sheet, row, column, Some(&styles.fixed))?;
            row += 1;
        }
    }
    Ok(())
}

// =============================================================================
// Summary sheet
// =============================================================================

/// One row per table under a row per schema: `T{(schema + 1) * 100 + table}`,
/// table name, description and the key columns, one per line.
fn write_simple_workbook(data: &DataDef) -> std::result::Result<Vec<u8>, XlsxError> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SIMPLE_SHEET)?;

    for (col, width) in SIMPLE_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }
    for (col, heading) in SIMPLE_HEADINGS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *heading, &styles.header)?;
    }

    let mut row: u32 = 1;
    for (s, schema) in data.schemas.iter().enumerate() {
        sheet.write_string_with_format(row, 0, &schema.name, &styles.table)?;
        for col in 1..SIMPLE_HEADINGS.len() as u16 {
            sheet.write_blank(row, col, &styles.table)?;
        }
        row += 1;

        for (t, table) in schema.tables.iter().enumerate() {
            sheet.write_string(row, 0, format!("T{}", (s + 1) * 100 + t))?;
            sheet.write_string(row, 1, &table.name)?;
            if !table.description.is_empty() {
                sheet.write_string(row, 2, &table.description)?;
            }
            let keys = key_data_items(table);
            if !keys.is_empty() {
                sheet.write_string_with_format(row, 3, keys.join("\n"), &styles.wrap)?;
                sheet.set_row_height(row, ROW_HEIGHT * keys.len() as f64)?;
            }
            row += 1;
        }
    }

    workbook.save_to_buffer()
}

/// `name (PK)` for key columns, `name (FK)` for foreign keys
fn key_data_items(table: &Table) -> Vec<String> {
    table
        .columns
        .iter()
        .filter_map(|c| {
            if c.is_primary_key() {
                Some(format!("{} (PK)", c.name))
            } else if !c.foreign_key.trim().is_empty() {
                Some(format!("{} (FK)", c.name))
            } else {
                None
            }
        })
        .collect()
}

fn column_cells(column: &Column) -> [&str; 8] {
    [
        &column.name,
        &column.title,
        &column.data_type,
        &column.identity,
        &column.not_null,
        &column.value,
        &column.foreign_key,
        &column.description,
    ]
}

fn write_column(
    sheet: &mut Worksheet,
    row: u32,
    column: &Column,
    format: Option<&Format>,
) -> std::result::Result<(), XlsxError> {
    for (i, value) in column_cells(column).into_iter().enumerate() {
        let col = i as u16 + 1;
        match format {
            Some(format) if value.is_empty() => {
                sheet.write_blank(row, col, format)?;
            }
            Some(format) => {
                sheet.write_string_with_format(row, col, value, format)?;
            }
            None if value.is_empty() => {}
            None => {
                sheet.write_string(row, col, value)?;
            }
        }
    }
    Ok(())
}

// =============================================================================
// Reader
// =============================================================================

/// Read a workbook written in the layout above
pub fn read_xlsx(path: &Path) -> Result<DataDef> {
    let bytes = std::fs::read(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_xlsx(&bytes).map_err(|e| SchemaError::parse(format!("{}: {}", path.display(), e)))
}

/// Parse workbook bytes. Fixed columns come back as ordinary columns of each
/// table; they are indistinguishable from declared ones in the cell data.
pub fn parse_xlsx(bytes: &[u8]) -> Result<DataDef> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| SchemaError::parse(format!("cannot open workbook: {}", e)))?;

    let mut data = DataDef::default();
    for sheet in workbook.sheet_names().to_owned() {
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| SchemaError::parse(format!("sheet '{}': {}", sheet, e)))?;
        let (first_row, first_col) = range.start().unwrap_or((0, 0));

        let mut schema = Schema::new(sheet.clone(), Vec::new());
        for (offset, cells) in range.rows().enumerate() {
            let row = first_row as usize + offset;
            if row == 0 {
                continue;
            }
            let cell = |col: usize| -> String {
                col.checked_sub(first_col as usize)
                    .and_then(|i| cells.get(i))
                    .map(cell_text)
                    .unwrap_or_default()
            };

            let title = cell(0);
            if !title.is_empty() {
                schema.tables.push(table_from_title(&title));
                continue;
            }

            let values: Vec<String> = (1..=LAST_COL as usize).map(&cell).collect();
            if values.iter().all(String::is_empty) {
                continue;
            }
            let table = schema.tables.last_mut().ok_or_else(|| {
                SchemaError::parse(format!(
                    "sheet '{}' row {}: column row before any table title",
                    sheet,
                    row + 1
                ))
            })?;
            table.columns.push(column_from_cells(values));
        }
        debug!(sheet = %sheet, tables = schema.tables.len(), "read sheet");
        data.schemas.push(schema);
    }
    Ok(data)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn table_from_title(text: &str) -> Table {
    let parts: Vec<&str> = text.split(TITLE_SEPARATOR).map(str::trim).collect();
    let mut table = Table::new(parts[0], Vec::new());
    match parts.len() {
        1 => {}
        2 => table.description = parts[1].to_string(),
        _ => {
            table.title = parts[1].to_string();
            table.description = parts[2..].join(TITLE_SEPARATOR);
        }
    }
    table
}

fn column_from_cells(values: Vec<String>) -> Column {
    let mut cells = values.into_iter();
    let mut next = || cells.next().unwrap_or_default();
    Column {
        name: next(),
        title: next(),
        data_type: next(),
        identity: next(),
        not_null: next(),
        value: next(),
        foreign_key: next(),
        description: next(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataDef {
        let mut users = Table::new(
            "users",
            vec![
                Column::new("id", "int").with_identity("Y").with_not_null(),
                Column::new("email", "varchar(200)"),
            ],
        );
        users.title = "Users".to_string();
        users.description = "Registered accounts".to_string();
        let mut orders = Table::new(
            "orders",
            vec![
                Column::new("id", "int").with_identity("Y"),
                Column::new("user_id", "int").with_foreign_key("users.id"),
            ],
        );
        orders.description = "Purchases".to_string();

        let mut data = DataDef::new(vec![Schema::new("shop", vec![users, orders])]);
        data.fixed = vec![Column::new("created_at", "datetime")];
        data
    }

    #[test]
    fn test_table_from_title() {
        let table = table_from_title("orders");
        assert_eq!((table.name.as_str(), table.title.as_str()), ("orders", ""));

        let table = table_from_title("orders - Purchases");
        assert_eq!(table.description, "Purchases");
        assert_eq!(table.title, "");

        let table = table_from_title("orders - Orders - All purchases - incl. refunds");
        assert_eq!(table.title, "Orders");
        assert_eq!(table.description, "All purchases - incl. refunds");
    }

    #[test]
    fn test_write_then_read() {
        let data = sample();
        let bytes = XlsxRenderer::default().render(&data).unwrap();
        let read = parse_xlsx(&bytes).unwrap();

        let mut expected = data.clone();
        crate::fixed::expand_fixed_columns(&mut expected);
        assert_eq!(read, expected);
    }

    #[test]
    fn test_sheet_per_schema() {
        let mut data = sample();
        data.schemas
            .push(Schema::new("audit", vec![Table::new("events", vec![Column::new("id", "int")])]));
        let bytes = XlsxRenderer::default().render(&data).unwrap();
        let read = parse_xlsx(&bytes).unwrap();
        let names: Vec<_> = read.schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["shop", "audit"]);
    }

    #[test]
    fn test_simple_summary_sheet() {
        let mut data = sample();
        data.schemas
            .push(Schema::new("audit", vec![Table::new("events", vec![Column::new("id", "int")])]));
        let bytes = XlsxRenderer::default()
            .with_simple(true)
            .render(&data)
            .unwrap();

        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SIMPLE_SHEET.to_string()]);
        let range = workbook.worksheet_range(SIMPLE_SHEET).unwrap();
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|r| r.iter().map(cell_text).collect())
            .collect();

        assert_eq!(rows[0], SIMPLE_HEADINGS);
        assert_eq!(rows[1][0], "shop");
        assert_eq!(rows[2][..3], ["T100", "users", "Registered accounts"]);
        assert_eq!(rows[2][3], "id (PK)");
        assert_eq!(rows[3][..3], ["T101", "orders", "Purchases"]);
        assert_eq!(rows[3][3], "id (PK)\nuser_id (FK)");
        assert_eq!(rows[4][0], "audit");
        assert_eq!(rows[5][..2], ["T200", "events"]);
        assert_eq!(rows[5][3], "");
        assert_eq!(rows.len(), 6);
    }

    #[test]
    fn test_simple_mode_from_config() {
        let config = OutputConfig {
            simple_spreadsheet: true,
            ..OutputConfig::default()
        };
        let bytes = XlsxRenderer::from_config(&config).render(&sample()).unwrap();
        let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SIMPLE_SHEET.to_string()]);
    }

    #[test]
    fn test_column_row_before_title_is_parse_error() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("shop").unwrap();
        for (i, heading) in HEADINGS.iter().enumerate() {
            sheet.write_string(0, i as u16 + 1, *heading).unwrap();
        }
        sheet.write_string(1, 1, "id").unwrap();
        sheet.write_string(1, 3, "int").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let err = parse_xlsx(&bytes).unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
        assert!(err.to_string().contains("column row before any table title"));
    }

    #[test]
    fn test_invalid_sheet_name_is_render_error() {
        let data = DataDef::new(vec![Schema::new("bad[name]", vec![])]);
        let err = XlsxRenderer::default().render(&data).unwrap_err();
        assert!(matches!(err, SchemaError::Render { .. }));
    }
}
