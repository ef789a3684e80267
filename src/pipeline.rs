//! Load and prepare a model for output
//!
//! `load` parses a source file and links references. `prepare` expands fixed
//! columns, verifies the result and applies the selection. Every command goes
//! through these two steps before handing the model to a renderer.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, SchemaError};
use crate::filter::{filter, Selection};
use crate::fixed::expand_fixed_columns;
use crate::link::link_references;
use crate::model::{load_file, DataDef};
use crate::render::{extension, xlsx::read_xlsx};
use crate::verify::verify;

/// Parse a schema source and link its references.
///
/// `.xlsx` files are read as spreadsheets, `.yml`/`.yaml` as YAML. Other
/// extensions and database URLs are rejected.
pub fn load(path: &Path) -> Result<DataDef> {
    let source = path.to_string_lossy();
    if source.contains("://") {
        return Err(SchemaError::UnsupportedSource(format!(
            "{}: reading a database catalog is not supported",
            source
        )));
    }

    let mut data = match extension(path).as_deref() {
        Some("xlsx") => read_xlsx(path)?,
        Some("yml" | "yaml") => load_file(path)?,
        _ => {
            return Err(SchemaError::UnsupportedSource(format!(
                "{}: expected a .yml, .yaml or .xlsx file",
                source
            )))
        }
    };
    link_references(&mut data);
    info!(
        path = %path.display(),
        schemas = data.schemas.len(),
        tables = data.table_count(),
        "loaded schema"
    );
    Ok(data)
}

/// Expand fixed columns, verify, then filter.
///
/// Verification runs on the whole expanded model so every problem is
/// reported, including in tables the selection leaves out.
pub fn prepare(mut data: DataDef, selection: &Selection) -> Result<DataDef> {
    expand_fixed_columns(&mut data);

    let diagnostics = verify(&data);
    if !diagnostics.is_empty() {
        return Err(SchemaError::Validation { diagnostics });
    }
    debug!("verification passed");

    if selection.is_all() {
        return Ok(data);
    }
    filter(&data, selection)
}

/// [`load`] followed by [`prepare`]
pub fn load_selected(path: &Path, selection: &Selection) -> Result<DataDef> {
    prepare(load(path)?, selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_yaml;

    const SHOP: &str = r#"
fixed:
  - {na: created_at, ty: datetime, nu: Y}
schemas:
  - name: shop
    tables:
      - name: users
        columns:
          - {na: id, ty: int, id: Y}
      - name: orders
        columns:
          - {na: id, ty: int, id: Y}
          - {na: user_id, ty: int, fk: users.id}
"#;

    #[test]
    fn test_prepare_expands_and_filters() {
        let data = parse_yaml(SHOP).unwrap();
        let prepared = prepare(data, &Selection::tables("users")).unwrap();
        assert_eq!(prepared.table_count(), 1);
        assert!(prepared.fixed.is_empty());
        assert!(prepared.find_table("users").unwrap().has_column("created_at"));
    }

    #[test]
    fn test_prepare_reports_all_problems() {
        let yaml = SHOP.replace("fk: users.id", "fk: people.id").replace("ty: datetime", "ty: \"\"");
        let err = prepare(parse_yaml(&yaml).unwrap(), &Selection::all()).unwrap_err();
        match err {
            SchemaError::Validation { diagnostics } => {
                // the empty fixed type shows up once per table after expansion
                assert_eq!(diagnostics.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_database_url_rejected() {
        let err = load(Path::new("mysql://root@localhost/shop")).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedSource(_)));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        for name in ["schema.json", "schema"] {
            let err = load(Path::new(name)).unwrap_err();
            assert!(matches!(err, SchemaError::UnsupportedSource(_)), "{name}");
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load(Path::new("does/not/exist.yml")).unwrap_err();
        assert!(matches!(err, SchemaError::Read { .. }));
    }
}
