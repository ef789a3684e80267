//! DDL generation
//!
//! Each dialect/operation pair has a template named
//! `{dialect}-{operation}.template`. Built-in templates for `mysql` and
//! `mssql` are embedded in the binary; a configured template directory takes
//! precedence.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use include_dir::{include_dir, Dir};
use tracing::debug;

use super::{Renderer, TemplateRenderer};
use crate::error::{Result, SchemaError};
use crate::model::DataDef;

static BUILTIN_TEMPLATES: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/templates/sql");

const TEMPLATE_EXTENSION: &str = "template";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum DdlOperation {
    CreateTable,
    DropTable,
    AddColumn,
    DropColumn,
    RenameColumn,
    ModifyColumn,
    CreateIndex,
    DropIndex,
}

impl DdlOperation {
    pub const ALL: [DdlOperation; 8] = [
        Self::CreateTable,
        Self::DropTable,
        Self::AddColumn,
        Self::DropColumn,
        Self::RenameColumn,
        Self::ModifyColumn,
        Self::CreateIndex,
        Self::DropIndex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateTable => "create-table",
            Self::DropTable => "drop-table",
            Self::AddColumn => "add-column",
            Self::DropColumn => "drop-column",
            Self::RenameColumn => "rename-column",
            Self::ModifyColumn => "modify-column",
            Self::CreateIndex => "create-index",
            Self::DropIndex => "drop-index",
        }
    }

    pub fn template_name(&self, dialect: &str) -> String {
        format!("{}-{}.{}", dialect.to_lowercase(), self.as_str(), TEMPLATE_EXTENSION)
    }
}

impl fmt::Display for DdlOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DdlOperation {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| SchemaError::UnsupportedOutput(format!("unknown DDL operation '{}'", s)))
    }
}

/// Dialects with built-in templates
pub fn builtin_dialects() -> Vec<String> {
    let mut dialects: Vec<String> = BUILTIN_TEMPLATES
        .files()
        .filter_map(|f| f.path().file_name()?.to_str())
        .filter_map(|name| name.split_once('-').map(|(dialect, _)| dialect.to_string()))
        .collect();
    dialects.sort();
    dialects.dedup();
    dialects
}

/// Template text for `operation` in `dialect`, preferring `template_dir`
pub fn template_source(
    dialect: &str,
    operation: DdlOperation,
    template_dir: Option<&Path>,
) -> Result<String> {
    let name = operation.template_name(dialect);

    if let Some(dir) = template_dir {
        let path = dir.join(&name);
        if path.is_file() {
            debug!(template = %path.display(), "using template override");
            return std::fs::read_to_string(&path).map_err(|source| SchemaError::Read {
                path: path.clone(),
                source,
            });
        }
    }

    BUILTIN_TEMPLATES
        .get_file(&name)
        .and_then(|f| f.contents_utf8())
        .map(str::to_string)
        .ok_or_else(|| {
            SchemaError::UnsupportedOutput(format!(
                "no '{}' template for dialect '{}' (built-in dialects: {})",
                operation,
                dialect,
                builtin_dialects().join(", ")
            ))
        })
}

/// One DDL operation in one dialect over the selected tables and columns
#[derive(Debug, Clone)]
pub struct SqlRenderer {
    template: TemplateRenderer,
}

impl SqlRenderer {
    /// `new_name` is required by, and only used for, `rename-column`
    pub fn new(
        dialect: &str,
        operation: DdlOperation,
        new_name: Option<&str>,
        template_dir: Option<&Path>,
    ) -> Result<Self> {
        let source = template_source(dialect, operation, template_dir)?;
        let mut template = TemplateRenderer::new(operation.template_name(dialect), source);

        match (operation, new_name) {
            (DdlOperation::RenameColumn, Some(name)) if !name.trim().is_empty() => {
                template = template.with_param("new_name", name.trim());
            }
            (DdlOperation::RenameColumn, _) => {
                return Err(SchemaError::UnsupportedOutput(
                    "rename-column requires a new column name".to_string(),
                ));
            }
            _ => {}
        }
        Ok(Self { template })
    }
}

impl Renderer for SqlRenderer {
    fn render(&self, data: &DataDef) -> Result<Vec<u8>> {
        self.template.render(data)
    }
}
