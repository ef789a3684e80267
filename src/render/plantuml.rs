//! Entity-relationship diagrams
//!
//! [`PlantUmlRenderer`] writes PlantUML text: one entity block per table and
//! one connector per foreign key. [`PlantUmlImageRenderer`] additionally runs
//! the PlantUML jar to turn that text into a PNG or SVG image.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;
use walkdir::WalkDir;

use super::{sibling, Renderer};
use crate::config::DiagramConfig;
use crate::error::{Result, SchemaError};
use crate::model::{Column, DataDef, Table};

const CONNECTOR_COLOR: &str = "#000000";

#[derive(Debug, Clone)]
pub struct PlantUmlRenderer {
    name: String,
}

impl PlantUmlRenderer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Renderer for PlantUmlRenderer {
    fn render(&self, data: &DataDef) -> Result<Vec<u8>> {
        Ok(build_plantuml(&self.name, data).into_bytes())
    }
}

/// PlantUML source for every table of `data`.
///
/// Foreign-key targets that are not part of `data` (for example because they
/// were filtered out) appear as empty entities so every connector has both
/// ends.
pub fn build_plantuml(name: &str, data: &DataDef) -> String {
    let present: BTreeSet<String> = data.tables().map(|t| t.name.to_lowercase()).collect();
    let mut missing: BTreeSet<&str> = BTreeSet::new();
    let mut connectors: BTreeSet<String> = BTreeSet::new();

    for table in data.tables() {
        for column in &table.columns {
            if column.foreign_key.trim().is_empty() {
                continue;
            }
            let target = column
                .foreign_key_target()
                .map(|(target, _)| target)
                .unwrap_or(column.foreign_key.as_str());
            if !present.contains(&target.to_lowercase()) {
                missing.insert(target);
            }
            connectors.insert(format!("{} {} {}", target, connector(column), table.name));
        }
    }

    let mut out = format!("@startuml {}\n\nskinparam linetype ortho\n", name);
    for table in data.tables() {
        out.push_str(&entity(table));
    }
    for target in missing {
        out.push_str(&format!("\nentity {} {{\n}}", target));
    }
    out.push('\n');
    for line in &connectors {
        out.push('\n');
        out.push_str(line);
    }
    out.push_str("\n\n@enduml\n");
    out
}

fn entity(table: &Table) -> String {
    let mut out = format!("\nentity {}", table.name);
    if !table.title.is_empty() {
        out.push_str(&format!(
            " as \"{}\\n<size:11>({})</size>\"",
            table.name, table.title
        ));
    }
    out.push_str(" {\n  |= |= <size:11>name</size> |= <size:11>type</size> |");
    for column in &table.columns {
        out.push_str("\n  | ");
        if column.is_primary_key() || column.identity.eq_ignore_ascii_case("y") {
            out.push_str("<size:11>PK</size>");
        }
        if !column.foreign_key.trim().is_empty() {
            out.push_str("<size:11>FK</size>");
        }
        out.push_str(&format!(
            " | <size:11>{}</size> | <size:11>{}</size> |",
            column.name, column.data_type
        ));
    }
    out.push_str("\n}");
    out
}

/// Connector between the referenced table (left) and the referencing one
/// (right). The left end takes its shape from the far side of `near:far`,
/// the right end from the near side.
fn connector(column: &Column) -> String {
    let (near, far) = column.cardinality_pair();
    let left = format!(
        "{}{}",
        if far.contains('*') { "}" } else { "|" },
        if far.contains('0') { "o" } else { "|" }
    );
    let right = format!(
        "{}{}",
        if near.contains('0') { "o" } else { "|" },
        if near.contains('*') { "{" } else { "|" }
    );
    format!("{}-[{}]-{}", left, CONNECTOR_COLOR, right)
}

// =============================================================================
// Image output through the PlantUML jar
// =============================================================================

#[derive(Debug, Clone)]
pub struct PlantUmlImageRenderer {
    output: PathBuf,
    format: String,
    java: String,
    jar: Option<PathBuf>,
}

impl PlantUmlImageRenderer {
    pub fn new(output: PathBuf, format: &str, config: &DiagramConfig) -> Self {
        Self {
            output,
            format: format.to_string(),
            java: config.java.clone(),
            jar: config.plantuml_jar.clone(),
        }
    }

    fn jar(&self) -> Result<PathBuf> {
        let mut dirs = vec![PathBuf::from(".")];
        if let Some(path) = std::env::var_os("PATH") {
            dirs.extend(std::env::split_paths(&path));
        }
        self.locate_jar(&dirs)
    }

    /// The configured jar, or the first one found in `dirs`
    fn locate_jar(&self, dirs: &[PathBuf]) -> Result<PathBuf> {
        if let Some(jar) = &self.jar {
            return Ok(jar.clone());
        }
        find_plantuml_jar(dirs).ok_or_else(|| SchemaError::ExternalTool {
            tool: "plantuml".to_string(),
            message: "no plantuml*.jar found in the current directory or PATH".to_string(),
        })
    }
}

impl Renderer for PlantUmlImageRenderer {
    /// Writes the `.puml` next to the image, runs PlantUML on it, and returns
    /// the image it produced.
    fn render(&self, data: &DataDef) -> Result<Vec<u8>> {
        let puml = sibling(&self.output, "puml");
        let name = self
            .output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("schema");
        std::fs::write(&puml, build_plantuml(name, data))
            .map_err(|e| SchemaError::render(puml.display().to_string(), e))?;

        let jar = self.jar()?;
        debug!(jar = %jar.display(), puml = %puml.display(), "running plantuml");
        let output = Command::new(&self.java)
            .arg("-jar")
            .arg(&jar)
            .arg(format!("-t{}", self.format))
            .arg(&puml)
            .output()
            .map_err(|e| SchemaError::ExternalTool {
                tool: self.java.clone(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(SchemaError::ExternalTool {
                tool: "plantuml".to_string(),
                message: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let image = sibling(&puml, &self.format);
        std::fs::read(&image).map_err(|source| SchemaError::Read {
            path: image,
            source,
        })
    }
}

/// First `plantuml*.jar` directly inside any of `dirs`
pub fn find_plantuml_jar(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter().find_map(|dir| {
        let mut jars: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_plantuml_jar(e.path()))
            .map(|e| e.into_path())
            .collect();
        jars.sort();
        jars.into_iter().next()
    })
}

fn is_plantuml_jar(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| {
            let n = n.to_ascii_lowercase();
            n.starts_with("plantuml") && n.ends_with(".jar")
        })
        .unwrap_or(false)
}
