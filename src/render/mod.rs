//! Output renderers
//!
//! Every output format implements [`Renderer`]. [`renderer_for`] picks one
//! from the output path and optional template, so commands share a single
//! load/prepare/render sequence.

pub mod plantuml;
pub mod sql;
pub mod template;
pub mod xlsx;
pub mod yaml;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{DstConfig, OutputConfig};
use crate::error::{Result, SchemaError};
use crate::fixed::compact_fixed_columns;
use crate::model::DataDef;

pub use plantuml::{PlantUmlImageRenderer, PlantUmlRenderer};
pub use sql::{DdlOperation, SqlRenderer};
pub use template::TemplateRenderer;
pub use xlsx::XlsxRenderer;
pub use yaml::YamlRenderer;

/// Turns a prepared model into the bytes of one output file.
///
/// Implementations treat `data` as read-only and clone before any
/// output-only normalisation.
pub trait Renderer {
    fn render(&self, data: &DataDef) -> Result<Vec<u8>>;
}

/// Output path value that means "write to standard output"
pub const STDOUT: &str = "stdout";

/// Whether `output` stands for standard output
pub fn is_stdout(output: Option<&Path>) -> bool {
    output.map_or(true, |p| p.as_os_str().is_empty() || p == Path::new(STDOUT))
}

/// Lower-cased extension of `path`
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Output path to render to.
///
/// Without a template, a file path that has no extension becomes a diagram
/// image in the configured `image_format`, so `erd` is written as `erd.png`
/// next to `erd.puml`.
pub fn resolve_output(
    output: Option<&Path>,
    template: Option<&Path>,
    config: &DstConfig,
) -> Option<PathBuf> {
    let output = output?;
    if template.is_none() && !is_stdout(Some(output)) && output.extension().is_none() {
        return Some(output.with_extension(&config.diagram.image_format));
    }
    Some(output.to_path_buf())
}

/// Choose the renderer for an output path.
///
/// A template always wins. Otherwise the extension decides: `.yml`/`.yaml`
/// (or no output at all), `.xlsx`, `.puml`, `.png`/`.svg`. Pass the path
/// through [`resolve_output`] first; a path without an extension is rejected.
pub fn renderer_for(
    output: Option<&Path>,
    template: Option<&Path>,
    config: &DstConfig,
) -> Result<Box<dyn Renderer>> {
    if let Some(template) = template {
        debug!(template = %template.display(), "using template renderer");
        return Ok(Box::new(TemplateRenderer::from_file(template)?));
    }

    let output = match output {
        Some(path) if !is_stdout(Some(path)) => path,
        _ => return Ok(Box::new(YamlRenderer::from_config(&config.output))),
    };

    match extension(output).as_deref() {
        Some("yml") | Some("yaml") => Ok(Box::new(YamlRenderer::from_config(&config.output))),
        Some("xlsx") => Ok(Box::new(XlsxRenderer::from_config(&config.output))),
        Some("puml") => Ok(Box::new(PlantUmlRenderer::new(diagram_name(output)))),
        Some(format @ ("png" | "svg")) => Ok(Box::new(PlantUmlImageRenderer::new(
            output.to_path_buf(),
            format,
            &config.diagram,
        ))),
        _ => Err(SchemaError::UnsupportedOutput(output.display().to_string())),
    }
}

/// Render and write to `output`, or to standard output when there is none
pub fn write_output(
    renderer: &dyn Renderer,
    data: &DataDef,
    output: Option<&Path>,
) -> Result<()> {
    let bytes = renderer.render(data)?;
    match output {
        Some(path) if !is_stdout(Some(path)) => {
            std::fs::write(path, &bytes)
                .map_err(|e| SchemaError::render(path.display().to_string(), e))?;
            debug!(path = %path.display(), bytes = bytes.len(), "wrote output");
        }
        _ => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Copy of `data` in persisted form: data types lower-cased and columns
/// shared by every table moved back into `fixed`, as configured
pub fn normalize_for_output(data: &DataDef, config: &OutputConfig) -> DataDef {
    let mut data = data.clone();
    if config.lowercase_data_types {
        let DataDef { fixed, schemas } = &mut data;
        let columns = fixed.iter_mut().chain(
            schemas
                .iter_mut()
                .flat_map(|s| s.tables.iter_mut())
                .flat_map(|t| t.columns.iter_mut()),
        );
        for column in columns {
            column.data_type = column.data_type.to_lowercase();
        }
    }
    if config.compact_fixed_columns {
        compact_fixed_columns(&mut data);
    }
    data
}

fn diagram_name(output: &Path) -> String {
    output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("schema")
        .to_string()
}

/// `path` with its extension replaced by `ext`
pub(crate) fn sibling(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_detection() {
        assert!(is_stdout(None));
        assert!(is_stdout(Some(Path::new("stdout"))));
        assert!(is_stdout(Some(Path::new(""))));
        assert!(!is_stdout(Some(Path::new("out.yml"))));
    }

    #[test]
    fn test_renderer_selection() {
        let config = DstConfig::default();
        for name in ["out.yml", "out.YAML", "out.xlsx", "out.puml", "out.png", "out.svg"] {
            assert!(
                renderer_for(Some(Path::new(name)), None, &config).is_ok(),
                "{}",
                name
            );
        }
        assert!(renderer_for(None, None, &config).is_ok());
    }

    #[test]
    fn test_unknown_extension() {
        let config = DstConfig::default();
        let err = renderer_for(Some(Path::new("out.docx")), None, &config)
            .err()
            .unwrap();
        assert!(matches!(err, SchemaError::UnsupportedOutput(_)));
    }

    #[test]
    fn test_extensionless_output_needs_resolving() {
        let config = DstConfig::default();
        let err = renderer_for(Some(Path::new("erd")), None, &config)
            .err()
            .unwrap();
        assert!(matches!(err, SchemaError::UnsupportedOutput(_)));
    }

    #[test]
    fn test_resolve_output() {
        let config = DstConfig::default();
        assert_eq!(
            resolve_output(Some(Path::new("docs/erd")), None, &config),
            Some(PathBuf::from("docs/erd.png"))
        );
        assert_eq!(
            resolve_output(Some(Path::new("out.yml")), None, &config),
            Some(PathBuf::from("out.yml"))
        );
        assert_eq!(
            resolve_output(Some(Path::new("Makefile")), Some(Path::new("make.j2")), &config),
            Some(PathBuf::from("Makefile"))
        );
        assert_eq!(
            resolve_output(Some(Path::new(STDOUT)), None, &config),
            Some(PathBuf::from(STDOUT))
        );
        assert_eq!(resolve_output(None, None, &config), None);

        let mut svg = DstConfig::default();
        svg.diagram.image_format = "svg".to_string();
        let resolved = resolve_output(Some(Path::new("erd")), None, &svg);
        assert_eq!(resolved, Some(PathBuf::from("erd.svg")));
        assert!(renderer_for(resolved.as_deref(), None, &svg).is_ok());
    }

    #[test]
    fn test_sibling() {
        assert_eq!(sibling(Path::new("a/erd.png"), "puml"), PathBuf::from("a/erd.puml"));
    }
}
