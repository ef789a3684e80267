//! Configuration management
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (dst.toml)
//! - Environment variables (DST__*)
//!
//! ## Example config file (dst.toml):
//! ```toml
//! [diagram]
//! java = "java"
//! plantuml_jar = "/opt/plantuml/plantuml.jar"
//! image_format = "png"
//!
//! [sql]
//! default_dialect = "mysql"
//! template_dir = "./templates"
//!
//! [output]
//! lowercase_data_types = true
//! compact_fixed_columns = true
//! simple_spreadsheet = false
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DstConfig {
    /// Diagram rendering settings
    #[serde(default)]
    pub diagram: DiagramConfig,

    /// DDL generation settings
    #[serde(default)]
    pub sql: SqlConfig,

    /// Schema output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// External PlantUML invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramConfig {
    /// Java executable
    #[serde(default = "default_java")]
    pub java: String,

    /// Explicit path to the PlantUML jar; searched when unset
    #[serde(default)]
    pub plantuml_jar: Option<PathBuf>,

    /// Image format used when the output extension does not say
    #[serde(default = "default_image_format")]
    pub image_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlConfig {
    #[serde(default = "default_dialect")]
    pub default_dialect: String,

    /// Directory of `{dialect}-{operation}.template` files overriding the built-ins
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub lowercase_data_types: bool,

    /// Move columns shared by every table back into `fixed` on output
    #[serde(default = "default_true")]
    pub compact_fixed_columns: bool,

    /// Write spreadsheets as one "Tables Description" summary sheet
    #[serde(default)]
    pub simple_spreadsheet: bool,
}

// Default value functions
fn default_java() -> String {
    "java".to_string()
}

fn default_image_format() -> String {
    "png".to_string()
}

fn default_dialect() -> String {
    "mysql".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            java: default_java(),
            plantuml_jar: None,
            image_format: default_image_format(),
        }
    }
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            default_dialect: default_dialect(),
            template_dir: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            lowercase_data_types: true,
            compact_fixed_columns: true,
            simple_spreadsheet: false,
        }
    }
}

impl DstConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["dst.toml", ".dst.toml", "config/dst.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // DST__SECTION__KEY
        builder = builder.add_source(
            Environment::with_prefix("DST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Parse configuration from TOML text only, without other sources
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(content, config_crate::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Per-user config file in the platform config directory
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "dst").map(|dirs| dirs.config_dir().join("dst.toml"))
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Check values that deserialize fine but cannot work at run time
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.diagram.java.trim().is_empty() {
            problems.push("diagram.java must not be empty".to_string());
        }
        if !matches!(self.diagram.image_format.as_str(), "png" | "svg") {
            problems.push(format!(
                "diagram.image_format '{}' is not one of png, svg",
                self.diagram.image_format
            ));
        }
        if let Some(jar) = &self.diagram.plantuml_jar {
            if !jar.is_file() {
                problems.push(format!("diagram.plantuml_jar {:?} does not exist", jar));
            }
        }
        if let Some(dir) = &self.sql.template_dir {
            if !dir.is_dir() {
                problems.push(format!("sql.template_dir {:?} is not a directory", dir));
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DstConfig::default();
        assert_eq!(config.diagram.java, "java");
        assert_eq!(config.diagram.image_format, "png");
        assert_eq!(config.sql.default_dialect, "mysql");
        assert!(config.output.lowercase_data_types);
        assert!(config.output.compact_fixed_columns);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_serialize_config() {
        let config = DstConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[diagram]"));
        assert!(toml_str.contains("[sql]"));
        assert!(toml_str.contains("[output]"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DstConfig::from_toml("[sql]\ndefault_dialect = \"mssql\"\n").unwrap();
        assert_eq!(config.sql.default_dialect, "mssql");
        assert_eq!(config.diagram.java, "java");
        assert!(config.output.compact_fixed_columns);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dst.toml");
        let mut config = DstConfig::default();
        config.output.compact_fixed_columns = false;
        config.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(DstConfig::from_toml(&content).unwrap(), config);
    }

    #[test]
    fn test_validate_reports_bad_values() {
        let mut config = DstConfig::default();
        config.diagram.image_format = "gif".to_string();
        config.sql.template_dir = Some(PathBuf::from("/definitely/not/here"));
        assert_eq!(config.validate().len(), 2);
    }
}
