//! Error types for the schema tool

use std::path::PathBuf;

use thiserror::Error;

use crate::verify::Diagnostics;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema tool errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("parse error: {message}")]
    Parse { message: String },

    #[error("no schema/table/column matched{}", suggestion_hint(.suggestions))]
    NoMatch { suggestions: Vec<String> },

    #[error("invalid data: {} problem(s) found", .diagnostics.len())]
    Validation { diagnostics: Diagnostics },

    #[error("invalid identity '{identity}' on column {table}.{column}: expected 'Y' or a key position")]
    InvalidIdentity {
        table: String,
        column: String,
        identity: String,
    },

    #[error("failed to render {target}: {source}")]
    Render {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("external tool '{tool}' failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unsupported input source: {0}")]
    UnsupportedSource(String),

    #[error("unsupported output: {0}")]
    UnsupportedOutput(String),

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub(crate) fn render(
        target: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Render {
            target: target.into(),
            source: source.into(),
        }
    }
}

impl From<serde_yaml::Error> for SchemaError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::parse(err.to_string())
    }
}

fn suggestion_hint(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}
