//! dst CLI
//!
//! Check a schema definition and derive documentation, diagrams, DDL and
//! template output from it.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dst_schema::fixed::expand_fixed_columns;
use dst_schema::render::SqlRenderer;
use dst_schema::{
    filter, pipeline, renderer_for, resolve_output, verify, write_output, DataDef, DdlOperation,
    DstConfig, SchemaError, Selection,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dst")]
#[command(about = "Derive documentation, diagrams and DDL from a YAML schema definition")]
#[command(version)]
struct Cli {
    /// Debug logging (when RUST_LOG is not set)
    #[arg(long, global = true)]
    debug: bool,

    /// Config file layered over the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Wildcard selection; `*` or `%` match any run of characters and commas
/// separate alternatives
#[derive(Args)]
struct SelectArgs {
    /// Schema name pattern
    #[arg(long, default_value = "")]
    schema: String,

    /// Table name pattern
    #[arg(long, default_value = "")]
    table: String,

    /// Column name pattern
    #[arg(long, default_value = "")]
    column: String,
}

impl From<&SelectArgs> for Selection {
    fn from(args: &SelectArgs) -> Self {
        Selection::new(&args.schema, &args.table, &args.column)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a schema definition
    Check {
        /// Input schema (.yml, .yaml or .xlsx)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        select: SelectArgs,

        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert to YAML, spreadsheet, diagram or template output
    Convert {
        /// Input schema (.yml, .yaml or .xlsx)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file; its extension selects the format (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Template file; overrides the output extension
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Spreadsheet output as a single table summary sheet
        #[arg(long)]
        simple: bool,

        #[command(flatten)]
        select: SelectArgs,
    },

    /// Generate DDL statements
    Sql {
        /// DDL operation
        #[arg(value_enum)]
        operation: DdlOperation,

        /// Input schema (.yml, .yaml or .xlsx)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Database dialect (default from config)
        #[arg(long)]
        dialect: Option<String>,

        /// New column name for rename-column
        #[arg(long)]
        new_name: Option<String>,

        #[command(flatten)]
        select: SelectArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = DstConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;

    match cli.command {
        Commands::Check {
            input,
            select,
            json,
        } => check(&input, &Selection::from(&select), json),

        Commands::Convert {
            input,
            output,
            template,
            simple,
            select,
        } => {
            if simple {
                config.output.simple_spreadsheet = true;
            }
            let data = load_prepared(&input, &Selection::from(&select))?;
            let output = resolve_output(output.as_deref(), template.as_deref(), &config);
            let renderer = renderer_for(output.as_deref(), template.as_deref(), &config)?;
            write(renderer.as_ref(), &data, output.as_deref())
        }

        Commands::Sql {
            operation,
            input,
            output,
            dialect,
            new_name,
            select,
        } => {
            let dialect = dialect.unwrap_or_else(|| config.sql.default_dialect.clone());
            let renderer = SqlRenderer::new(
                &dialect,
                operation,
                new_name.as_deref(),
                config.sql.template_dir.as_deref(),
            )?;
            let data = load_prepared(&input, &Selection::from(&select))?;
            write(&renderer, &data, output.as_deref())
        }
    }
}

fn check(input: &Path, selection: &Selection, json: bool) -> anyhow::Result<()> {
    let mut data = pipeline::load(input)?;
    expand_fixed_columns(&mut data);
    let diagnostics = verify(&data);

    if json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else {
        for diagnostic in &diagnostics {
            eprintln!("{}", diagnostic);
        }
    }
    if !diagnostics.is_empty() {
        return Err(SchemaError::Validation { diagnostics }.into());
    }

    let selected = filter(&data, selection)?;
    if !json {
        println!(
            "OK: {} schema(s), {} table(s), {} column(s)",
            selected.schemas.len(),
            selected.table_count(),
            selected.column_count()
        );
    }
    Ok(())
}

/// Load and prepare, printing every verifier diagnostic before failing
fn load_prepared(input: &Path, selection: &Selection) -> anyhow::Result<DataDef> {
    match pipeline::load_selected(input, selection) {
        Ok(data) => Ok(data),
        Err(SchemaError::Validation { diagnostics }) => {
            for diagnostic in &diagnostics {
                eprintln!("{}", diagnostic);
            }
            Err(SchemaError::Validation { diagnostics }.into())
        }
        Err(e) => Err(e).with_context(|| format!("failed to load {}", input.display())),
    }
}

fn write(
    renderer: &dyn dst_schema::Renderer,
    data: &DataDef,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    write_output(renderer, data, output).with_context(|| match output {
        Some(path) => format!("failed to write {}", path.display()),
        None => "failed to write to stdout".to_string(),
    })
}
