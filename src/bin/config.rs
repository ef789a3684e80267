//! dst Config CLI
//!
//! View and manage dst configuration.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dst_schema::DstConfig;

#[derive(Parser)]
#[command(name = "dst-config")]
#[command(about = "View and manage dst configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path
        #[arg(short, long, default_value = "dst.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Show { config, toml, json } => {
            let cfg = DstConfig::load_from(config.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("dst configuration\n");
                println!("Diagram:");
                println!("  Java: {}", cfg.diagram.java);
                println!("  PlantUML jar: {:?}", cfg.diagram.plantuml_jar);
                println!("  Image format: {}", cfg.diagram.image_format);

                println!("\nSQL:");
                println!("  Default dialect: {}", cfg.sql.default_dialect);
                println!("  Template dir: {:?}", cfg.sql.template_dir);

                println!("\nOutput:");
                println!("  Lower-case data types: {}", cfg.output.lowercase_data_types);
                println!("  Compact fixed columns: {}", cfg.output.compact_fixed_columns);
                println!("  Simple spreadsheet: {}", cfg.output.simple_spreadsheet);

                if let Some(path) = DstConfig::user_config_path() {
                    println!("\nUser config file: {}", path.display());
                }
            }
        }

        Commands::Init { output, force } => {
            if output.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
            }
            DstConfig::default()
                .save(&output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Created config file: {}", output.display());
        }

        Commands::Validate { config } => match DstConfig::load_from(config.as_deref()) {
            Ok(cfg) => {
                let problems = cfg.validate();
                if problems.is_empty() {
                    println!("Configuration is valid");
                    println!("   Dialect: {}", cfg.sql.default_dialect);
                    println!("   Image format: {}", cfg.diagram.image_format);
                } else {
                    for problem in &problems {
                        eprintln!("  - {}", problem);
                    }
                    anyhow::bail!("{} configuration problem(s)", problems.len());
                }
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
