//! Records CLI
//!
//! Validates stored dictionary records against a catalog, prints the
//! catalog and lints it.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use diki_records::config::OutputFormat;
use diki_records::lint::CatalogLinter;
use diki_records::{Catalog, Ingestor, RecordsConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "records")]
#[command(about = "Validate scraped dictionary records against their schemas")]
struct Cli {
    /// Config file (defaults to records.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    /// Catalog file or directory, overriding the config
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-validate stored JSON records and print them normalized
    Validate {
        /// JSON documents, one record each
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Schema of the documents (defaults to ingest.default_schema)
        #[arg(short, long)]
        schema: Option<String>,

        /// Compact JSON output
        #[arg(long)]
        compact: bool,
    },

    /// List schemas and their fields
    Catalog {
        /// Print as a TOML catalog file instead
        #[arg(long)]
        toml: bool,
    },

    /// Lint the catalog
    Lint,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether everything checked out
fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = RecordsConfig::load_from(cli.config.as_deref()).context("loading config")?;
    if let Some(path) = cli.catalog {
        config.catalog.path = Some(path);
    }
    let catalog = config.load_catalog().context("loading catalog")?;
    info!(schemas = catalog.len(), "catalog ready");

    match cli.command {
        Commands::Validate {
            files,
            schema,
            compact,
        } => {
            let schema = schema.unwrap_or_else(|| config.ingest.default_schema.clone());
            let format = if compact {
                OutputFormat::Compact
            } else {
                config.output.format
            };
            validate(&catalog, &config, &schema, format, &files)
        }

        Commands::Catalog { toml } => {
            if toml {
                print!("{}", toml::to_string_pretty(&catalog.to_file())?);
            } else {
                print_catalog(&catalog);
            }
            Ok(true)
        }

        Commands::Lint => {
            let linter = CatalogLinter::new(config.catalog.roots.iter().cloned());
            let results = linter.lint(&catalog);
            if results.is_empty() {
                println!("✅ {} schemas, no findings", catalog.len());
                return Ok(true);
            }

            let mut clean = true;
            for result in &results {
                println!("{}", result.schema_id);
                for error in &result.errors {
                    println!("  ❌ [{}] {}: {}", error.code, error.path, error.message);
                }
                for warning in &result.warnings {
                    println!("  ⚠️  [{}] {}: {}", warning.code, warning.path, warning.message);
                }
                clean &= result.is_clean();
            }
            Ok(clean)
        }
    }
}

fn validate(
    catalog: &Catalog,
    config: &RecordsConfig,
    schema: &str,
    format: OutputFormat,
    files: &[PathBuf],
) -> anyhow::Result<bool> {
    let ingestor = Ingestor::new(catalog);
    if let Some(dir) = &config.output.dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut all_valid = true;
    for path in files {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

        match ingestor.ingest_str(schema, &content) {
            Ok(record) => {
                let json = format.to_json(&record)?;
                match (&config.output.dir, path.file_name()) {
                    (Some(dir), Some(name)) => {
                        let out = dir.join(name);
                        fs::write(&out, json)
                            .with_context(|| format!("writing {}", out.display()))?;
                        eprintln!("✅ {} -> {}", path.display(), out.display());
                    }
                    _ => println!("{}", json),
                }
            }
            Err(e) => {
                eprintln!("❌ {}: {}", path.display(), e);
                all_valid = false;
            }
        }
    }

    Ok(all_valid)
}

fn print_catalog(catalog: &Catalog) {
    for schema in catalog.iter() {
        println!("{}", schema.name());
        for (name, spec) in schema.fields() {
            let marker = if spec.required { "" } else { "?" };
            println!("  {}{}: {}", name, marker, spec.type_expr());
        }
    }
}
