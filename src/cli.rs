use clap::{Parser, Subcommand};
use nu_plugin_dataset::algo::load;
use nu_plugin_dataset::config::DatasetConfig;
use nu_plugin_dataset::error::{DatasetError, Result};
use nu_plugin_dataset::ops;
use serde_json::Value;
use std::io::{self, Read};

#[derive(Parser)]
#[command(
    name = "dataset",
    version,
    about = "Flatten semi-structured documents and infer a tabular schema"
)]
struct Cli {
    /// Start as an MCP (Model Context Protocol) server on stdio.
    /// AI assistants (Claude Desktop, Cursor, etc.) connect via JSON-RPC.
    #[cfg(feature = "mcp")]
    #[arg(long, conflicts_with = "input")]
    mcp: bool,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Read documents from this file instead of stdin
    #[arg(short, long, global = true)]
    input: Option<String>,

    /// Flatten policy: shallow, deep (overrides the config file)
    #[arg(long, global = true)]
    flatten: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full {schema, rows, sampleRows} dataset
    Infer,
    /// Convert BSON wrapper values to plain JSON without flattening
    Normalize,
    /// Flatten nested objects into dotted keys
    Flatten,
    /// Print the inferred schema only
    Schema,
    /// Per-field statistics: nulls, cardinality, top values
    Profile {
        /// Cardinality threshold for categorical fields
        #[arg(long)]
        threshold: Option<usize>,
    },
    /// Show the first rows as a table aligned to the schema
    Preview {
        /// Number of rows to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Render the schema and sample rows as an LLM prompt block
    Prompt,
    /// Split fields into categorical, numeric, and temporal chart axes
    #[command(name = "chart-fields")]
    ChartFields {
        /// Cardinality threshold for categorical fields
        #[arg(long)]
        threshold: Option<usize>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match resolve_config(cli.config.as_deref(), cli.flatten.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // ── MCP server mode ─────────────────────────────────────────────────
    #[cfg(feature = "mcp")]
    if cli.mcp {
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("failed to create tokio runtime: {e}");
            std::process::exit(1);
        });
        rt.block_on(async {
            if let Err(e) = nu_plugin_dataset::mcp::serve_stdio(config).await {
                eprintln!("MCP server error: {e}");
                std::process::exit(1);
            }
        });
        return;
    }

    // ── Normal subcommand dispatch ──────────────────────────────────────
    let command = cli.command.unwrap_or_else(|| {
        eprintln!("No subcommand provided. Run `dataset --help` for usage.");
        std::process::exit(1);
    });

    if let Err(e) = run(command, cli.input.as_deref(), config) {
        tracing::error!(error = %e, "command failed");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn resolve_config(path: Option<&str>, flatten: Option<&str>) -> Result<DatasetConfig> {
    let mut config = match path {
        Some(p) => DatasetConfig::load(p)?,
        None => DatasetConfig::default(),
    };
    if let Some(name) = flatten {
        config.flatten = ops::parse_flatten_depth(name).map_err(DatasetError::InvalidInput)?;
    }
    Ok(config)
}

fn run(command: Commands, input: Option<&str>, mut config: DatasetConfig) -> Result<()> {
    let records = read_records(input)?;
    tracing::debug!(records = records.len(), "read input");

    match command {
        Commands::Infer => print_json(&ops::op_infer(&records, &config)),
        Commands::Normalize => print_json(&ops::op_normalize(&records)),
        Commands::Flatten => print_json(&ops::op_flatten(&records, config.flatten)),
        Commands::Schema => print_json(&ops::op_schema(&records, &config)),
        Commands::Profile { threshold } => {
            if let Some(t) = threshold {
                config.cardinality_threshold = t;
            }
            print_json(&ops::op_profile(&records, &config))
        }
        Commands::Preview { limit } => print_json(&ops::op_preview(&records, &config, limit)),
        Commands::Prompt => {
            print!("{}", ops::op_prompt(&records, &config));
            Ok(())
        }
        Commands::ChartFields { threshold } => {
            if let Some(t) = threshold {
                config.cardinality_threshold = t;
            }
            print_json(&ops::op_chart_fields(&records, &config))
        }
    }
}

fn read_records(input: Option<&str>) -> Result<Vec<Value>> {
    let buf = match input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    load::parse_records(&buf)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
