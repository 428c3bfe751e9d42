//! geostack command line tool.
//!
//! Inspects raster datasets and rewrites them:
//! - `inspect`: list dimensions, modes and layers
//! - `subset`: keep a set of layers
//! - `convert`: switch X/Y between projected and mapped coordinates

mod summary;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dimensions::ModeClass;
use geostack_common::Crs;
use geostack_raster::{backend_for_path, open_stack, write_stack_with, OpenOptions, RasterConfig};
use projection::WebMercator;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use summary::StackSummary;

#[derive(Parser, Debug)]
#[command(name = "geostack")]
#[command(about = "Inspect, subset and reproject raster stacks")]
struct Cli {
    /// CRS of the X/Y coordinates when the file does not say (e.g. EPSG:3857)
    #[arg(long, global = true, env = "GEOSTACK_CRS")]
    crs: Option<String>,

    /// CRS the X/Y coordinates map to, or "none"
    #[arg(long, global = true, env = "GEOSTACK_MAPPED_CRS")]
    mapped_crs: Option<String>,

    /// Log level
    #[arg(long, global = true, env = "GEOSTACK_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the dimensions and layers of a dataset
    Inspect {
        path: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Write a subset of the layers to a new dataset
    Subset {
        input: PathBuf,
        output: PathBuf,

        /// Layers to keep, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        keys: Vec<String>,
    },

    /// Convert X/Y dimensions and write the result
    ///
    /// Projected coordinates that map to another crs are written mapped.
    Convert {
        input: PathBuf,
        output: PathBuf,

        /// Target mode: projected or mapped
        #[arg(long)]
        to: String,
    },
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Environment config with command line overrides applied.
fn load_config(cli: &Cli) -> Result<RasterConfig> {
    let mut config = RasterConfig::from_env().context("Failed to read GEOSTACK_* environment")?;
    if let Some(crs) = &cli.crs {
        config.crs = Some(Crs::parse(crs).with_context(|| format!("Invalid --crs '{}'", crs))?);
    }
    if let Some(mapped) = &cli.mapped_crs {
        config.mappedcrs = if mapped.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(Crs::parse(mapped).with_context(|| format!("Invalid --mapped-crs '{}'", mapped))?)
        };
    }
    config.validate()?;
    Ok(config)
}

fn write_output(stack: &geostack_raster::Stack, output: &Path, config: &RasterConfig) -> Result<()> {
    let backend = backend_for_path(output)?;
    write_stack_with(backend.as_ref(), output, stack, config, Some(&WebMercator::new()))
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(path = %output.display(), layers = stack.len(), "Wrote dataset");
    Ok(())
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs)?;

    let config = load_config(&cli)?;
    let options = OpenOptions::from_config(&config);

    match &cli.command {
        Commands::Inspect { path, json } => {
            let stack = open_stack(path, &options)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let summary = StackSummary::new(&stack)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", summary.to_text());
            }
        }
        Commands::Subset { input, output, keys } => {
            let stack = open_stack(input, &options)
                .with_context(|| format!("Failed to open {}", input.display()))?;
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            let subset = stack.subset(&keys)?;
            write_output(&subset, output, &config)?;
        }
        Commands::Convert { input, output, to } => {
            let target: ModeClass = to.parse()?;
            let stack = open_stack(input, &options)
                .with_context(|| format!("Failed to open {}", input.display()))?;
            let converted = stack
                .convert_mode(target, Some(&WebMercator::new()))
                .with_context(|| format!("Failed to convert to {}", target))?;
            write_output(&converted, output, &config)?;
        }
    }

    Ok(())
}
