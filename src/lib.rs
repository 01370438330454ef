//! Armitage: BDD100K dataset support and component registries.
//!
//! Armitage adapts the BDD100K det_20 detection labels into a flat, typed,
//! indexable sample list and provides named registries so that a training
//! framework can build datasets by string identifier from a declarative
//! configuration.
//!
//! # Modules
//!
//! - [`bdd100k`]: det_20 schema, reader, normalizer and dataset layout
//! - [`dataset`]: the indexable dataset capability and the BDD100K dataset
//! - [`registry`]: name-to-constructor tables with parent fallback
//! - [`config`]: experiment configuration and dataset construction
//! - [`summary`]: counts over normalized samples
//! - [`error`]: Error types for armitage operations

pub mod bdd100k;
pub mod config;
pub mod dataset;
pub mod error;
pub mod registry;
pub mod summary;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::bdd100k::{ImageDimensions, NormalizeOptions};
use crate::dataset::{Bdd100kDataset, DetectionDataset};
pub use error::ArmitageError;

/// The armitage CLI application.
#[derive(Parser)]
#[command(name = "armitage")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Summarize a det_20 label file.
    Inspect(InspectArgs),
    /// Write the normalized sample list as JSON.
    Normalize(NormalizeArgs),
    /// Print one normalized sample.
    Show(ShowArgs),
    /// Build the datasets named in an experiment config.
    Build(BuildArgs),
    /// List component registries and registered datasets.
    Registry,
}

/// Where to find a det_20 label file and its images.
#[derive(clap::Args)]
struct SourceArgs {
    /// det_20 label JSON, e.g. labels/det_20/det_val.json.
    labels: PathBuf,

    /// Directory holding the images, e.g. images/100k/val.
    #[arg(long)]
    images: PathBuf,

    /// Read each image header for its real size instead of assuming 720x1280.
    #[arg(long)]
    probe_dimensions: bool,
}

impl SourceArgs {
    fn open(&self) -> Result<Bdd100kDataset, ArmitageError> {
        let opts = NormalizeOptions {
            dimensions: if self.probe_dimensions {
                ImageDimensions::ProbeHeader
            } else {
                ImageDimensions::default()
            },
        };
        Bdd100kDataset::open_with(&self.images, &self.labels, &opts)
    }
}

#[derive(clap::Args)]
struct InspectArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

#[derive(clap::Args)]
struct NormalizeArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output JSON file.
    #[arg(long)]
    out: PathBuf,
}

#[derive(clap::Args)]
struct ShowArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Sample index.
    #[arg(long, default_value_t = 0)]
    index: usize,

    /// Decode the image and report its size.
    #[arg(long)]
    decode: bool,
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Experiment config (.yaml, .yml or .json).
    config: PathBuf,
}

/// Run the armitage CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), ArmitageError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Inspect(args)) => run_inspect(args),
        Some(Commands::Normalize(args)) => run_normalize(args),
        Some(Commands::Show(args)) => run_show(args),
        Some(Commands::Build(args)) => run_build(args),
        Some(Commands::Registry) => run_registry(),
        None => {
            println!("armitage {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("BDD100K dataset support and component registries.");
            println!();
            println!("Run 'armitage --help' for usage information.");
            Ok(())
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` takes precedence over flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when run() is called from tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_inspect(args: InspectArgs) -> Result<(), ArmitageError> {
    let output = args.output.as_str();
    if !matches!(output, "text" | "json") {
        return Err(ArmitageError::UnsupportedFormat(format!(
            "'{}' (supported: text, json)",
            output
        )));
    }

    let dataset = args.source.open()?;
    let summary = summary::summarize(dataset.samples());

    match output {
        "json" => println!("{}", to_pretty_json(&summary)?),
        _ => print!("{}", summary),
    }
    Ok(())
}

fn run_normalize(args: NormalizeArgs) -> Result<(), ArmitageError> {
    let dataset = args.source.open()?;

    let file = File::create(&args.out).map_err(ArmitageError::Io)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, dataset.samples()).map_err(|source| {
        ArmitageError::NormalizedJsonWrite {
            path: args.out.clone(),
            source,
        }
    })?;

    println!(
        "Wrote {} normalized sample(s) to {}",
        dataset.len(),
        args.out.display()
    );
    Ok(())
}

fn run_show(args: ShowArgs) -> Result<(), ArmitageError> {
    let dataset = args.source.open()?;
    let sample = dataset.sample(args.index)?;
    println!("{}", to_pretty_json(sample)?);

    if args.decode {
        let loaded = dataset.get(args.index)?;
        let (height, width) = loaded.decoded_dimensions();
        println!("Decoded image: {}x{} (height x width)", height, width);
    }
    Ok(())
}

fn run_build(args: BuildArgs) -> Result<(), ArmitageError> {
    let experiment = config::load_experiment(&args.config)?;
    let datasets = registry::datasets(None)?;

    let dataloaders = experiment.dataloaders();
    if dataloaders.is_empty() {
        println!("No dataloaders configured in {}", args.config.display());
        return Ok(());
    }

    for (section, loader) in dataloaders {
        let dataset = config::build_dataset(
            &datasets,
            &loader.dataset,
            experiment.default_scope.as_deref(),
        )?;
        println!(
            "{}: {} with {} sample(s)",
            section,
            loader.dataset.type_name,
            dataset.len()
        );
    }
    Ok(())
}

fn run_registry() -> Result<(), ArmitageError> {
    let datasets = registry::datasets(None)?;

    println!("Registries (scope '{}'):", datasets.scope());
    for kind in registry::RegistryKind::ALL {
        println!("  {:<22} {}", kind.name(), kind.description());
    }
    println!();
    println!("Registered datasets:");
    for name in datasets.names() {
        println!("  {}.{}", datasets.scope(), name);
    }
    Ok(())
}

fn to_pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, ArmitageError> {
    serde_json::to_string_pretty(value).map_err(|source| ArmitageError::ReportSerialize { source })
}
