//! phonefeat CLI
//!
//! Fits the phone feature pipeline on a scraped catalogue and replays the
//! fitted state on new listings.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use phone_features::config::PipelineConfig;
use phone_features::dataset::RawTable;
use phone_features::store::{FeatureService, FeatureStore, InMemoryFeatureStore};
use phone_features::training::{prepare_training, TrainingArtifact};
use phone_features::FittedTransformer;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "phonefeat")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Phone listing feature pipeline", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a raw catalogue, fit both transformers and save the artifact
    Fit {
        /// Raw catalogue CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Pipeline configuration (TOML); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Artifact directory
        #[arg(short, long, default_value = "artifacts")]
        output: PathBuf,

        /// Also write the transformed training split as CSV
        #[arg(long)]
        train_csv: Option<PathBuf>,
    },

    /// Transform raw listings with a saved artifact
    Transform {
        #[arg(short, long, default_value = "artifacts")]
        artifact: PathBuf,

        #[arg(short, long)]
        input: PathBuf,

        /// Engineered features CSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Transform listings into an in-memory store and read one service
    Materialize {
        #[arg(short, long, default_value = "artifacts")]
        artifact: PathBuf,

        /// Listings CSV; needs `DiscountedPrice` for the `phone_value` features
        #[arg(short, long)]
        input: PathBuf,

        /// Feature service to read
        #[arg(long, default_value = "smart_phone_recommender")]
        service: String,

        /// Product to look up
        #[arg(long)]
        product_id: String,
    },

    /// Print the fitted state and manifest of an artifact as JSON
    Inspect {
        #[arg(short, long, default_value = "artifacts")]
        artifact: PathBuf,
    },
}

fn load_table(path: &Path) -> Result<RawTable> {
    let table = RawTable::from_csv(path)
        .with_context(|| format!("Failed to load listings from {}", path.display()))?;
    info!("Loaded {} listings from {}", table.len(), path.display());
    Ok(table)
}

fn load_artifact(path: &Path) -> Result<TrainingArtifact> {
    TrainingArtifact::load(path)
        .with_context(|| format!("Failed to load artifact from {}", path.display()))
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Fit {
            input,
            config,
            output,
            train_csv,
        } => {
            let config = match config {
                Some(path) => PipelineConfig::from_toml_file(&path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?,
                None => PipelineConfig::default(),
            };
            let table = load_table(&input)?;
            let prepared = prepare_training(&table, &config).context("Failed to prepare training data")?;
            info!(
                "Fitted on {} rows, {} held out",
                prepared.x_train.len(),
                prepared.x_test.len()
            );

            let artifact = TrainingArtifact::from_prepared(&prepared);
            artifact.save(&output).context("Failed to save artifact")?;
            info!("Artifact written to {}", output.display());

            if let Some(path) = train_csv {
                prepared
                    .x_train
                    .write_csv(&path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }
        Command::Transform {
            artifact,
            input,
            output,
        } => {
            let artifact = load_artifact(&artifact)?;
            let table = load_table(&input)?;
            let frame = artifact
                .features
                .transform(&table)
                .context("Failed to transform listings")?;
            frame
                .write_csv(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!(
                "Wrote {} rows x {} features to {}",
                frame.len(),
                frame.features().len(),
                output.display()
            );
        }
        Command::Materialize {
            artifact,
            input,
            service,
            product_id,
        } => {
            let artifact = load_artifact(&artifact)?;
            let table = load_table(&input)?;
            let frame = artifact.features.transform(&table)?;
            let store = InMemoryFeatureStore::from_frame(&frame);
            let service = FeatureService::by_name(&service)?;

            let values = store.online_features(&product_id, service.refs())?;
            let features: serde_json::Map<String, serde_json::Value> = service
                .refs()
                .iter()
                .zip(values)
                .map(|(r, v)| (r.to_string(), serde_json::Value::from(v)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&features)?);
        }
        Command::Inspect { artifact } => {
            let artifact = load_artifact(&artifact)?;
            let report = serde_json::json!({
                "manifest": artifact.manifest,
                "features": artifact.features.state(),
                "target": artifact.target.extract_params(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    // RUST_LOG directives refine the level chosen by --verbose
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(log_level).into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    if let Command::Fit { input, .. } | Command::Transform { input, .. } = &args.command {
        if !input.exists() {
            bail!("input file {} does not exist", input.display());
        }
    }
    run(args.command)
}
