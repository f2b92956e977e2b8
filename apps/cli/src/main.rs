//! rlops CLI - operational tooling for RL fine-tuning runs
//!
//! Provides the `rlops` command: batch merge and validation of checkpoint
//! shards, reward scoring of model outputs, dataset conversion, and rollout
//! batch inspection.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level, warn};
use tracing_subscriber::FmtSubscriber;

use commands::types::BatchFlags;
use commands::{convert_dataset, merge, rollout, score, validate};

/// rlops - checkpoint, reward and dataset tooling for RL fine-tuning
#[derive(Parser, Debug)]
#[command(
    name = "rlops",
    author,
    version,
    about = "Checkpoint, reward and dataset tooling for RL fine-tuning",
    long_about = "rlops drives batch merge/validation over checkpoint directories, scores model\nresponses against ground truth, and converts datasets and rollout batches."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Configuration file, applied on top of ~/.rlops/config.toml and ./.rlopsrc
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge actor shards into portable model directories
    ///
    /// Scans each checkpoint root for `global_step_*/actor` and runs the
    /// configured merge program with `--local_dir <actor>` for each one.
    Merge {
        #[command(flatten)]
        batch: BatchFlags,

        /// Merge shards that already contain a merged model
        #[arg(long)]
        force: bool,
    },

    /// Validate merged models
    ///
    /// Scans each checkpoint root for `global_step_*/actor/huggingface` and
    /// runs the configured validation program on each merged model.
    Validate {
        #[command(flatten)]
        batch: BatchFlags,

        /// Only validate these step numbers
        #[arg(long, num_args = 1..)]
        filter_steps: Option<Vec<String>>,
    },

    /// Score model responses from a JSONL file
    ///
    /// Each line is `{"response": ..., "ground_truth": ...}`. Prints one score
    /// mapping per line and a mean summary on stderr.
    Score {
        /// JSONL file with reward inputs
        input: PathBuf,

        /// Accuracy mode (exact, token-match)
        #[arg(long)]
        mode: Option<String>,

        /// Weight of the format score in the overall score
        #[arg(long)]
        format_weight: Option<f64>,

        /// Include how each accuracy was reached
        #[arg(long)]
        explain: bool,
    },

    /// Convert multiple-choice VQA splits into train/test JSONL
    ConvertDataset {
        /// Source split files (JSONL)
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Shuffle seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Number of records in the test split
        #[arg(long, default_value_t = 1500)]
        test_size: usize,
    },

    /// Convert a rollout batch (JSON) and print each field's dtype and shape
    Rollout {
        /// Rollout batch file
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (cli_config, skipped_configs) = config::load_config(args.config.as_deref())?;

    // Initialize tracing
    let log_level = args.log_level.as_deref().or(cli_config.log_level.as_deref()).unwrap_or("info");
    let level = match log_level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    for error in &skipped_configs {
        warn!(error = %error, "Skipping config file");
    }

    match args.command {
        Command::Merge { batch, force } => merge::execute(&cli_config, batch, force).await,
        Command::Validate { batch, filter_steps } => validate::execute(&cli_config, batch, filter_steps).await,
        Command::Score { input, mode, format_weight, explain } => {
            score::execute(&cli_config, &input, mode, format_weight, explain)
        }
        Command::ConvertDataset { sources, out, seed, test_size } => {
            convert_dataset::execute(sources, out, seed, test_size)
        }
        Command::Rollout { input } => rollout::execute(&input),
    }
}
