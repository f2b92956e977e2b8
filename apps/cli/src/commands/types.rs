//! Argument types shared between subcommands.

use clap::Args;
use std::path::PathBuf;

/// Flags common to the batch drivers (`merge`, `validate`).
#[derive(Args, Debug, Clone, Default)]
pub struct BatchFlags {
    /// Print the commands that would run without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Keep going after a failed item instead of stopping the batch
    #[arg(long)]
    pub continue_on_error: bool,

    /// Checkpoint root to scan (repeatable; overrides `checkpoint_roots` from config)
    #[arg(long = "root", value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Write a JSON report of the batch to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}
