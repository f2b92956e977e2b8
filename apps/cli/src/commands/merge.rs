//! `rlops merge`: merge actor shards into portable model directories.

use super::batch::{resolve_roots, run_plan};
use super::types::BatchFlags;
use anyhow::{Context, Result};
use rlops_core::{CliConfig, DEFAULT_MERGE_PROGRAM};

pub async fn execute(config: &CliConfig, flags: BatchFlags, force: bool) -> Result<()> {
    let roots = resolve_roots(&flags, config)?;
    let program = config.merge.program_or(DEFAULT_MERGE_PROGRAM);

    let plan = rlops_training::plan_merge(&roots, &program, force).context("Failed to plan merge")?;
    run_plan(plan, &flags).await
}
