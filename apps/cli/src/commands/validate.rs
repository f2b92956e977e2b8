//! `rlops validate`: run the validation program on every merged model.

use super::batch::{resolve_roots, run_plan};
use super::types::BatchFlags;
use anyhow::{Context, Result};
use rlops_core::{CliConfig, DEFAULT_VALIDATE_PROGRAM};

pub async fn execute(config: &CliConfig, flags: BatchFlags, filter_steps: Option<Vec<String>>) -> Result<()> {
    let roots = resolve_roots(&flags, config)?;
    let program = config.validate.program_or(DEFAULT_VALIDATE_PROGRAM);

    if let Some(steps) = &filter_steps {
        tracing::info!(steps = ?steps, "Filtering steps");
    }

    let plan = rlops_training::plan_validation(&roots, &program, filter_steps.as_deref())
        .context("Failed to plan validation")?;
    run_plan(plan, &flags).await
}
