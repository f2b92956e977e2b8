//! `rlops rollout`: convert a rollout batch and describe the resulting tensors.

use anyhow::{Context, Result};
use colored::Colorize;
use rlops_rollout::{RolloutInput, convert_rollout_batch};
use std::path::Path;

pub fn execute(input: &Path) -> Result<()> {
    let content =
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("{}: invalid JSON", input.display()))?;

    let batch = RolloutInput::from_json(value).context("Unsupported rollout batch")?;
    let dict = convert_rollout_batch(batch).context("Rollout conversion failed")?;

    println!();
    println!("{}", format!("Rollout batch ({} fields)", dict.len()).bold().cyan());
    println!();
    println!("{:<28} {:<8} {}", "Field", "DType", "Shape");
    println!("{}", "─".repeat(60));
    for (name, tensor) in dict.iter() {
        println!("{:<28} {:<8} {:?}", name.cyan(), tensor.dtype().to_string().dimmed(), tensor.shape());
    }
    println!();
    match dict.batch_size() {
        Some(size) => println!("  Batch size: {}", size.to_string().green()),
        None => println!("  Batch size: {}", "none (fields disagree on the leading dimension)".yellow()),
    }
    println!();
    Ok(())
}
