//! `rlops score`: score reward inputs from a JSONL file.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use rlops_core::CliConfig;
use rlops_reward::{AccuracyMode, DEFAULT_FORMAT_WEIGHT, RewardInput, RewardScorer, Score};
use serde_json::Value;
use std::path::Path;

pub fn execute(
    config: &CliConfig,
    input: &Path,
    mode: Option<String>,
    format_weight: Option<f64>,
    explain: bool,
) -> Result<()> {
    let mode: AccuracyMode = match mode.or_else(|| config.reward.mode.clone()) {
        Some(m) => m.parse()?,
        None => AccuracyMode::default(),
    };
    let weight = format_weight.or(config.reward.format_weight).unwrap_or(DEFAULT_FORMAT_WEIGHT);
    let scorer = RewardScorer::new(mode, weight)?;

    let content =
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))?;

    let mut scores = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: invalid JSON", input.display(), line_no))?;
        let reward_input =
            RewardInput::from_value(&value).with_context(|| format!("{}:{}", input.display(), line_no))?;

        let report = scorer.score(&reward_input);
        if explain {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{}", serde_json::to_string(&report.score)?);
        }
        scores.push(report.score);
    }

    if scores.is_empty() {
        bail!("No reward inputs found in {}", input.display());
    }

    print_summary(&scores, scorer);
    Ok(())
}

fn mean(values: impl Iterator<Item = f64>, count: usize) -> f64 {
    values.sum::<f64>() / count as f64
}

fn print_summary(scores: &[Score], scorer: RewardScorer) {
    let n = scores.len();
    eprintln!();
    eprintln!(
        "{} {} (mode {}, format weight {})",
        "Scored".bold().cyan(),
        n,
        scorer.mode(),
        scorer.format_weight()
    );
    eprintln!("  overall:  {:.4}", mean(scores.iter().map(|s| s.overall), n));
    eprintln!("  format:   {:.4}", mean(scores.iter().map(|s| s.format), n));
    eprintln!("  accuracy: {:.4}", mean(scores.iter().map(|s| s.accuracy), n));
}
