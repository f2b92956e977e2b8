//! Shared execution of merge and validation batches.

use super::types::BatchFlags;
use anyhow::{Context, Result, bail};
use colored::Colorize;
use rlops_core::CliConfig;
use rlops_training::{
    BatchDriver, BatchOptions, BatchPlan, BatchReport, ItemReport, ItemStatus, ProcessRunner, StdoutProgressSink,
};
use std::path::PathBuf;

/// Roots from `--root`, falling back to `checkpoint_roots` in the config.
pub fn resolve_roots(flags: &BatchFlags, config: &CliConfig) -> Result<Vec<PathBuf>> {
    let roots = if flags.roots.is_empty() { config.checkpoint_roots.clone() } else { flags.roots.clone() };
    if roots.is_empty() {
        bail!("No checkpoint roots given. Pass --root <DIR> or set `checkpoint_roots` in the config file.");
    }
    Ok(roots)
}

/// Run a planned batch, print the summary, and exit non-zero if any item failed.
pub async fn run_plan(plan: BatchPlan, flags: &BatchFlags) -> Result<()> {
    let verb = plan.kind.verb();

    println!();
    println!("{}", format!("rlops {verb}").bold().cyan());
    println!();

    for (dir, reason) in &plan.skipped {
        println!("  {} {} ({})", "skip".dimmed(), dir.path.display(), reason.dimmed());
    }

    if plan.is_empty() {
        if plan.skipped.is_empty() {
            println!("{}", "No directories found".yellow());
        } else {
            println!("{}", format!("Nothing to {verb}: {} skipped", plan.skipped.len()).yellow());
        }
    }

    let options = BatchOptions { dry_run: flags.dry_run, continue_on_error: flags.continue_on_error };
    let report = if plan.is_empty() {
        let mut report = BatchReport::new(plan.kind, &options);
        report.items.extend(plan.skipped.into_iter().map(|(dir, reason)| ItemReport {
            step_id: dir.step_id,
            path: dir.path,
            command: None,
            status: ItemStatus::Skipped { reason },
        }));
        report.finish();
        report
    } else {
        let runner = ProcessRunner::new();
        BatchDriver::new(&runner, &StdoutProgressSink, options).run(plan).await
    };

    print_summary(&report);

    if let Some(path) = &flags.report {
        report.write_json(path).with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("  Report: {}", path.display().to_string().dimmed());
    }

    if report.has_failures() {
        std::process::exit(report.exit_code());
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    if report.total() == 0 {
        return;
    }

    println!();
    for item in &report.items {
        if let ItemStatus::Failed { reason, stderr } = &item.status {
            println!("  {} step {}: {}", "failed".red(), item.step_id, reason);
            if let Some(stderr) = stderr {
                for line in stderr.lines().take(5) {
                    println!("    {}", line.dimmed());
                }
            }
        }
    }

    let not_attempted = report.not_attempted();
    if report.has_failures() {
        let mut line = format!("{} of {} failed", report.failed(), report.total());
        if not_attempted > 0 {
            line.push_str(&format!(", {not_attempted} not attempted"));
        }
        println!("{}", line.red().bold());
    } else if report.dry_run {
        println!("{}", format!("Dry run: {} command(s) listed", report.successful()).green());
    } else {
        println!("{}", format!("All {} succeeded", report.total()).green().bold());
    }
    println!();
}
