//! Sequential batch driver for merge and validation runs.

use crate::error::{TrainingError, TrainingResult};
use crate::layout::{MERGED_DIR, is_merged_model_path};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::report::{BatchReport, ItemReport, ItemStatus};
use crate::runner::{CommandOutcome, CommandRunner, CommandSpec, OutputMode};
use crate::scan::{StepDir, find_actor_shards, find_merged_models};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    Merge,
    Validate,
}

impl BatchKind {
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Validate => "validate",
        }
    }

    /// Merge output is captured; validation output is streamed to the console.
    #[must_use]
    pub fn output_mode(self) -> OutputMode {
        match self {
            Self::Merge => OutputMode::Capture,
            Self::Validate => OutputMode::Stream,
        }
    }
}

/// One unit of work: a step directory and the command to run for it.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub step_id: String,
    pub target: PathBuf,
    pub command: CommandSpec,
}

#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub kind: BatchKind,
    pub jobs: Vec<BatchJob>,
    /// Directories found but excluded, with the reason.
    pub skipped: Vec<(StepDir, String)>,
}

impl BatchPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// `<program...> --local_dir <actor>`
fn merge_command(program: &[String], actor: &StepDir) -> TrainingResult<CommandSpec> {
    Ok(CommandSpec::from_argv(program)?
        .arg("--local_dir")
        .arg(actor.path.to_string_lossy()))
}

/// `<program...> <model> <model>`: the merged model serves as both actor and rollout model.
fn validate_command(program: &[String], model: &StepDir) -> TrainingResult<CommandSpec> {
    let path = model.path.to_string_lossy();
    Ok(CommandSpec::from_argv(program)?.arg(path.clone()).arg(path))
}

/// Build the merge job for one actor shard.
///
/// A target that is itself a merged model is refused.
pub fn merge_job(program: &[String], shard: StepDir) -> TrainingResult<BatchJob> {
    if is_merged_model_path(&shard.path) {
        return Err(TrainingError::InvalidPlan(format!(
            "refusing to merge a merged model: {}",
            shard.path.display()
        )));
    }
    let command = merge_command(program, &shard)?;
    Ok(BatchJob { step_id: shard.step_id, target: shard.path, command })
}

/// Plan a merge over every actor shard under `roots`.
///
/// Shards that already hold a merged model are skipped unless `force` is set.
pub fn plan_merge(roots: &[PathBuf], program: &[String], force: bool) -> TrainingResult<BatchPlan> {
    let mut plan = BatchPlan { kind: BatchKind::Merge, jobs: Vec::new(), skipped: Vec::new() };

    for root in roots {
        info!(root = %root.display(), "Scanning directory");
        let shards = find_actor_shards(root)?;
        info!(root = %root.display(), found = shards.len(), "Found actor shards");

        for shard in shards {
            if !force && shard.path.join(MERGED_DIR).is_dir() {
                plan.skipped.push((shard, "already merged".to_string()));
                continue;
            }
            plan.jobs.push(merge_job(program, shard)?);
        }
    }

    Ok(plan)
}

/// Plan a validation over every merged model under `roots`.
///
/// With `filter_steps`, only steps whose id equals one of the entries are kept.
pub fn plan_validation(
    roots: &[PathBuf],
    program: &[String],
    filter_steps: Option<&[String]>,
) -> TrainingResult<BatchPlan> {
    let mut plan = BatchPlan { kind: BatchKind::Validate, jobs: Vec::new(), skipped: Vec::new() };

    for root in roots {
        info!(root = %root.display(), "Scanning directory");
        let models = find_merged_models(root)?;
        info!(root = %root.display(), found = models.len(), "Found merged models");

        for model in models {
            if let Some(filter) = filter_steps {
                if !filter.iter().any(|s| *s == model.step_id) {
                    plan.skipped.push((model, "not in filter".to_string()));
                    continue;
                }
            }
            let command = validate_command(program, &model)?;
            plan.jobs.push(BatchJob { step_id: model.step_id, target: model.path, command });
        }
    }

    Ok(plan)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Print commands instead of running them.
    pub dry_run: bool,
    /// Keep going after a failed item instead of halting the batch.
    pub continue_on_error: bool,
}

/// Runs a plan one command at a time.
pub struct BatchDriver<'a> {
    runner: &'a dyn CommandRunner,
    progress: &'a dyn ProgressSink,
    options: BatchOptions,
}

impl<'a> BatchDriver<'a> {
    #[must_use]
    pub fn new(runner: &'a dyn CommandRunner, progress: &'a dyn ProgressSink, options: BatchOptions) -> Self {
        Self { runner, progress, options }
    }

    pub async fn run(&self, plan: BatchPlan) -> BatchReport {
        let mut report = BatchReport::new(plan.kind, &self.options);
        for (dir, reason) in plan.skipped {
            report.items.push(ItemReport {
                step_id: dir.step_id,
                path: dir.path,
                command: None,
                status: ItemStatus::Skipped { reason },
            });
        }

        let total = plan.jobs.len();
        self.progress.on_event(ProgressEvent::Started { kind: plan.kind, total, dry_run: self.options.dry_run });

        let mut halted = false;
        for (index, job) in plan.jobs.into_iter().enumerate() {
            let status = if halted {
                ItemStatus::NotAttempted
            } else {
                self.progress.on_event(ProgressEvent::ItemStarted { index, total, path: job.target.clone() });
                let status = self.run_job(plan.kind, &job).await;

                if matches!(status, ItemStatus::Failed { .. }) && !self.options.continue_on_error {
                    halted = true;
                    self.progress.on_event(ProgressEvent::Halted { remaining: total - index - 1 });
                }
                status
            };

            report.items.push(ItemReport {
                step_id: job.step_id,
                path: job.target,
                command: Some(job.command.to_string()),
                status,
            });
        }

        report.finish();
        self.progress.on_event(ProgressEvent::Finished {
            successful: report.successful(),
            failed: report.failed(),
            total: report.total(),
        });
        report
    }

    async fn run_job(&self, kind: BatchKind, job: &BatchJob) -> ItemStatus {
        if self.options.dry_run {
            self.progress.on_event(ProgressEvent::DryRun { command: job.command.to_string() });
            return ItemStatus::DryRun;
        }

        let (reason, stderr) = match self.runner.run(&job.command, kind.output_mode(), self.progress).await {
            Ok(CommandOutcome::Success) => {
                info!(kind = kind.verb(), path = %job.target.display(), "Item succeeded");
                self.progress.on_event(ProgressEvent::ItemSucceeded { path: job.target.clone() });
                return ItemStatus::Succeeded;
            }
            Ok(CommandOutcome::Failed { code, stderr }) => {
                let reason = match code {
                    Some(code) => format!("exit code {code}"),
                    None => "terminated by signal".to_string(),
                };
                (reason, (!stderr.is_empty()).then_some(stderr))
            }
            Err(e) => (e.to_string(), None),
        };

        warn!(
            kind = kind.verb(),
            path = %job.target.display(),
            reason = %reason,
            stderr = stderr.as_deref().unwrap_or(""),
            "Item failed"
        );
        self.progress.on_event(ProgressEvent::ItemFailed { path: job.target.clone(), reason: reason.clone() });
        ItemStatus::Failed { reason, stderr }
    }
}
