use crate::driver::{BatchKind, BatchOptions};
use crate::error::TrainingResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    Succeeded,
    /// Dry run: the command was printed, not executed.
    DryRun,
    Failed {
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stderr: Option<String>,
    },
    /// Left over after the batch halted on an earlier failure.
    NotAttempted,
    /// Excluded while planning (step filter, already merged).
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReport {
    pub step_id: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(flatten)]
    pub status: ItemStatus,
}

/// Outcome of one merge or validation batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: String,
    pub kind: BatchKind,
    pub dry_run: bool,
    pub continue_on_error: bool,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    #[must_use]
    pub fn new(kind: BatchKind, options: &BatchOptions) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            kind,
            dry_run: options.dry_run,
            continue_on_error: options.continue_on_error,
            started_at: Utc::now(),
            finished_at: None,
            items: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    fn count(&self, pred: impl Fn(&ItemStatus) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.status)).count()
    }

    /// Succeeded items, dry-run items included.
    #[must_use]
    pub fn successful(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Succeeded | ItemStatus::DryRun))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Failed { .. }))
    }

    #[must_use]
    pub fn not_attempted(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::NotAttempted))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Skipped { .. }))
    }

    /// Items selected for the batch (skipped items excluded).
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len() - self.skipped()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Process exit code for the batch: 1 if any item failed.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(self.has_failures())
    }

    pub fn write_json(&self, path: &Path) -> TrainingResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item(step: &str, status: ItemStatus) -> ItemReport {
        ItemReport { step_id: step.to_string(), path: PathBuf::from(step), command: None, status }
    }

    #[test]
    fn test_counts_and_exit_code() {
        let mut report = BatchReport::new(BatchKind::Merge, &BatchOptions::default());
        report.items = vec![
            item("1", ItemStatus::Succeeded),
            item("2", ItemStatus::Failed { reason: "exit code 1".to_string(), stderr: None }),
            item("3", ItemStatus::NotAttempted),
            item("4", ItemStatus::Skipped { reason: "not in filter".to_string() }),
        ];

        assert_eq!(report.successful(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.not_attempted(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.total(), 3);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_write_json() {
        let temp = TempDir::new().unwrap();
        let mut report = BatchReport::new(BatchKind::Validate, &BatchOptions::default());
        report.items.push(item("7", ItemStatus::DryRun));
        report.finish();

        let path = temp.path().join("reports").join("validate.json");
        report.write_json(&path).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["kind"], "validate");
        assert_eq!(value["items"][0]["status"], "dry_run");
        assert_eq!(report.exit_code(), 0);
    }
}
