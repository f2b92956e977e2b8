use crate::driver::BatchKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { kind: BatchKind, total: usize, dry_run: bool },
    ItemStarted { index: usize, total: usize, path: PathBuf },
    DryRun { command: String },
    Output { line: String },
    ItemSucceeded { path: PathBuf },
    ItemFailed { path: PathBuf, reason: String },
    Halted { remaining: usize },
    Finished { successful: usize, failed: usize, total: usize },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

#[derive(Debug, Default)]
pub struct StdoutProgressSink;

impl ProgressSink for StdoutProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { kind, total, dry_run } => {
                println!("Total to {}: {total}", kind.verb());
                if dry_run {
                    println!("=== DRY RUN MODE ===");
                }
            }
            ProgressEvent::ItemStarted { index, total, path } => {
                println!("[{}/{total}] {}", index + 1, path.display());
            }
            ProgressEvent::DryRun { command } => println!("Would run: {command}"),
            ProgressEvent::Output { line } => println!("{line}"),
            ProgressEvent::ItemSucceeded { path } => println!("✓ {}", path.display()),
            ProgressEvent::ItemFailed { path, reason } => println!("✗ {}: {reason}", path.display()),
            ProgressEvent::Halted { remaining } => {
                println!("Stopping due to error ({remaining} not attempted). Use --continue-on-error to continue despite failures.");
            }
            ProgressEvent::Finished { successful, failed, total } => {
                println!("Successful: {successful}  Failed: {failed}  Total: {total}");
            }
        }
    }
}

/// Sink that keeps every event, for tests and for callers that render later.
#[derive(Debug, Default)]
pub struct RecordingProgressSink {
    events: std::sync::Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgressSink {
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ProgressSink for RecordingProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
