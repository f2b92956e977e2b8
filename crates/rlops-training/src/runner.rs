//! External command execution.

use crate::error::{TrainingError, TrainingResult};
use crate::progress::{ProgressEvent, ProgressSink};
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Build from an argv-style list; the first element is the program.
    pub fn from_argv(argv: &[String]) -> TrainingResult<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| TrainingError::InvalidPlan("command must not be empty".to_string()))?;
        Ok(Self { program: program.clone(), args: args.to_vec() })
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How the child's output is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Collect stdout/stderr; stderr is reported on failure.
    Capture,
    /// Forward stdout and stderr line by line as `ProgressEvent::Output`.
    Stream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    Failed { code: Option<i32>, stderr: String },
}

impl CommandOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Runs one external command to completion.
///
/// `Err` means the command could not be launched at all.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        command: &CommandSpec,
        mode: OutputMode,
        progress: &dyn ProgressSink,
    ) -> TrainingResult<CommandOutcome>;
}

/// Runs commands as child processes in the current working directory.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).stdin(Stdio::null());
        cmd
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        mode: OutputMode,
        progress: &dyn ProgressSink,
    ) -> TrainingResult<CommandOutcome> {
        let launch_error = |source: std::io::Error| TrainingError::Launch { command: spec.to_string(), source };
        debug!(command = %spec, ?mode, "Launching command");

        match mode {
            OutputMode::Capture => {
                let output = Self::command(spec).output().await.map_err(launch_error)?;
                if output.status.success() {
                    Ok(CommandOutcome::Success)
                } else {
                    Ok(CommandOutcome::Failed {
                        code: output.status.code(),
                        stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
                    })
                }
            }
            OutputMode::Stream => {
                let mut child = Self::command(spec)
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .spawn()
                    .map_err(launch_error)?;

                let (_, stderr) = tokio::join!(
                    forward_lines(child.stdout.take(), progress, false),
                    forward_lines(child.stderr.take(), progress, true),
                );

                let status = child.wait().await?;
                if status.success() {
                    Ok(CommandOutcome::Success)
                } else {
                    Ok(CommandOutcome::Failed { code: status.code(), stderr })
                }
            }
        }
    }
}

/// Forward each line of `reader` to `progress`, optionally keeping a copy.
///
/// Invalid UTF-8 is replaced rather than rejected. A read error ends
/// forwarding early but never prevents the child from being awaited.
async fn forward_lines<R>(reader: Option<R>, progress: &dyn ProgressSink, keep: bool) -> String
where
    R: AsyncRead + Unpin,
{
    let mut kept = String::new();
    let Some(reader) = reader else {
        return kept;
    };

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Stopped reading command output");
                break;
            }
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        let line = String::from_utf8_lossy(&buf).into_owned();
        if keep {
            if !kept.is_empty() {
                kept.push('\n');
            }
            kept.push_str(&line);
        }
        progress.on_event(ProgressEvent::Output { line });
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingProgressSink;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec { program: "sh".to_string(), args: vec!["-c".to_string(), script.to_string()] }
    }

    #[test]
    fn test_from_argv_and_display() {
        let spec = CommandSpec::from_argv(&["python3".to_string(), "merge.py".to_string()])
            .unwrap()
            .arg("--local_dir")
            .arg("ckpt/global_step_1/actor");
        assert_eq!(spec.to_string(), "python3 merge.py --local_dir ckpt/global_step_1/actor");
        assert!(CommandSpec::from_argv(&[]).is_err());
    }

    #[tokio::test]
    async fn test_capture_reports_stderr_on_failure() {
        let sink = RecordingProgressSink::default();
        let outcome = ProcessRunner::new()
            .run(&sh("echo boom >&2; exit 3"), OutputMode::Capture, &sink)
            .await
            .unwrap();

        assert_eq!(outcome, CommandOutcome::Failed { code: Some(3), stderr: "boom".to_string() });
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_stream_forwards_lines() {
        let sink = RecordingProgressSink::default();
        let outcome = ProcessRunner::new()
            .run(&sh("echo one; echo two"), OutputMode::Stream, &sink)
            .await
            .unwrap();

        assert!(outcome.is_success());
        let lines: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Output { line } => Some(line),
                _ => None,
            })
            .collect();
        assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
    }

    #[tokio::test]
    async fn test_stream_tolerates_invalid_utf8() {
        let sink = RecordingProgressSink::default();
        let outcome = ProcessRunner::new()
            .run(&sh("printf 'bad \\377 byte\\n'; echo ok; printf 'err \\376\\n' >&2"), OutputMode::Stream, &sink)
            .await
            .unwrap();

        assert!(outcome.is_success());
        let lines: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Output { line } => Some(line),
                _ => None,
            })
            .collect();
        assert!(lines.contains(&"bad \u{fffd} byte".to_string()));
        assert!(lines.contains(&"ok".to_string()));
        assert!(lines.contains(&"err \u{fffd}".to_string()));
    }

    #[tokio::test]
    async fn test_stream_failure_keeps_lossy_stderr() {
        let sink = RecordingProgressSink::default();
        let outcome = ProcessRunner::new()
            .run(&sh("printf 'oops \\377\\n' >&2; exit 2"), OutputMode::Stream, &sink)
            .await
            .unwrap();

        assert_eq!(outcome, CommandOutcome::Failed { code: Some(2), stderr: "oops \u{fffd}".to_string() });
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let sink = RecordingProgressSink::default();
        let spec = CommandSpec { program: "rlops-definitely-not-a-program".to_string(), args: vec![] };
        let err = ProcessRunner::new().run(&spec, OutputMode::Capture, &sink).await.unwrap_err();
        assert!(matches!(err, TrainingError::Launch { .. }));
    }
}
