//! Discovery of step checkpoints under a checkpoint root.

use crate::error::TrainingResult;
use crate::layout::{STEP_PREFIX, StepMarker};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A step checkpoint whose marker directory exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDir {
    /// Suffix of the directory name after `global_step_`.
    pub step_id: String,
    /// Path of the marker directory (`<root>/global_step_<N>/<marker>`).
    pub path: PathBuf,
}

impl StepDir {
    /// Numeric value of the step id, if it is one.
    #[must_use]
    pub fn step_number(&self) -> Option<u64> {
        self.step_id.parse().ok()
    }
}

/// Find every `global_step_*` child of `root` that contains `marker` as a directory.
///
/// A missing root is not an error: a warning is logged and the result is empty.
/// Results are sorted lexicographically by path, so `global_step_10` comes
/// before `global_step_2`; see [`sort_by_step_number`] for step order.
pub fn find_step_dirs(root: &Path, marker: StepMarker) -> TrainingResult<Vec<StepDir>> {
    let dir = match std::fs::read_dir(root) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(root = %root.display(), "Checkpoint directory does not exist");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let relative = marker.relative_path();
    let mut out = Vec::new();

    for entry in dir {
        let entry = entry?;
        let step_dir = entry.path();
        if !step_dir.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(step_id) = name.to_str().and_then(|n| n.strip_prefix(STEP_PREFIX)) else {
            continue;
        };

        let marker_path = step_dir.join(&relative);
        if !marker_path.is_dir() {
            debug!(step_dir = %step_dir.display(), "Skipping step without marker directory");
            continue;
        }

        out.push(StepDir { step_id: step_id.to_string(), path: marker_path });
    }

    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}

/// Actor shard directories (`global_step_*/actor`) under `root`.
pub fn find_actor_shards(root: &Path) -> TrainingResult<Vec<StepDir>> {
    find_step_dirs(root, StepMarker::Actor)
}

/// Merged model directories (`global_step_*/actor/huggingface`) under `root`.
pub fn find_merged_models(root: &Path) -> TrainingResult<Vec<StepDir>> {
    find_step_dirs(root, StepMarker::Merged)
}

/// Re-sort by numeric step; non-numeric step ids go last, in path order.
pub fn sort_by_step_number(dirs: &mut [StepDir]) {
    dirs.sort_by(|a, b| match (a.step_number(), b.step_number()) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.path.cmp(&b.path)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.path.cmp(&b.path),
    });
}
