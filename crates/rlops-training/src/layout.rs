use std::path::{Path, PathBuf};

/// Directory-name prefix of a step checkpoint (`global_step_<N>`).
pub const STEP_PREFIX: &str = "global_step_";

/// Actor shard directory inside a step checkpoint.
pub const ACTOR_DIR: &str = "actor";

/// Merged-model directory inside an actor shard.
pub const MERGED_DIR: &str = "huggingface";

/// Which artifact of a step checkpoint a scan looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMarker {
    /// `actor/`: raw parameter shards, input to merging.
    Actor,
    /// `actor/huggingface/`: merged model, input to validation.
    Merged,
}

impl StepMarker {
    /// Path of the marker relative to a step directory.
    #[must_use]
    pub fn relative_path(self) -> PathBuf {
        match self {
            Self::Actor => PathBuf::from(ACTOR_DIR),
            Self::Merged => Path::new(ACTOR_DIR).join(MERGED_DIR),
        }
    }
}

/// Filesystem layout of a checkpoint root.
///
/// ```text
/// <root>/global_step_<N>/actor/               pre-merge shards
/// <root>/global_step_<N>/actor/huggingface/   merged model
/// ```
#[derive(Debug, Clone)]
pub struct CheckpointLayout {
    root: PathBuf,
}

impl CheckpointLayout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn step_dir(&self, step_id: &str) -> PathBuf {
        self.root.join(format!("{STEP_PREFIX}{step_id}"))
    }

    #[must_use]
    pub fn actor_dir(&self, step_id: &str) -> PathBuf {
        self.step_dir(step_id).join(ACTOR_DIR)
    }

    #[must_use]
    pub fn merged_dir(&self, step_id: &str) -> PathBuf {
        self.actor_dir(step_id).join(MERGED_DIR)
    }
}

/// True when `path` is itself a merged-model directory.
#[must_use]
pub fn is_merged_model_path(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == MERGED_DIR)
        && path
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|name| name == ACTOR_DIR)
}

/// Output layout of a dataset conversion.
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn split_path(&self, split: &str) -> PathBuf {
        self.root.join(format!("{split}.jsonl"))
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("conversion_manifest.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = CheckpointLayout::new(PathBuf::from("ckpt"));

        assert_eq!(layout.step_dir("7"), PathBuf::from("ckpt/global_step_7"));
        assert_eq!(layout.actor_dir("7"), PathBuf::from("ckpt/global_step_7/actor"));
        assert_eq!(layout.merged_dir("7"), PathBuf::from("ckpt/global_step_7/actor/huggingface"));
        assert_eq!(StepMarker::Merged.relative_path(), PathBuf::from("actor/huggingface"));
    }

    #[test]
    fn test_is_merged_model_path() {
        let layout = CheckpointLayout::new(PathBuf::from("ckpt"));
        assert!(is_merged_model_path(&layout.merged_dir("3")));
        assert!(!is_merged_model_path(&layout.actor_dir("3")));
        assert!(!is_merged_model_path(Path::new("elsewhere/huggingface")));
    }
}
