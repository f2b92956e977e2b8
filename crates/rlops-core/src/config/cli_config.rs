//! Config file for the `rlops` CLI.
//!
//! Provides the configuration structure for the batch drivers and the
//! reward scorer, and the discovery/merge rules used to load it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default merge program; the actor directory is appended as `--local_dir <path>`.
pub const DEFAULT_MERGE_PROGRAM: &[&str] = &["python3", "scripts/model_merger.py"];

/// Default validation program; the model path is appended twice (actor, rollout).
pub const DEFAULT_VALIDATE_PROGRAM: &[&str] = &["bash", "shell_scripts/val_only/validate.sh"];

/// Settings shared by every `rlops` subcommand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Log level
    #[serde(default)]
    pub log_level: Option<String>,

    /// Checkpoint roots scanned by `merge` and `validate`
    #[serde(default)]
    pub checkpoint_roots: Vec<PathBuf>,

    /// External merge command
    #[serde(default)]
    pub merge: CommandConfig,

    /// External validation command
    #[serde(default)]
    pub validate: CommandConfig,

    /// Reward scoring defaults
    #[serde(default)]
    pub reward: RewardConfig,
}

/// An external command, as program followed by its leading arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandConfig {
    #[serde(default)]
    pub program: Option<Vec<String>>,
}

impl CommandConfig {
    /// The configured program, or `default` when unset or empty.
    pub fn program_or(&self, default: &[&str]) -> Vec<String> {
        match &self.program {
            Some(program) if !program.is_empty() => program.clone(),
            _ => default.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Reward scoring defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RewardConfig {
    /// Weight of the format score in the overall score
    #[serde(default)]
    pub format_weight: Option<f64>,

    /// Accuracy mode (`exact` or `token-match`)
    #[serde(default)]
    pub mode: Option<String>,
}

/// Why a config file could not be used.
#[derive(Debug, Error)]
pub enum CliConfigError {
    #[error("config file {0} does not exist")]
    NotFound(String),

    #[error("cannot read config file {0}")]
    ReadError(String),

    #[error("malformed config file {0}")]
    ParseError(String),

    #[error("invalid config: {0}")]
    InvalidValue(String),
}

pub type CliConfigResult<T> = std::result::Result<T, CliConfigError>;

impl CliConfig {
    /// Parse and check one TOML config file.
    pub fn load_from_file(path: &Path) -> CliConfigResult<Self> {
        if !path.exists() {
            return Err(CliConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| CliConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| CliConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// `~/.rlops/config.toml`
    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".rlops")
            .join("config.toml")
    }

    /// `./.rlopsrc`
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".rlopsrc")
    }

    /// Discover and load configuration files.
    ///
    /// Loads configuration from:
    /// 1. Global config (~/.rlops/config.toml)
    /// 2. Local config (./.rlopsrc)
    ///
    /// Local config overrides global config. Missing files are ignored;
    /// files that exist but cannot be used are skipped and returned so the
    /// caller can report them once logging is up.
    pub fn discover_and_load() -> (Self, Vec<CliConfigError>) {
        Self::load_layered(&[Self::default_global_path(), Self::default_local_path()])
    }

    fn load_layered(paths: &[PathBuf]) -> (Self, Vec<CliConfigError>) {
        let mut config = Self::default();
        let mut skipped = Vec::new();

        for path in paths {
            match Self::load_from_file(path) {
                Ok(found) => config.merge(&found),
                Err(CliConfigError::NotFound(_)) => {}
                Err(e) => skipped.push(e),
            }
        }

        (config, skipped)
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are set.
    pub fn merge(&mut self, other: &Self) {
        if let Some(ref log_level) = other.log_level {
            self.log_level = Some(log_level.clone());
        }
        if !other.checkpoint_roots.is_empty() {
            self.checkpoint_roots = other.checkpoint_roots.clone();
        }
        if other.merge.program.is_some() {
            self.merge.program = other.merge.program.clone();
        }
        if other.validate.program.is_some() {
            self.validate.program = other.validate.program.clone();
        }
        if other.reward.format_weight.is_some() {
            self.reward.format_weight = other.reward.format_weight;
        }
        if let Some(ref mode) = other.reward.mode {
            self.reward.mode = Some(mode.clone());
        }
    }

    fn validate(&self) -> CliConfigResult<()> {
        if let Some(w) = self.reward.format_weight {
            if !(0.0..=1.0).contains(&w) {
                return Err(CliConfigError::InvalidValue(format!(
                    "reward.format_weight must be within [0, 1], got {w}"
                )));
            }
        }
        if matches!(&self.merge.program, Some(p) if p.is_empty()) {
            return Err(CliConfigError::InvalidValue("merge.program must not be empty".to_string()));
        }
        if matches!(&self.validate.program, Some(p) if p.is_empty()) {
            return Err(CliConfigError::InvalidValue("validate.program must not be empty".to_string()));
        }
        Ok(())
    }
}
