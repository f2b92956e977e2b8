//! CLI configuration loading and merging.

use anyhow::{Context, Result};
use rlops_core::{CliConfig, CliConfigError};
use std::path::Path;

/// Load and merge CLI configuration.
///
/// Configuration precedence:
/// 1. CLI arguments (handled by the commands)
/// 2. Explicit `--config` file
/// 3. Local config file (./.rlopsrc)
/// 4. Global config file (~/.rlops/config.toml)
/// 5. Defaults
///
/// Discovered files that could not be used are returned alongside the
/// config; an unusable explicit file is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<(CliConfig, Vec<CliConfigError>)> {
    let (mut config, skipped) = CliConfig::discover_and_load();

    if let Some(path) = explicit {
        let file = CliConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        config.merge(&file);
    }

    Ok((config, skipped))
}
