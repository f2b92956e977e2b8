//! rlops Core - shared configuration for the rlops tooling.
//!
//! The batch drivers, reward scorer and dataset tools all read their
//! defaults from one TOML configuration, discovered from the user's home
//! directory and the current working directory.

pub mod config;

pub use config::cli_config::{
    CliConfig, CliConfigError, CliConfigResult, CommandConfig, DEFAULT_MERGE_PROGRAM, DEFAULT_VALIDATE_PROGRAM,
    RewardConfig,
};
