//! Configuration module for rlops Core.

pub mod cli_config;
