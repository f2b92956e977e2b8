//! Command implementations for the rlops CLI.

pub mod batch;
pub mod convert_dataset;
pub mod merge;
pub mod rollout;
pub mod score;
pub mod types;
pub mod validate;
