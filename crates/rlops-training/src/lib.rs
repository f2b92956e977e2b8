//! rlops Training
//!
//! Checkpoint-side tooling for an RL fine-tuning run:
//! - Discovering step checkpoints on disk (`scan`)
//! - Running external merge / validation commands over them (`driver`, `runner`)
//! - Reporting batch progress and outcomes (`progress`, `report`)
//! - Reshaping a multiple-choice VQA dataset into training records (`convert`)

pub mod convert;
pub mod dataset;
pub mod driver;
pub mod error;
pub mod layout;
pub mod progress;
pub mod report;
pub mod runner;
pub mod scan;

pub use convert::{ConversionOptions, convert_dataset, convert_record, split_train_test};
pub use dataset::{
    ConversionManifest, ConvertedRecord, DatasetId, ImageRef, SourceRecord, compute_dataset_id, read_jsonl,
    write_jsonl,
};
pub use driver::{BatchDriver, BatchJob, BatchKind, BatchOptions, BatchPlan, merge_job, plan_merge, plan_validation};
pub use error::{TrainingError, TrainingResult};
pub use layout::{CheckpointLayout, DatasetLayout, StepMarker};
pub use progress::{ProgressEvent, ProgressSink, RecordingProgressSink, StdoutProgressSink};
pub use report::{BatchReport, ItemReport, ItemStatus};
pub use runner::{CommandOutcome, CommandRunner, CommandSpec, OutputMode, ProcessRunner};
pub use scan::{StepDir, find_actor_shards, find_merged_models, find_step_dirs, sort_by_step_number};
