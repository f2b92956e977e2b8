//! rlops Reward
//!
//! Rule-based rewards for `<think>…</think><answer>…</answer>` responses:
//! - `format` checks the tag structure of the whole response
//! - `accuracy` grades the extracted answer against the ground truth
//! - `overall` blends the two with a fixed format weight

pub mod error;
pub mod grader;
pub mod input;
pub mod scorer;

pub use error::{GradeError, RewardError, RewardResult};
pub use grader::{grade_answer, normalize_answer};
pub use input::RewardInput;
pub use scorer::{
    AccuracyMode, AccuracyOutcome, DEFAULT_FORMAT_WEIGHT, RewardScorer, Score, ScoreReport, exact_accuracy,
    format_score, token_match_accuracy,
};
