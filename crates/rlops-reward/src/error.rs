use thiserror::Error;

pub type RewardResult<T> = std::result::Result<T, RewardError>;

/// Errors raised to the caller: the call itself was wrong.
#[derive(Debug, Error)]
pub enum RewardError {
    #[error("reward input must be a mapping with `response` and `ground_truth`, got {0}")]
    MalformedInput(&'static str),

    #[error("reward input is missing string field `{0}`")]
    MissingField(&'static str),

    #[error("format_weight must be within [0, 1], got {0}")]
    InvalidWeight(f64),

    #[error("unknown accuracy mode `{0}` (expected `exact` or `token-match`)")]
    UnknownMode(String),
}

/// Errors inside answer grading. The scorer turns these into a zero accuracy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradeError {
    #[error("ground truth is empty")]
    EmptyGroundTruth,

    #[error("unbalanced braces in `{0}`")]
    UnbalancedBraces(String),
}
