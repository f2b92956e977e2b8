use crate::error::{RewardError, RewardResult};
use crate::grader::grade_answer;
use crate::input::RewardInput;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_FORMAT_WEIGHT: f64 = 0.1;

static FORMAT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A<think>.*?</think>\s*<answer>.*?</answer>\z").expect("format regex should be valid")
});

static ANSWER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<answer>(.*?)</answer>").expect("answer regex should be valid"));

static TOKEN_SEPARATOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ .,:;]+").expect("token separator regex should be valid"));

/// 1.0 when the whole response is a think block followed by an answer block.
pub fn format_score(response: &str) -> f64 {
    if FORMAT_REGEX.is_match(response) { 1.0 } else { 0.0 }
}

/// Result of grading the answer part of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum AccuracyOutcome {
    Matched,
    Mismatched,
    /// Grading raised an error; scored as zero.
    Failed(String),
}

impl AccuracyOutcome {
    #[must_use]
    pub fn score(&self) -> f64 {
        match self {
            Self::Matched => 1.0,
            Self::Mismatched | Self::Failed(_) => 0.0,
        }
    }
}

fn graded(given: &str, truth: &str) -> Result<bool, String> {
    grade_answer(given, truth).map_err(|e| e.to_string())
}

/// Grade the tagged answer (or the whole response when untagged) as one value.
///
/// Whitespace is removed before the tags are searched for.
pub fn exact_accuracy(response: &str, ground_truth: &str) -> AccuracyOutcome {
    let compact: String = response.chars().filter(|c| !c.is_whitespace()).collect();
    let given = match ANSWER_REGEX.captures(&compact) {
        Some(caps) => caps[1].trim().to_string(),
        None => response.trim().to_string(),
    };

    match graded(&given, ground_truth.trim()) {
        Ok(true) => AccuracyOutcome::Matched,
        Ok(false) => AccuracyOutcome::Mismatched,
        Err(reason) => AccuracyOutcome::Failed(reason),
    }
}

/// Grade each token of the tagged answer; any matching token counts.
///
/// Untagged responses score zero. Tokens are separated by runs of space,
/// period, comma, colon or semicolon.
pub fn token_match_accuracy(response: &str, ground_truth: &str) -> AccuracyOutcome {
    let flat = response.replace(['\n', '\r'], "");
    let Some(caps) = ANSWER_REGEX.captures(&flat) else {
        return AccuracyOutcome::Mismatched;
    };

    let target = ground_truth.trim();
    let tokens = TOKEN_SEPARATOR_REGEX.split(caps[1].trim()).map(str::trim).filter(|t| !t.is_empty());
    for token in tokens {
        match graded(token, target) {
            Ok(true) => return AccuracyOutcome::Matched,
            Ok(false) => {}
            Err(reason) => return AccuracyOutcome::Failed(reason),
        }
    }
    AccuracyOutcome::Mismatched
}

/// How the answer part is graded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccuracyMode {
    /// Whole extracted answer against the ground truth.
    #[default]
    Exact,
    /// Any token of the extracted answer against the ground truth.
    TokenMatch,
}

impl AccuracyMode {
    fn grade(self, response: &str, ground_truth: &str) -> AccuracyOutcome {
        match self {
            Self::Exact => exact_accuracy(response, ground_truth),
            Self::TokenMatch => token_match_accuracy(response, ground_truth),
        }
    }
}

impl FromStr for AccuracyMode {
    type Err = RewardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "token-match" | "token_match" => Ok(Self::TokenMatch),
            other => Err(RewardError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for AccuracyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exact => "exact",
            Self::TokenMatch => "token-match",
        })
    }
}

/// The score mapping handed to the trainer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub overall: f64,
    pub format: f64,
    pub accuracy: f64,
}

/// A score together with how the accuracy was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    #[serde(flatten)]
    pub score: Score,
    pub accuracy_outcome: AccuracyOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardScorer {
    mode: AccuracyMode,
    format_weight: f64,
}

impl Default for RewardScorer {
    fn default() -> Self {
        Self { mode: AccuracyMode::Exact, format_weight: DEFAULT_FORMAT_WEIGHT }
    }
}

impl RewardScorer {
    /// `format_weight` must lie in [0, 1] so that `overall` stays in [0, 1].
    pub fn new(mode: AccuracyMode, format_weight: f64) -> RewardResult<Self> {
        if !(0.0..=1.0).contains(&format_weight) {
            return Err(RewardError::InvalidWeight(format_weight));
        }
        Ok(Self { mode, format_weight })
    }

    #[must_use]
    pub fn mode(&self) -> AccuracyMode {
        self.mode
    }

    #[must_use]
    pub fn format_weight(&self) -> f64 {
        self.format_weight
    }

    pub fn score(&self, input: &RewardInput) -> ScoreReport {
        let format = format_score(&input.response);
        let outcome = self.mode.grade(&input.response, &input.ground_truth);
        if let AccuracyOutcome::Failed(reason) = &outcome {
            debug!(mode = %self.mode, reason = %reason, "Accuracy grading failed; scoring zero");
        }

        let accuracy = outcome.score();
        let overall = (1.0 - self.format_weight).mul_add(accuracy, self.format_weight * format);
        ScoreReport { score: Score { overall, format, accuracy }, accuracy_outcome: outcome }
    }

    /// Score a raw JSON reward input.
    ///
    /// Inputs that are not a mapping with string `response` and
    /// `ground_truth` fields are an error; grading problems are not.
    pub fn compute_score(&self, input: &Value) -> RewardResult<Score> {
        let input = RewardInput::from_value(input)?;
        Ok(self.score(&input).score)
    }
}
