use crate::error::{RewardError, RewardResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `(response, ground_truth)` pair to score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardInput {
    pub response: String,
    pub ground_truth: String,
}

impl RewardInput {
    #[must_use]
    pub fn new(response: impl Into<String>, ground_truth: impl Into<String>) -> Self {
        Self { response: response.into(), ground_truth: ground_truth.into() }
    }

    /// Read a reward input from a JSON value.
    ///
    /// Anything other than an object is rejected outright; extra keys are ignored.
    pub fn from_value(value: &Value) -> RewardResult<Self> {
        let Value::Object(map) = value else {
            return Err(RewardError::MalformedInput(value_kind(value)));
        };

        let field = |name: &'static str| {
            map.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| RewardError::MissingField(name))
        };

        Ok(Self { response: field("response")?, ground_truth: field("ground_truth")? })
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_object() {
        let input = RewardInput::from_value(&json!({
            "response": "<answer>A</answer>",
            "ground_truth": "A",
            "extra": 1,
        }))
        .unwrap();
        assert_eq!(input, RewardInput::new("<answer>A</answer>", "A"));
    }

    #[test]
    fn test_bare_string_is_rejected() {
        let err = RewardInput::from_value(&json!("<answer>A</answer>")).unwrap_err();
        assert!(matches!(err, RewardError::MalformedInput("a string")));
    }

    #[test]
    fn test_missing_or_non_string_field() {
        let err = RewardInput::from_value(&json!({"response": "x"})).unwrap_err();
        assert!(matches!(err, RewardError::MissingField("ground_truth")));

        let err = RewardInput::from_value(&json!({"response": 1, "ground_truth": "1"})).unwrap_err();
        assert!(matches!(err, RewardError::MissingField("response")));
    }
}
