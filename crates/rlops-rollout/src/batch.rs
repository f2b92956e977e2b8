//! Shapes a rollout batch can arrive in before conversion.

use crate::error::{RolloutError, RolloutResult};
use crate::tensor::{NdArray, Tensor};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Scalar {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "a boolean",
            Self::Int(_) => "an integer",
            Self::Float(_) => "a float",
            Self::Text(_) => "a string",
            Self::Null => "null",
        }
    }
}

/// An element of a nested list.
#[derive(Debug, Clone, PartialEq)]
pub enum Nested {
    Scalar(Scalar),
    List(Vec<Nested>),
}

/// One field of a rollout batch.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Per-example values as (possibly nested) lists.
    List(Vec<Nested>),
    /// A typed array, possibly strided.
    Array(NdArray),
    /// Already a tensor; passed through.
    Tensor(Tensor),
    /// A single value for the whole batch.
    Scalar(Scalar),
}

pub type RolloutFields = BTreeMap<String, FieldValue>;

/// Element of an object array.
#[derive(Debug, Clone, PartialEq)]
pub enum PackedElement {
    Fields(RolloutFields),
    Value(FieldValue),
}

/// An array wrapper around the batch, as produced by dataset loaders.
#[derive(Debug, Clone, PartialEq)]
pub enum PackedArray {
    /// Heterogeneous elements; the first one is expected to be the field mapping.
    Object(Vec<PackedElement>),
    /// A plain numeric array, which cannot hold a field mapping.
    Numeric(NdArray),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RolloutInput {
    Fields(RolloutFields),
    Packed(PackedArray),
}

impl RolloutInput {
    /// Read a rollout batch from JSON.
    ///
    /// An object is a field mapping. A top-level array containing at least one
    /// object is an object array; any other array is a numeric array.
    pub fn from_json(value: Value) -> RolloutResult<Self> {
        match value {
            Value::Object(map) => Ok(Self::Fields(fields_from_json(map))),
            Value::Array(items) if items.iter().any(Value::is_object) => {
                let elements = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(map) => PackedElement::Fields(fields_from_json(map)),
                        other => PackedElement::Value(field_from_json(other)),
                    })
                    .collect();
                Ok(Self::Packed(PackedArray::Object(elements)))
            }
            Value::Array(items) => {
                let nested: Vec<Nested> = items.into_iter().map(nested_from_json).collect();
                let tensor = crate::convert::list_to_tensor("<batch>", &nested).map_err(|_| {
                    RolloutError::UnsupportedArray { dtype: "mixed".to_string() }
                })?;
                Ok(Self::Packed(PackedArray::Numeric(tensor.into_data())))
            }
            Value::String(_) => Err(RolloutError::NotAMapping { found: "a string" }),
            Value::Number(_) => Err(RolloutError::NotAMapping { found: "a number" }),
            Value::Bool(_) => Err(RolloutError::NotAMapping { found: "a boolean" }),
            Value::Null => Err(RolloutError::NotAMapping { found: "null" }),
        }
    }
}

fn fields_from_json(map: serde_json::Map<String, Value>) -> RolloutFields {
    map.into_iter().map(|(k, v)| (k, field_from_json(v))).collect()
}

fn field_from_json(value: Value) -> FieldValue {
    match value {
        Value::Array(items) => FieldValue::List(items.into_iter().map(nested_from_json).collect()),
        other => FieldValue::Scalar(scalar_from_json(other)),
    }
}

fn nested_from_json(value: Value) -> Nested {
    match value {
        Value::Array(items) => Nested::List(items.into_iter().map(nested_from_json).collect()),
        other => Nested::Scalar(scalar_from_json(other)),
    }
}

fn scalar_from_json(value: Value) -> Scalar {
    match value {
        Value::Bool(b) => Scalar::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Scalar::Int(i),
            None => Scalar::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => Scalar::Text(s),
        Value::Null => Scalar::Null,
        // Nested objects are not tensor data; keep the kind for the error message.
        Value::Array(_) | Value::Object(_) => Scalar::Text(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_is_field_mapping() {
        let input = RolloutInput::from_json(json!({"rewards": [1.0, 0.0], "step": 3})).unwrap();
        let RolloutInput::Fields(fields) = input else { panic!("expected fields") };
        assert!(matches!(fields["rewards"], FieldValue::List(_)));
        assert_eq!(fields["step"], FieldValue::Scalar(Scalar::Int(3)));
    }

    #[test]
    fn test_array_of_objects_is_object_array() {
        let input = RolloutInput::from_json(json!([{"ids": [[1, 2]]}])).unwrap();
        assert!(matches!(input, RolloutInput::Packed(PackedArray::Object(ref e)) if e.len() == 1));
    }

    #[test]
    fn test_array_of_numbers_is_numeric_array() {
        let input = RolloutInput::from_json(json!([[1, 2], [3, 4]])).unwrap();
        match input {
            RolloutInput::Packed(PackedArray::Numeric(array)) => assert_eq!(array.shape(), &[2, 2]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_plain_value_is_rejected() {
        let err = RolloutInput::from_json(json!("batch")).unwrap_err();
        assert!(matches!(err, RolloutError::NotAMapping { found: "a string" }));
    }
}
