//! Rollout batch to `TensorDict` conversion.

use crate::batch::{FieldValue, Nested, PackedArray, PackedElement, RolloutInput, Scalar};
use crate::error::{RolloutError, RolloutResult};
use crate::tensor::{NdArray, Tensor, TensorDict};
use ndarray::{ArrayD, IxDyn};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Convert a rollout batch into one tensor per field.
///
/// Object arrays are unwrapped to their first element, which must be a field
/// mapping. Conversion is all-or-nothing: the first field that cannot be made
/// into a tensor fails the whole batch.
pub fn convert_rollout_batch(input: RolloutInput) -> RolloutResult<TensorDict> {
    let fields = match input {
        RolloutInput::Fields(fields) => fields,
        RolloutInput::Packed(PackedArray::Numeric(array)) => {
            return Err(RolloutError::UnsupportedArray { dtype: array.dtype().to_string() });
        }
        RolloutInput::Packed(PackedArray::Object(elements)) => {
            let count = elements.len();
            let Some(first) = elements.into_iter().next() else {
                return Err(RolloutError::UnsupportedArray { dtype: "object (empty)".to_string() });
            };
            if count > 1 {
                warn!(ignored = count - 1, "Object array holds more than one element; using the first");
            }
            match first {
                PackedElement::Fields(fields) => fields,
                PackedElement::Value(value) => {
                    return Err(RolloutError::NotAMapping { found: value_kind(&value) });
                }
            }
        }
    };

    let mut tensors = BTreeMap::new();
    for (name, value) in fields {
        let tensor = field_to_tensor(&name, value)?;
        debug!(field = %name, dtype = %tensor.dtype(), shape = ?tensor.shape(), "Converted field");
        tensors.insert(name, tensor);
    }
    Ok(TensorDict::new(tensors))
}

/// Convert one field value into a tensor.
pub fn field_to_tensor(name: &str, value: FieldValue) -> RolloutResult<Tensor> {
    match value {
        FieldValue::List(items) => list_to_tensor(name, &items),
        FieldValue::Array(array) => Ok(Tensor::from_array(array)),
        FieldValue::Tensor(tensor) => Ok(tensor),
        FieldValue::Scalar(scalar) => list_to_tensor(name, &[Nested::Scalar(scalar)]),
    }
}

fn value_kind(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::List(_) => "a list",
        FieldValue::Array(_) => "an array",
        FieldValue::Tensor(_) => "a tensor",
        FieldValue::Scalar(scalar) => scalar.kind(),
    }
}

/// Build a dense tensor from a nested list.
///
/// Element type is promoted bool < int64 < float64; an empty list is a
/// `float64` tensor of shape `[0]`.
pub(crate) fn list_to_tensor(name: &str, items: &[Nested]) -> RolloutResult<Tensor> {
    let shape = infer_shape(name, items)?;

    let mut leaves = Vec::new();
    collect_leaves(items, &mut leaves);

    if let Some(bad) = leaves.iter().find(|s| matches!(s, Scalar::Text(_) | Scalar::Null)) {
        return Err(RolloutError::NonNumeric { field: name.to_string(), found: bad.kind() });
    }

    let shape = IxDyn(&shape);
    let shape_err = |source: ndarray::ShapeError| RolloutError::Shape { field: name.to_string(), source };

    let any_float = leaves.iter().any(|s| matches!(s, Scalar::Float(_)));
    let any_int = leaves.iter().any(|s| matches!(s, Scalar::Int(_)));

    let array = if leaves.is_empty() || any_float {
        let data = leaves.iter().map(|s| as_f64(s)).collect();
        NdArray::Float64(ArrayD::from_shape_vec(shape, data).map_err(shape_err)?)
    } else if any_int {
        let data = leaves.iter().map(|s| as_i64(s)).collect();
        NdArray::Int64(ArrayD::from_shape_vec(shape, data).map_err(shape_err)?)
    } else {
        let data = leaves.iter().map(|s| matches!(s, Scalar::Bool(true))).collect();
        NdArray::Bool(ArrayD::from_shape_vec(shape, data).map_err(shape_err)?)
    };

    Ok(Tensor::from_array(array))
}

fn infer_shape(name: &str, items: &[Nested]) -> RolloutResult<Vec<usize>> {
    let mut shape = vec![items.len()];
    match items.first() {
        None => {}
        Some(Nested::Scalar(_)) => {
            if items.iter().any(|item| matches!(item, Nested::List(_))) {
                return Err(ragged(name, "mixes scalars and lists at one level"));
            }
        }
        Some(Nested::List(first)) => {
            let inner = infer_shape(name, first)?;
            for (index, item) in items.iter().enumerate().skip(1) {
                let Nested::List(sub) = item else {
                    return Err(ragged(name, "mixes scalars and lists at one level"));
                };
                let sub_shape = infer_shape(name, sub)?;
                if sub_shape != inner {
                    return Err(ragged(
                        name,
                        &format!("element {index} has shape {sub_shape:?}, expected {inner:?}"),
                    ));
                }
            }
            shape.extend(inner);
        }
    }
    Ok(shape)
}

fn ragged(name: &str, detail: &str) -> RolloutError {
    RolloutError::Ragged { field: name.to_string(), detail: detail.to_string() }
}

fn collect_leaves<'a>(items: &'a [Nested], out: &mut Vec<&'a Scalar>) {
    for item in items {
        match item {
            Nested::Scalar(s) => out.push(s),
            Nested::List(sub) => collect_leaves(sub, out),
        }
    }
}

fn as_f64(s: &Scalar) -> f64 {
    match s {
        Scalar::Bool(b) => f64::from(u8::from(*b)),
        Scalar::Int(i) => *i as f64,
        Scalar::Float(f) => *f,
        Scalar::Text(_) | Scalar::Null => f64::NAN,
    }
}

fn as_i64(s: &Scalar) -> i64 {
    match s {
        Scalar::Bool(b) => i64::from(*b),
        Scalar::Int(i) => *i,
        Scalar::Float(_) | Scalar::Text(_) | Scalar::Null => 0,
    }
}
