//! rlops Rollout
//!
//! Normalization of per-step rollout batches into a `TensorDict`: one dense,
//! batch-first tensor per field, whatever shape the fields arrived in.

pub mod batch;
pub mod convert;
pub mod error;
pub mod tensor;

pub use batch::{FieldValue, Nested, PackedArray, PackedElement, RolloutFields, RolloutInput, Scalar};
pub use convert::{convert_rollout_batch, field_to_tensor};
pub use error::{RolloutError, RolloutResult};
pub use tensor::{DType, NdArray, Tensor, TensorDict};
