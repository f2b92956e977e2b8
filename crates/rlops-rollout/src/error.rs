use thiserror::Error;

pub type RolloutResult<T> = std::result::Result<T, RolloutError>;

#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("cannot convert array of dtype {dtype} to a TensorDict; expected an object array holding a field mapping")]
    UnsupportedArray { dtype: String },

    #[error("rollout batch must be a field mapping or an object array, got {found}")]
    NotAMapping { found: &'static str },

    #[error("field `{field}`: ragged nested list ({detail})")]
    Ragged { field: String, detail: String },

    #[error("field `{field}`: cannot make a tensor from {found}")]
    NonNumeric { field: String, found: &'static str },

    #[error("field `{field}`: {source}")]
    Shape {
        field: String,
        #[source]
        source: ndarray::ShapeError,
    },
}
