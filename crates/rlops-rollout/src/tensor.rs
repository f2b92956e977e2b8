use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Bool,
    Int64,
    Float64,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bool => "bool",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
        })
    }
}

/// A typed n-dimensional array in any memory layout.
#[derive(Debug, Clone, PartialEq)]
pub enum NdArray {
    Bool(ArrayD<bool>),
    Int64(ArrayD<i64>),
    Float64(ArrayD<f64>),
}

impl NdArray {
    #[must_use]
    pub fn dtype(&self) -> DType {
        match self {
            Self::Bool(_) => DType::Bool,
            Self::Int64(_) => DType::Int64,
            Self::Float64(_) => DType::Float64,
        }
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Bool(a) => a.shape(),
            Self::Int64(a) => a.shape(),
            Self::Float64(a) => a.shape(),
        }
    }

    fn is_standard_layout(&self) -> bool {
        match self {
            Self::Bool(a) => a.is_standard_layout(),
            Self::Int64(a) => a.is_standard_layout(),
            Self::Float64(a) => a.is_standard_layout(),
        }
    }

    fn into_standard_layout(self) -> Self {
        match self {
            Self::Bool(a) => Self::Bool(a.as_standard_layout().into_owned()),
            Self::Int64(a) => Self::Int64(a.as_standard_layout().into_owned()),
            Self::Float64(a) => Self::Float64(a.as_standard_layout().into_owned()),
        }
    }
}

/// A dense row-major tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: NdArray,
}

impl Tensor {
    /// Wrap an array, moving its buffer when it is already row-major and
    /// copying into row-major order otherwise.
    #[must_use]
    pub fn from_array(data: NdArray) -> Self {
        if data.is_standard_layout() {
            Self { data }
        } else {
            Self { data: data.into_standard_layout() }
        }
    }

    #[must_use]
    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Size of the leading (batch) dimension; `None` for 0-d tensors.
    #[must_use]
    pub fn leading_dim(&self) -> Option<usize> {
        self.shape().first().copied()
    }

    #[must_use]
    pub fn data(&self) -> &NdArray {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> NdArray {
        self.data
    }
}

impl From<ArrayD<bool>> for Tensor {
    fn from(a: ArrayD<bool>) -> Self {
        Self::from_array(NdArray::Bool(a))
    }
}

impl From<ArrayD<i64>> for Tensor {
    fn from(a: ArrayD<i64>) -> Self {
        Self::from_array(NdArray::Int64(a))
    }
}

impl From<ArrayD<f64>> for Tensor {
    fn from(a: ArrayD<f64>) -> Self {
        Self::from_array(NdArray::Float64(a))
    }
}

/// Field name to tensor, with a shared batch dimension when the fields agree on one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TensorDict {
    fields: BTreeMap<String, Tensor>,
}

impl TensorDict {
    #[must_use]
    pub fn new(fields: BTreeMap<String, Tensor>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Tensor> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Tensor)> {
        self.fields.iter()
    }

    /// Leading dimension shared by every field, if there is one.
    #[must_use]
    pub fn batch_size(&self) -> Option<usize> {
        let mut dims = self.fields.values().map(Tensor::leading_dim);
        let first = dims.next()??;
        dims.all(|d| d == Some(first)).then_some(first)
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Tensor> {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn test_from_array_keeps_standard_layout_buffer() {
        let a = ArrayD::from_shape_vec(IxDyn(&[2, 3]), vec![1i64, 2, 3, 4, 5, 6]).unwrap();
        let ptr = a.as_ptr();
        let t = Tensor::from(a);

        assert_eq!(t.dtype(), DType::Int64);
        assert_eq!(t.shape(), &[2, 3]);
        match t.data() {
            NdArray::Int64(inner) => assert_eq!(inner.as_ptr(), ptr),
            other => panic!("unexpected dtype {:?}", other.dtype()),
        }
    }

    #[test]
    fn test_from_array_copies_transposed_input() {
        let a = ArrayD::from_shape_vec(IxDyn(&[2, 3]), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let t = Tensor::from(a.reversed_axes());

        assert_eq!(t.shape(), &[3, 2]);
        match t.data() {
            NdArray::Float64(inner) => {
                assert!(inner.is_standard_layout());
                assert_eq!(inner.iter().copied().collect::<Vec<_>>(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
            }
            other => panic!("unexpected dtype {:?}", other.dtype()),
        }
    }

    #[test]
    fn test_batch_size() {
        let mut fields = BTreeMap::new();
        fields.insert("a".to_string(), Tensor::from(ArrayD::<f64>::zeros(IxDyn(&[4, 2]))));
        fields.insert("b".to_string(), Tensor::from(ArrayD::<i64>::zeros(IxDyn(&[4]))));
        assert_eq!(TensorDict::new(fields.clone()).batch_size(), Some(4));

        fields.insert("c".to_string(), Tensor::from(ArrayD::<bool>::from_elem(IxDyn(&[1]), true)));
        assert_eq!(TensorDict::new(fields).batch_size(), None);
        assert_eq!(TensorDict::default().batch_size(), None);
    }
}
