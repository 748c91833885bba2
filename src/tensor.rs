//! Named tensors exchanged with an inference engine.

use crate::error::{Result, TransformError};
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// String-keyed tensors, the shape of an ONNX session's feeds and fetches.
pub type NamedTensors = HashMap<String, ArrayD<f32>>;

/// Returns the first entry of a name list. `role` names the list in the error.
pub fn first_name<S: AsRef<str>>(names: &[S], role: &'static str) -> Result<String> {
    names
        .first()
        .map(|name| name.as_ref().to_string())
        .ok_or(TransformError::MissingName(role))
}

/// Row-major tensor in the `dims`/`data` form ONNX runtimes hand out.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TensorPayload {
    pub dims: Vec<usize>,
    pub data: Vec<f32>,
}

impl TensorPayload {
    pub fn into_array(self) -> Result<ArrayD<f32>> {
        Ok(ArrayD::from_shape_vec(IxDyn(&self.dims), self.data)?)
    }
}

impl From<&ArrayD<f32>> for TensorPayload {
    fn from(array: &ArrayD<f32>) -> Self {
        Self {
            dims: array.shape().to_vec(),
            data: array.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name() {
        let names = vec!["Input3".to_string(), "ignored".to_string()];
        assert_eq!(first_name(&names, "input").unwrap(), "Input3");
    }

    #[test]
    fn test_first_name_empty() {
        let names: Vec<&str> = Vec::new();
        match first_name(&names, "output") {
            Err(TransformError::MissingName("output")) => {}
            other => panic!("Expected MissingName, got {other:?}"),
        }
    }

    #[test]
    fn test_payload_into_array() {
        let payload = TensorPayload {
            dims: vec![2, 3],
            data: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        };
        let array = payload.into_array().unwrap();
        assert_eq!(array.shape(), &[2, 3]);
        assert_eq!(array[[1, 0]], 3.0);
    }

    #[test]
    fn test_payload_length_mismatch() {
        let payload = TensorPayload {
            dims: vec![2, 3],
            data: vec![0.0; 5],
        };
        match payload.into_array() {
            Err(TransformError::ShapeError(_)) => {}
            other => panic!("Expected ShapeError, got {other:?}"),
        }
    }

    #[test]
    fn test_payload_from_non_standard_layout() {
        let array = ndarray::Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .reversed_axes()
            .into_dyn();
        let payload = TensorPayload::from(&array);
        assert_eq!(payload.dims, vec![2, 2]);
        assert_eq!(payload.data, vec![1.0, 3.0, 2.0, 4.0]);
    }
}
