use crate::error::{Result, TransformError};
use crate::tensor::{first_name, NamedTensors};
use ndarray::{Axis, Ix2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-row class probabilities, serialized as `{"output": [[...], ...]}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Scores {
    pub output: Vec<Vec<f32>>,
}

/// Turns the raw scores at `output_names[0]` into row-wise softmax
/// probabilities. `labels` is accepted for class-name mapping and is not
/// read yet.
///
/// No max-subtraction happens before `exp`, so very large scores overflow
/// to `inf` and yield `NaN` rows.
///
/// Only `(N, C)` score tensors are accepted. Higher-rank outputs, which a
/// plain axis-1 normalization would also handle, are rejected with
/// `RankMismatch`.
pub fn postprocess<S: AsRef<str>>(
    out: &NamedTensors,
    _labels: &[String],
    output_names: &[S],
) -> Result<Scores> {
    let output_name = first_name(output_names, "output")?;
    let logits = out
        .get(&output_name)
        .ok_or_else(|| TransformError::OutputNotFound(output_name.clone()))?;

    let logits = logits
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| TransformError::RankMismatch {
            expected: 2,
            got: logits.shape().to_vec(),
        })?;

    let exps = logits.mapv(f32::exp);
    let sums = exps.sum_axis(Axis(1)).insert_axis(Axis(1));
    let probabilities = &exps / &sums;

    debug!(output = %output_name, rows = probabilities.nrows(), "normalized scores");

    Ok(Scores {
        output: probabilities
            .outer_iter()
            .map(|row| row.to_vec())
            .collect(),
    })
}
