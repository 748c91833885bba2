//! Runs a slice of encoded inputs through preprocess, an external inference
//! engine, and postprocess.
//!
//! A slice either yields scores for every file or fails as a whole with the
//! first failure, tagged with the stage that produced it.

use crate::error::{Result, TransformError};
use crate::postprocessing::softmax::{postprocess, Scores};
use crate::preprocessing::image::preprocess;
use crate::tensor::NamedTensors;
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// File id → base64-encoded input bytes.
pub type SliceData = BTreeMap<String, String>;

/// The model session the harness feeds. Loading and running the model is the
/// implementor's business.
pub trait InferenceEngine {
    fn input_names(&self) -> &[String];
    fn output_names(&self) -> &[String];
    fn run(&mut self, feeds: NamedTensors) -> Result<NamedTensors>;
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Preprocess,
    Inference,
    Postprocess,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Preprocess => "preprocess",
            Stage::Inference => "inference",
            Stage::Postprocess => "postprocess",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SliceFailure {
    pub code: Stage,
    pub msg: String,
    pub file: String,
}

impl SliceFailure {
    fn new(code: Stage, file: &str, error: TransformError) -> Self {
        warn!(stage = %code, file, "slice failed: {error}");
        Self {
            code,
            msg: error.to_string(),
            file: file.to_string(),
        }
    }
}

/// Processes every file of `slice` in key order.
pub fn run_slice<E: InferenceEngine + ?Sized>(
    engine: &mut E,
    slice: &SliceData,
    labels: &[String],
) -> std::result::Result<BTreeMap<String, Scores>, SliceFailure> {
    let total = slice.len();
    let mut results = BTreeMap::new();

    for (done, (file, encoded)) in slice.iter().enumerate() {
        debug!(progress = 0.2 + 0.8 * done as f64 / total as f64, file = %file);

        let feeds = decode_input(encoded)
            .and_then(|bytes| preprocess(&bytes, engine.input_names()))
            .map_err(|e| SliceFailure::new(Stage::Preprocess, file, e))?;

        let outputs = engine
            .run(feeds)
            .map_err(|e| SliceFailure::new(Stage::Inference, file, e))?;

        let scores = postprocess(&outputs, labels, engine.output_names())
            .map_err(|e| SliceFailure::new(Stage::Postprocess, file, e))?;

        results.insert(file.clone(), scores);
    }

    debug!(progress = 1.0, files = total, "slice complete");
    Ok(results)
}

pub(crate) fn decode_input(encoded: &str) -> Result<Vec<u8>> {
    general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| TransformError::PreprocessingError(format!("Base64 decode failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use ndarray::arr2;
    use std::io::Cursor;

    /// Scores each input by its mean brightness: `[[1 - mean, mean]]`.
    struct BrightnessEngine {
        inputs: Vec<String>,
        outputs: Vec<String>,
        produces: String,
        calls: usize,
        fail: bool,
    }

    impl BrightnessEngine {
        fn new() -> Self {
            Self {
                inputs: vec!["Input3".to_string()],
                outputs: vec!["Plus214_Output_0".to_string()],
                produces: "Plus214_Output_0".to_string(),
                calls: 0,
                fail: false,
            }
        }
    }

    impl InferenceEngine for BrightnessEngine {
        fn input_names(&self) -> &[String] {
            &self.inputs
        }

        fn output_names(&self) -> &[String] {
            &self.outputs
        }

        fn run(&mut self, feeds: NamedTensors) -> Result<NamedTensors> {
            self.calls += 1;
            if self.fail {
                return Err(TransformError::InferenceError("session closed".to_string()));
            }
            let mean = feeds[&self.inputs[0]].mean().unwrap_or(0.0);

            let mut out = NamedTensors::new();
            out.insert(self.produces.clone(), arr2(&[[1.0 - mean, mean]]).into_dyn());
            Ok(out)
        }
    }

    fn encoded_png(level: u8) -> String {
        let img = RgbImage::from_pixel(6, 6, image::Rgb([level, level, level]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        general_purpose::STANDARD.encode(buffer)
    }

    #[test]
    fn test_run_slice_scores_every_file() {
        let mut engine = BrightnessEngine::new();
        let mut slice = SliceData::new();
        slice.insert("black.png".to_string(), encoded_png(0));
        slice.insert("white.png".to_string(), encoded_png(255));

        let results = run_slice(&mut engine, &slice, &[]).unwrap();

        assert_eq!(engine.calls, 2);
        assert_eq!(results.len(), 2);
        let black = &results["black.png"].output[0];
        let white = &results["white.png"].output[0];
        assert!(black[0] > black[1]);
        assert!(white[1] > white[0]);
        for row in [black, white] {
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_slice() {
        let mut engine = BrightnessEngine::new();
        let results = run_slice(&mut engine, &SliceData::new(), &[]).unwrap();
        assert!(results.is_empty());
        assert_eq!(engine.calls, 0);
    }

    #[test]
    fn test_bad_base64_is_a_preprocess_failure() {
        let mut engine = BrightnessEngine::new();
        let mut slice = SliceData::new();
        slice.insert("a.png".to_string(), encoded_png(0));
        slice.insert("b.png".to_string(), "not base64!".to_string());

        let failure = run_slice(&mut engine, &slice, &[]).unwrap_err();

        assert_eq!(failure.code, Stage::Preprocess);
        assert_eq!(failure.file, "b.png");
        assert!(failure.msg.starts_with("Preprocessing error: Base64 decode failed"));
        assert_eq!(engine.calls, 1);
    }

    #[test]
    fn test_undecodable_image_is_a_preprocess_failure() {
        let mut engine = BrightnessEngine::new();
        let mut slice = SliceData::new();
        slice.insert("junk".to_string(), general_purpose::STANDARD.encode(b"junk"));

        let failure = run_slice(&mut engine, &slice, &[]).unwrap_err();
        assert_eq!(failure.code, Stage::Preprocess);
        assert_eq!(engine.calls, 0);
    }

    #[test]
    fn test_engine_error_is_an_inference_failure() {
        let mut engine = BrightnessEngine::new();
        engine.fail = true;
        let mut slice = SliceData::new();
        slice.insert("a.png".to_string(), encoded_png(0));

        let failure = run_slice(&mut engine, &slice, &[]).unwrap_err();
        assert_eq!(failure.code, Stage::Inference);
        assert_eq!(failure.msg, "Inference error: session closed");
    }

    #[test]
    fn test_missing_output_is_a_postprocess_failure() {
        let mut engine = BrightnessEngine::new();
        engine.outputs = vec!["missing".to_string()];
        let mut slice = SliceData::new();
        slice.insert("a.png".to_string(), encoded_png(0));

        let failure = run_slice(&mut engine, &slice, &[]).unwrap_err();
        assert_eq!(failure.code, Stage::Postprocess);
        assert_eq!(failure.file, "a.png");
    }

    #[test]
    fn test_failure_serializes_lowercase_code() {
        let failure = SliceFailure {
            code: Stage::Postprocess,
            msg: "Output not found: x".to_string(),
            file: "a.png".to_string(),
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "code": "postprocess", "msg": "Output not found: x", "file": "a.png" })
        );
    }
}
