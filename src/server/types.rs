use crate::config::ModelConfig;
use crate::tensor::TensorPayload;
use serde::Deserialize;
use std::collections::HashMap;

/// Shared Application State
#[derive(Clone)]
pub struct AppState {
    pub model: ModelConfig,
}

// --- DTOs (Data Transfer Objects) ---

#[derive(Deserialize)]
pub struct PreprocessRequest {
    /// Base64 encoded image data
    pub image: String,
    /// Falls back to the configured model's input names.
    pub input_names: Option<Vec<String>>,
}

/// Input name → tensor, ready to hand to an inference session.
pub type PreprocessResponse = HashMap<String, TensorPayload>;

#[derive(Deserialize)]
pub struct PostprocessRequest {
    pub outputs: HashMap<String, TensorPayload>,
    pub labels: Option<Vec<String>>,
    pub output_names: Option<Vec<String>>,
}
