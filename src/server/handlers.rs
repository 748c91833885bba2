use axum::{extract::State, Json};
use std::sync::Arc;

use crate::error::Result;
use crate::harness::decode_input;
use crate::postprocessing::softmax::{postprocess, Scores};
use crate::preprocessing::image::preprocess;
use crate::server::types::*;
use crate::tensor::{NamedTensors, TensorPayload};

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn preprocess_image(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PreprocessRequest>,
) -> Result<Json<PreprocessResponse>> {
    // 1. Decode Base64
    let image_bytes = decode_input(&payload.image)?;

    // 2. Preprocess
    let input_names = payload
        .input_names
        .as_deref()
        .unwrap_or(&state.model.input_names);
    let feeds = preprocess(&image_bytes, input_names)?;

    // 3. Flatten for the wire
    let response = feeds
        .iter()
        .map(|(name, tensor)| (name.clone(), TensorPayload::from(tensor)))
        .collect();

    Ok(Json(response))
}

pub async fn postprocess_scores(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PostprocessRequest>,
) -> Result<Json<Scores>> {
    let outputs = payload
        .outputs
        .into_iter()
        .map(|(name, tensor)| tensor.into_array().map(|array| (name, array)))
        .collect::<Result<NamedTensors>>()?;

    let labels = payload.labels.as_deref().unwrap_or(&state.model.labels);
    let output_names = payload
        .output_names
        .as_deref()
        .unwrap_or(&state.model.output_names);

    Ok(Json(postprocess(&outputs, labels, output_names)?))
}
