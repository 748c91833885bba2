use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ndarray::ShapeError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// A name list was empty where its first element is required.
    #[error("No {0} names supplied")]
    MissingName(&'static str),

    #[error("Output not found: {0}")]
    OutputNotFound(String),

    #[error("Output rank mismatch: expected {expected} dimensions, got shape {got:?}")]
    RankMismatch { expected: usize, got: Vec<usize> },

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Shape error: {0}")]
    ShapeError(#[from] ShapeError),
}

pub type Result<T> = std::result::Result<T, TransformError>;

impl IntoResponse for TransformError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            TransformError::Decode(_) => (StatusCode::BAD_REQUEST, "Invalid image data".to_string()),
            TransformError::MissingName(_)
            | TransformError::OutputNotFound(_)
            | TransformError::RankMismatch { .. }
            | TransformError::PreprocessingError(_)
            | TransformError::ShapeError(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            TransformError::InferenceError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
