use crate::config::ModelConfig;
use crate::server::{handlers, types::AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn create_router(model: ModelConfig) -> Router {
    let state = Arc::new(AppState { model });

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/preprocess", post(handlers::preprocess_image))
        .route("/postprocess", post(handlers::postprocess_scores))
        .with_state(state)
}
