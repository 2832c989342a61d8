use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::app_state::AppState;

pub type SharedState = Arc<RwLock<AppState>>;

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Serves the exposition rendered by the last poll. Until the first poll
/// finishes the body is empty.
pub async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        state.metrics.clone(),
    )
}

pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    if state.loading {
        (StatusCode::SERVICE_UNAVAILABLE, "loading")
    } else {
        (StatusCode::OK, "ok")
    }
}
