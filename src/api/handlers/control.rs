use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

/// POST /api/control/stop: pause the copy engine. Open positions keep being
/// monitored.
pub async fn stop(State(state): State<AppState>) -> impl IntoResponse {
    state.pause_flag.store(true, Ordering::Relaxed);
    tracing::warn!("Copy engine PAUSED via control API");
    (StatusCode::OK, Json(json!({ "status": "paused" })))
}

/// POST /api/control/resume
pub async fn resume(State(state): State<AppState>) -> impl IntoResponse {
    state.pause_flag.store(false, Ordering::Relaxed);
    tracing::info!("Copy engine RESUMED via control API");
    (StatusCode::OK, Json(json!({ "status": "running" })))
}

/// GET /api/control/status
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let paused = state.pause_flag.load(Ordering::Relaxed);
    let summary = state.simulator.summary().await;

    Json(json!({
        "mode": "simulated",
        "paused": paused,
        "copy_enabled": state.config.copy_enabled,
        "classification_mode": state.config.classification_mode().to_string(),
        "balance": summary.balance,
        "open_positions": summary.open_positions,
        "telegram": state.notifier.is_some(),
    }))
}
