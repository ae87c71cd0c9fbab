use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::AppState;

/// Liveness plus a few cheap in-memory counters. Never touches the network.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "tracked_wallets": state.ledger.len().await,
        "dashboard_clients": state.ws_tx.receiver_count(),
    }))
}
