use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::Signal;
use crate::AppState;

use super::ApiResponse;

const MAX_WINDOW_HOURS: i64 = 24 * 365;

#[derive(Debug, Deserialize)]
pub struct SignalQuery {
    /// Look-back window in hours (default 24).
    pub hours: Option<i64>,
    /// Only signals scoring strictly above this.
    pub min_confidence: Option<Decimal>,
    pub limit: Option<usize>,
}

/// GET /api/signals: newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<SignalQuery>,
) -> Json<ApiResponse<Vec<Signal>>> {
    let signals = state
        .signals
        .recent(
            Duration::hours(query.hours.unwrap_or(24).clamp(0, MAX_WINDOW_HOURS)),
            query.min_confidence.unwrap_or(Decimal::ZERO),
            query.limit.unwrap_or(100),
            Utc::now(),
        )
        .await;
    ApiResponse::ok(signals)
}
