use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::models::{PnlRecord, PositionStatus};
use crate::AppState;

use super::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct TradeQuery {
    /// `open` or `closed`; both when omitted.
    pub status: Option<String>,
}

/// GET /api/trades: the PnL ledger, newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<TradeQuery>,
) -> Json<ApiResponse<Vec<PnlRecord>>> {
    let wanted = match query.status.as_deref().map(str::to_lowercase).as_deref() {
        Some("open") => Some(PositionStatus::Open),
        Some("closed") => Some(PositionStatus::Closed),
        _ => None,
    };

    let mut records: Vec<PnlRecord> = state
        .simulator
        .pnl_ledger()
        .await
        .into_iter()
        .filter(|r| wanted.map_or(true, |status| r.status == status))
        .collect();
    records.reverse();

    ApiResponse::ok(records)
}
