use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{WalletStat, WhaleHistoryEntry};
use crate::AppState;

use super::ApiResponse;

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct WalletSummary {
    #[serde(flatten)]
    pub stat: WalletStat,
    pub success_rate: Decimal,
}

#[derive(Serialize)]
pub struct WalletDetail {
    #[serde(flatten)]
    pub stat: WalletStat,
    pub success_rate: Decimal,
    pub history: Vec<WhaleHistoryEntry>,
}

/// GET /api/wallets?limit=N: tracked wallets ranked by volume.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ApiResponse<Vec<WalletSummary>>> {
    let window = state.signals.policy().success_window_hours;
    let now = Utc::now();

    let mut wallets = Vec::new();
    for stat in state.ledger.top_by_volume(query.limit.unwrap_or(DEFAULT_LIMIT)).await {
        let success_rate = state.ledger.success_rate(&stat.address, window, now).await;
        wallets.push(WalletSummary { stat, success_rate });
    }
    ApiResponse::ok(wallets)
}

/// GET /api/wallets/:address: aggregate plus the whale history entries
/// this address appears in.
pub async fn detail(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<WalletDetail>>, AppError> {
    let address = address.to_lowercase();
    let stat = state
        .ledger
        .stat(&address)
        .await
        .ok_or_else(|| AppError::WalletNotTracked(address.clone()))?;

    let window = state.signals.policy().success_window_hours;
    let success_rate = state.ledger.success_rate(&address, window, Utc::now()).await;
    let history = state
        .ledger
        .history_snapshot()
        .await
        .into_iter()
        .filter(|entry| entry.touches(&address))
        .collect();

    Ok(ApiResponse::ok(WalletDetail {
        stat,
        success_rate,
        history,
    }))
}
