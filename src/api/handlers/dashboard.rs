use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct DashboardSummary {
    pub tracked_wallets: usize,
    pub whale_history_len: usize,
    pub signals_last_24h: usize,
    pub balance: Decimal,
    pub open_positions: usize,
    pub closed_positions: usize,
    pub wins: usize,
    pub losses: usize,
    pub realized_pnl: Decimal,
    pub paused: bool,
}

pub async fn summary(State(state): State<AppState>) -> Json<DashboardSummary> {
    let account = state.simulator.summary().await;
    let signals_last_24h = state
        .signals
        .recent(Duration::hours(24), Decimal::ZERO, usize::MAX, Utc::now())
        .await
        .len();

    Json(DashboardSummary {
        tracked_wallets: state.ledger.len().await,
        whale_history_len: state.ledger.history_snapshot().await.len(),
        signals_last_24h,
        balance: account.balance,
        open_positions: account.open_positions,
        closed_positions: account.closed_positions,
        wins: account.wins,
        losses: account.losses,
        realized_pnl: account.realized_pnl,
        paused: state.pause_flag.load(Ordering::Relaxed),
    })
}
