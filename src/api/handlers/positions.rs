use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::ws_types::WsMessage;
use crate::errors::AppError;
use crate::execution::PriceSource;
use crate::models::{CloseReason, PnlRecord, Position};
use crate::services::notifier;
use crate::AppState;

use super::ApiResponse;

#[derive(Debug, Default, Deserialize)]
pub struct ClosePositionRequest {
    /// Exit price; the current board price is used when omitted.
    pub price: Option<Decimal>,
}

/// GET /api/positions: active positions, oldest first.
pub async fn list(State(state): State<AppState>) -> Json<ApiResponse<Vec<Position>>> {
    ApiResponse::ok(state.simulator.active_positions().await)
}

/// POST /api/positions/:id/close: manual close, realizing PnL at the given
/// or current price.
pub async fn close(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ClosePositionRequest>>,
) -> Result<Json<ApiResponse<PnlRecord>>, AppError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();

    let position = state
        .simulator
        .active_position(id)
        .await
        .ok_or(AppError::PositionNotActive(id))?;

    let exit_price = match request.price {
        Some(price) => price,
        None => state
            .prices
            .price(&position.symbol)
            .await
            .ok_or_else(|| AppError::PriceUnavailable(position.symbol.clone()))?,
    };

    let record = state
        .simulator
        .close_position(id, exit_price, CloseReason::Manual, Utc::now())
        .await?;

    tracing::info!(
        position_id = %id,
        exit_price = %exit_price,
        pnl = ?record.pnl,
        "Position closed via control API"
    );
    counter!("positions_closed_total", "reason" => CloseReason::Manual.as_str()).increment(1);
    notifier::deliver(state.notifier.as_deref(), &notifier::format_trade_closed(&record)).await;
    let _ = state.ws_tx.send(WsMessage::PositionClosed(record.clone()));
    let _ = state.ws_tx.send(WsMessage::AccountUpdate(state.simulator.summary().await));
    crate::metrics::record_account(&state.simulator).await;

    Ok(ApiResponse::ok(record))
}
