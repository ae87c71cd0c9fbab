use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::errors::AppError;
use crate::AppState;

use super::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct SetPriceRequest {
    pub price: Decimal,
}

/// GET /api/prices: explicit quotes on the price board.
pub async fn list(State(state): State<AppState>) -> Json<ApiResponse<HashMap<String, Decimal>>> {
    ApiResponse::ok(state.prices.quotes().await)
}

/// PUT /api/prices/:symbol
pub async fn set(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Json(body): Json<SetPriceRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    if !state.prices.set(&symbol, body.price).await {
        return Err(AppError::InvalidPrice(body.price));
    }

    Ok(ApiResponse::ok(json!({
        "symbol": symbol.to_uppercase(),
        "price": body.price,
    })))
}

/// DELETE /api/prices/:symbol: drop the explicit quote so the fallback applies again.
pub async fn clear(State(state): State<AppState>, Path(symbol): Path<String>) -> Json<ApiResponse<serde_json::Value>> {
    state.prices.clear(&symbol).await;
    ApiResponse::ok(json!({ "symbol": symbol.to_uppercase() }))
}
