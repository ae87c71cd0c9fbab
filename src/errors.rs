use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::execution::simulator::CloseError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("position {0} is not active")]
    PositionNotActive(Uuid),

    #[error("wallet {0} is not tracked")]
    WalletNotTracked(String),

    #[error("no price available for {0}")]
    PriceUnavailable(String),

    #[error("price must be positive, got {0}")]
    InvalidPrice(Decimal),

    #[error("Unauthorized")]
    Unauthorized,
}

impl AppError {
    /// Stable machine-readable tag returned alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::PositionNotActive(_) => "position_not_active",
            AppError::WalletNotTracked(_) => "wallet_not_tracked",
            AppError::PriceUnavailable(_) => "price_unavailable",
            AppError::InvalidPrice(_) => "invalid_price",
            AppError::Unauthorized => "unauthorized",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::PositionNotActive(_) | AppError::WalletNotTracked(_) => StatusCode::NOT_FOUND,
            AppError::PriceUnavailable(_) | AppError::InvalidPrice(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    kind: &'static str,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!("Rejected unauthenticated request");
        }

        (
            status,
            Json(ErrorBody {
                success: false,
                kind: self.kind(),
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<CloseError> for AppError {
    fn from(e: CloseError) -> Self {
        match e {
            CloseError::NotActive(id) => AppError::PositionNotActive(id),
            CloseError::InvalidExitPrice(price) => AppError::InvalidPrice(price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_errors_map_to_http() {
        let id = Uuid::new_v4();
        let err = AppError::from(CloseError::NotActive(id));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.kind(), "position_not_active");

        let err = AppError::from(CloseError::InvalidExitPrice(Decimal::ZERO));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "price must be positive, got 0");
    }
}
