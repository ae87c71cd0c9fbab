pub mod control;
pub mod dashboard;
pub mod health;
pub mod metrics;
pub mod positions;
pub mod prices;
pub mod signals;
pub mod trades;
pub mod wallets;
pub mod ws;

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}
