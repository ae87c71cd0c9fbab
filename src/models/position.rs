use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CloseReason, PositionStatus, Side};

/// An open simulated position. Owned by the trade simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub symbol: String,
    pub side: Side,
    pub entry_price: Decimal,
    pub quantity: Decimal,
    /// Capital committed at open.
    pub notional: Decimal,
    pub signal_id: Uuid,
    pub entry_time: DateTime<Utc>,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

/// Append-only PnL ledger entry. Written `OPEN` when the position opens and
/// completed with exit data exactly once when it closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlRecord {
    pub position_id: Uuid,
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub notional: Decimal,
    pub signal_id: Uuid,
    pub opened_at: DateTime<Utc>,
    pub status: PositionStatus,
    pub exit_price: Option<Decimal>,
    pub exit_time: Option<DateTime<Utc>>,
    pub pnl: Option<Decimal>,
    pub pnl_pct: Option<Decimal>,
    pub close_reason: Option<CloseReason>,
}

impl PnlRecord {
    pub fn opened(position: &Position) -> Self {
        Self {
            position_id: position.id,
            symbol: position.symbol.clone(),
            side: position.side,
            quantity: position.quantity,
            entry_price: position.entry_price,
            notional: position.notional,
            signal_id: position.signal_id,
            opened_at: position.entry_time,
            status: PositionStatus::Open,
            exit_price: None,
            exit_time: None,
            pnl: None,
            pnl_pct: None,
            close_reason: None,
        }
    }
}
