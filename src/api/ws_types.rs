use serde::Serialize;

use crate::execution::simulator::SimulatorSummary;
use crate::models::{PnlRecord, Position, Signal};

/// Messages broadcast to all connected WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    #[serde(rename = "signal")]
    Signal(Signal),

    #[serde(rename = "position_opened")]
    PositionOpened(Position),

    #[serde(rename = "position_closed")]
    PositionClosed(PnlRecord),

    #[serde(rename = "trade_rejected")]
    TradeRejected(TradeRejection),

    #[serde(rename = "account_update")]
    AccountUpdate(SimulatorSummary),
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeRejection {
    pub signal_id: String,
    pub whale_address: String,
    pub reason: String,
}
