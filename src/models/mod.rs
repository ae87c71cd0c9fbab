pub mod position;
pub mod signal;
pub mod snapshot;
pub mod transaction;
pub mod wallet;

pub use position::{PnlRecord, Position};
pub use signal::Signal;
pub use snapshot::StateSnapshot;
pub use transaction::Transaction;
pub use wallet::{WalletStat, WhaleHistoryEntry};

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

// ---------------------------------------------------------------------------
// SignalType
// ---------------------------------------------------------------------------

/// What kind of on-chain action a signal mirrors, derived from call data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    UniswapSwap,
    TokenTransfer,
    TokenTransferFrom,
    EthTransfer,
    ContractInteraction,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::UniswapSwap => "UNISWAP_SWAP",
            SignalType::TokenTransfer => "TOKEN_TRANSFER",
            SignalType::TokenTransferFrom => "TOKEN_TRANSFER_FROM",
            SignalType::EthTransfer => "ETH_TRANSFER",
            SignalType::ContractInteraction => "CONTRACT_INTERACTION",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Position lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionStatus::Open => write!(f, "OPEN"),
            PositionStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CloseReason {
    StopLoss,
    TakeProfit,
    Manual,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::StopLoss => "STOP_LOSS",
            CloseReason::TakeProfit => "TAKE_PROFIT",
            CloseReason::Manual => "MANUAL",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
