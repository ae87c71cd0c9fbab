use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SignalType;

/// A copy-trade recommendation. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Wallet whose action is being mirrored.
    pub whale_address: String,
    pub counterparty: String,
    /// USD value of the source transaction.
    pub value: Decimal,
    /// Success rate of the whale at emission time.
    pub success_rate: Decimal,
    /// Whale's transaction count at emission time.
    pub transaction_count: u64,
    pub signal_type: SignalType,
    pub confidence: Decimal,
    pub tx_hash: String,
}
