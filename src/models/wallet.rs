use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregated activity for one address. Created on the first qualifying
/// transaction and mutated in place afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletStat {
    pub address: String,
    pub first_seen: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Cumulative USD volume.
    pub total_volume: Decimal,
    pub transaction_count: u64,
    pub buy_count: u64,
    pub sell_count: u64,
    pub average_size: Decimal,
}

impl WalletStat {
    pub fn new(address: &str, now: DateTime<Utc>) -> Self {
        Self {
            address: address.to_string(),
            first_seen: now,
            last_activity: now,
            total_volume: Decimal::ZERO,
            transaction_count: 0,
            buy_count: 0,
            sell_count: 0,
            average_size: Decimal::ZERO,
        }
    }

    /// Fold one transaction into the aggregate. A transaction may count as
    /// both a buy and a sell.
    pub fn apply(&mut self, usd_value: Decimal, is_buy: bool, is_sell: bool, now: DateTime<Utc>) {
        self.total_volume += usd_value;
        self.transaction_count += 1;
        if is_buy {
            self.buy_count += 1;
        }
        if is_sell {
            self.sell_count += 1;
        }
        self.last_activity = now;
        self.average_size = self.total_volume / Decimal::from(self.transaction_count);
    }
}

/// One entry of the bounded whale history window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhaleHistoryEntry {
    pub tx_hash: String,
    pub from: String,
    pub to: String,
    pub usd_value: Decimal,
    pub is_buy: bool,
    pub is_sell: bool,
    pub timestamp: DateTime<Utc>,
}

impl WhaleHistoryEntry {
    pub fn touches(&self, address: &str) -> bool {
        self.from == address || self.to == address
    }
}
