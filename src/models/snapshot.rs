use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Signal, WalletStat, WhaleHistoryEntry};

/// Serializable copy of the analytics state handed to the snapshot store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub saved_at: DateTime<Utc>,
    pub wallets: Vec<WalletStat>,
    pub whale_history: Vec<WhaleHistoryEntry>,
    pub signals: Vec<Signal>,
}
