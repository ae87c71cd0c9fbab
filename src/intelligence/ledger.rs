use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::models::{Transaction, WalletStat, WhaleHistoryEntry};

use super::scorer;

/// Per-address activity aggregates plus the bounded whale history window.
///
/// The stats map and the history each sit behind their own lock. An upsert
/// is a read-modify-write under the map lock, so concurrent updates to the
/// same address serialize and none are lost.
#[derive(Clone)]
pub struct WalletLedger {
    stats: Arc<Mutex<HashMap<String, WalletStat>>>,
    history: Arc<Mutex<VecDeque<WhaleHistoryEntry>>>,
    history_capacity: usize,
}

impl WalletLedger {
    pub fn new(history_capacity: usize) -> Self {
        let history_capacity = history_capacity.max(1);
        Self {
            stats: Arc::new(Mutex::new(HashMap::new())),
            history: Arc::new(Mutex::new(VecDeque::with_capacity(history_capacity))),
            history_capacity,
        }
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    /// Upsert a `WalletStat` for the sender and the recipient (when present).
    /// A self-transfer is counted once.
    pub async fn record_activity(
        &self,
        tx: &Transaction,
        is_buy: bool,
        is_sell: bool,
        now: DateTime<Utc>,
    ) {
        let mut stats = self.stats.lock().await;

        let mut addresses: Vec<&str> = Vec::with_capacity(2);
        for address in [tx.from.as_str(), tx.to.as_str()] {
            if !address.is_empty() && !addresses.contains(&address) {
                addresses.push(address);
            }
        }

        for address in addresses {
            let stat = stats.entry(address.to_string()).or_insert_with(|| {
                tracing::debug!(wallet = %address, "New wallet tracked");
                WalletStat::new(address, now)
            });
            stat.apply(tx.usd_value, is_buy, is_sell, now);
        }
    }

    /// Append to the bounded history, evicting the oldest entries first.
    pub async fn append_history(&self, entry: WhaleHistoryEntry) {
        let mut history = self.history.lock().await;
        history.push_back(entry);
        while history.len() > self.history_capacity {
            history.pop_front();
        }
    }

    pub async fn stat(&self, address: &str) -> Option<WalletStat> {
        self.stats.lock().await.get(address).cloned()
    }

    pub async fn len(&self) -> usize {
        self.stats.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.stats.lock().await.is_empty()
    }

    pub async fn stats_snapshot(&self) -> Vec<WalletStat> {
        self.stats.lock().await.values().cloned().collect()
    }

    /// Wallets ordered by cumulative volume, largest first.
    pub async fn top_by_volume(&self, limit: usize) -> Vec<WalletStat> {
        let mut wallets = self.stats_snapshot().await;
        wallets.sort_by(|a, b| {
            b.total_volume
                .cmp(&a.total_volume)
                .then_with(|| a.address.cmp(&b.address))
        });
        wallets.truncate(limit);
        wallets
    }

    /// History in insertion order, oldest first.
    pub async fn history_snapshot(&self) -> Vec<WhaleHistoryEntry> {
        self.history.lock().await.iter().cloned().collect()
    }

    pub async fn success_rate(&self, address: &str, window_hours: i64, now: DateTime<Utc>) -> Decimal {
        let history = self.history.lock().await;
        scorer::success_rate(history.iter(), address, window_hours, now)
    }

    /// Drop wallets with no activity for `ttl`. A zero `ttl` disables
    /// eviction. Returns how many wallets were removed.
    pub async fn evict_dormant(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        if ttl <= Duration::zero() {
            return 0;
        }

        let cutoff = now - ttl;
        let mut stats = self.stats.lock().await;
        let before = stats.len();
        stats.retain(|_, stat| stat.last_activity >= cutoff);
        let evicted = before - stats.len();

        if evicted > 0 {
            tracing::info!(
                evicted,
                remaining = stats.len(),
                "Evicted dormant wallets"
            );
        }
        evicted
    }

    /// Replace the ledger contents with persisted state.
    pub async fn restore(&self, wallets: Vec<WalletStat>, history: Vec<WhaleHistoryEntry>) {
        {
            let mut stats = self.stats.lock().await;
            stats.clear();
            for wallet in wallets {
                stats.insert(wallet.address.clone(), wallet);
            }
        }

        let mut window = self.history.lock().await;
        window.clear();
        let skip = history.len().saturating_sub(self.history_capacity);
        window.extend(history.into_iter().skip(skip));
    }
}
