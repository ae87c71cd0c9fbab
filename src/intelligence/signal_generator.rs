use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{Signal, Transaction, WalletStat};

use super::classifier::classify_signal_type;
use super::ledger::WalletLedger;
use super::scorer;

/// Copy-trade qualification policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalPolicy {
    /// Minimum USD value of the whale's transaction.
    pub copy_trade_threshold: Decimal,
    /// Minimum number of recorded transactions for the sender.
    pub min_transaction_count: u64,
    /// Minimum windowed success rate.
    pub min_success_rate: Decimal,
    /// Look-back window for the success rate.
    pub success_window_hours: i64,
}

impl SignalPolicy {
    /// Looser variant: two prior transactions and a neutral success rate suffice.
    pub fn lenient() -> Self {
        Self {
            min_transaction_count: 2,
            min_success_rate: Decimal::new(5, 1),
            ..Self::default()
        }
    }
}

impl Default for SignalPolicy {
    fn default() -> Self {
        Self {
            copy_trade_threshold: Decimal::from(300_000),
            min_transaction_count: 5,
            min_success_rate: Decimal::new(7, 1),
            success_window_hours: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualification {
    Qualified,
    Rejected(String),
}

/// Check the count/success-rate part of the policy for a known wallet.
pub fn check_wallet(
    stat: Option<&WalletStat>,
    success_rate: Decimal,
    policy: &SignalPolicy,
) -> Qualification {
    let Some(stat) = stat else {
        return Qualification::Rejected("sender has no recorded activity".into());
    };

    if stat.transaction_count < policy.min_transaction_count {
        return Qualification::Rejected(format!(
            "transaction count {} below minimum {}",
            stat.transaction_count, policy.min_transaction_count
        ));
    }

    if success_rate < policy.min_success_rate {
        return Qualification::Rejected(format!(
            "success rate {} below minimum {}",
            success_rate, policy.min_success_rate
        ));
    }

    Qualification::Qualified
}

/// Emits copy-trade signals and keeps a bounded, FIFO-evicted signal history.
#[derive(Clone)]
pub struct SignalGenerator {
    policy: SignalPolicy,
    history: Arc<Mutex<VecDeque<Signal>>>,
    capacity: usize,
}

impl SignalGenerator {
    pub fn new(policy: SignalPolicy, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            policy,
            history: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn policy(&self) -> &SignalPolicy {
        &self.policy
    }

    /// Decide whether the sender of `tx` qualifies for a copy-trade signal.
    /// On success the signal is appended to the history and returned.
    pub async fn evaluate(
        &self,
        tx: &Transaction,
        ledger: &WalletLedger,
        now: DateTime<Utc>,
    ) -> Option<Signal> {
        if tx.usd_value < self.policy.copy_trade_threshold {
            return None;
        }

        let stat = ledger.stat(&tx.from).await;
        let success_rate = ledger
            .success_rate(&tx.from, self.policy.success_window_hours, now)
            .await;

        if let Qualification::Rejected(reason) =
            check_wallet(stat.as_ref(), success_rate, &self.policy)
        {
            tracing::debug!(
                wallet = %tx.from,
                tx_hash = %tx.hash,
                reason = %reason,
                "Wallet does not qualify for copy signal"
            );
            return None;
        }

        let stat = stat?;
        let signal = Signal {
            id: Uuid::new_v4(),
            timestamp: now,
            whale_address: tx.from.clone(),
            counterparty: tx.to.clone(),
            value: tx.usd_value,
            success_rate,
            transaction_count: stat.transaction_count,
            signal_type: classify_signal_type(tx),
            confidence: scorer::confidence(&stat, success_rate, now),
            tx_hash: tx.hash.clone(),
        };

        self.record(signal.clone()).await;
        Some(signal)
    }

    async fn record(&self, signal: Signal) {
        let mut history = self.history.lock().await;
        history.push_back(signal);
        while history.len() > self.capacity {
            history.pop_front();
        }
    }

    /// Signals within `window` of `now` with confidence above
    /// `min_confidence`, newest first.
    pub async fn recent(
        &self,
        window: Duration,
        min_confidence: Decimal,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<Signal> {
        let cutoff = now - window;
        self.history
            .lock()
            .await
            .iter()
            .rev()
            .filter(|s| s.timestamp >= cutoff && s.confidence > min_confidence)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Signal history in emission order, oldest first.
    pub async fn snapshot(&self) -> Vec<Signal> {
        self.history.lock().await.iter().cloned().collect()
    }

    pub async fn restore(&self, signals: Vec<Signal>) {
        let mut history = self.history.lock().await;
        history.clear();
        let skip = signals.len().saturating_sub(self.capacity);
        history.extend(signals.into_iter().skip(skip));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SignalType, WhaleHistoryEntry};

    const WHALE: &str = "0xwhale";

    fn make_tx(usd: i64) -> Transaction {
        Transaction {
            hash: "0xsignalsource".into(),
            from: WHALE.into(),
            to: "0x7a250d5630b4cf539739df2c5dacb4c659f2488d".into(),
            value: Decimal::from(usd) / Decimal::from(3000),
            usd_value: Decimal::from(usd),
            fee: Decimal::new(5, 3),
            gas_used: 150_000,
            gas_price_gwei: Decimal::from(30),
            call_data: "0x7ff36ab50000".into(),
            observed_at: Utc::now(),
        }
    }

    fn stat_with_count(count: u64, now: DateTime<Utc>) -> WalletStat {
        let mut stat = WalletStat::new(WHALE, now);
        for _ in 0..count {
            stat.apply(Decimal::from(400_000), true, false, now);
        }
        stat
    }

    /// Seed a ledger whose window yields the favourable (0.8) success rate.
    async fn seeded_ledger(count: u64, now: DateTime<Utc>) -> WalletLedger {
        let ledger = WalletLedger::new(100);
        ledger.restore(vec![stat_with_count(count, now)], Vec::new()).await;
        for i in 0..3 {
            ledger
                .append_history(WhaleHistoryEntry {
                    tx_hash: format!("0xprior{i}"),
                    from: WHALE.into(),
                    to: "0xdex".into(),
                    usd_value: Decimal::from(400_000),
                    is_buy: true,
                    is_sell: false,
                    timestamp: now - Duration::minutes(10 * (i + 1)),
                })
                .await;
        }
        ledger
    }

    #[test]
    fn test_check_wallet_requires_stat() {
        let q = check_wallet(None, Decimal::ONE, &SignalPolicy::default());
        assert!(matches!(q, Qualification::Rejected(_)));
    }

    #[test]
    fn test_check_wallet_thresholds() {
        let now = Utc::now();
        let policy = SignalPolicy::default();

        let five = stat_with_count(5, now);
        assert_eq!(
            check_wallet(Some(&five), Decimal::new(8, 1), &policy),
            Qualification::Qualified
        );
        assert!(matches!(
            check_wallet(Some(&five), Decimal::new(5, 1), &policy),
            Qualification::Rejected(_)
        ));

        let four = stat_with_count(4, now);
        assert!(matches!(
            check_wallet(Some(&four), Decimal::new(8, 1), &policy),
            Qualification::Rejected(_)
        ));
    }

    #[test]
    fn test_lenient_policy_accepts_neutral_rate() {
        let now = Utc::now();
        let two = stat_with_count(2, now);
        assert_eq!(
            check_wallet(Some(&two), scorer::NEUTRAL_SUCCESS_RATE, &SignalPolicy::lenient()),
            Qualification::Qualified
        );
    }

    #[tokio::test]
    async fn test_evaluate_emits_signal_for_qualified_wallet() {
        let now = Utc::now();
        let ledger = seeded_ledger(5, now).await;
        let generator = SignalGenerator::new(SignalPolicy::default(), 10);

        let signal = generator
            .evaluate(&make_tx(450_000), &ledger, now)
            .await
            .expect("wallet should qualify");

        assert_eq!(signal.whale_address, WHALE);
        assert_eq!(signal.success_rate, Decimal::new(8, 1));
        assert_eq!(signal.transaction_count, 5);
        assert_eq!(signal.signal_type, SignalType::UniswapSwap);
        assert_eq!(signal.tx_hash, "0xsignalsource");
        assert!(signal.confidence > Decimal::ZERO && signal.confidence <= Decimal::ONE);
        assert_eq!(generator.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_evaluate_rejects_wallet_below_min_count() {
        let now = Utc::now();
        let ledger = seeded_ledger(4, now).await;
        let generator = SignalGenerator::new(SignalPolicy::default(), 10);

        assert!(generator.evaluate(&make_tx(450_000), &ledger, now).await.is_none());
        assert!(generator.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_rejects_small_transaction() {
        let now = Utc::now();
        let ledger = seeded_ledger(10, now).await;
        let generator = SignalGenerator::new(SignalPolicy::default(), 10);

        assert!(generator.evaluate(&make_tx(10_000), &ledger, now).await.is_none());
    }

    #[tokio::test]
    async fn test_signal_history_is_bounded() {
        let now = Utc::now();
        let ledger = seeded_ledger(10, now).await;
        let generator = SignalGenerator::new(SignalPolicy::default(), 2);

        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(generator.evaluate(&make_tx(450_000), &ledger, now).await.unwrap().id);
        }

        let kept: Vec<Uuid> = generator.snapshot().await.iter().map(|s| s.id).collect();
        assert_eq!(kept, ids[1..].to_vec());
    }

    #[tokio::test]
    async fn test_recent_filters_by_window_and_confidence() {
        let now = Utc::now();
        let generator = SignalGenerator::new(SignalPolicy::default(), 10);

        let base = Signal {
            id: Uuid::new_v4(),
            timestamp: now,
            whale_address: WHALE.into(),
            counterparty: "0xdex".into(),
            value: Decimal::from(500_000),
            success_rate: Decimal::new(8, 1),
            transaction_count: 6,
            signal_type: SignalType::UniswapSwap,
            confidence: Decimal::new(9, 1),
            tx_hash: "0x1".into(),
        };
        let old = Signal {
            id: Uuid::new_v4(),
            timestamp: now - Duration::hours(3),
            ..base.clone()
        };
        let weak = Signal {
            id: Uuid::new_v4(),
            confidence: Decimal::new(4, 1),
            ..base.clone()
        };
        generator.restore(vec![old, weak, base.clone()]).await;

        let recent = generator
            .recent(Duration::hours(1), Decimal::new(7, 1), 10, now)
            .await;
        assert_eq!(recent, vec![base]);
    }
}
