use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use tokio::time::{interval, Duration};

use crate::intelligence::signal_generator::{check_wallet, Qualification, SignalPolicy};
use crate::intelligence::{SignalGenerator, WalletLedger};
use crate::services::notifier::{self, Notifier};

/// Schedules and limits for the two summary jobs.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub top_n: usize,
    pub top_interval_secs: u64,
    pub signals_interval_secs: u64,
    pub signal_window_hours: i64,
    pub signal_limit: usize,
    /// Signals must score strictly above this to be listed.
    pub display_confidence: Decimal,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            top_interval_secs: 300,
            signals_interval_secs: 600,
            signal_window_hours: 1,
            signal_limit: 10,
            display_confidence: Decimal::new(7, 1),
        }
    }
}

/// Top wallets by volume that meet the signal policy's count and
/// success-rate floor. `None` when no wallet qualifies.
pub async fn top_wallets_report(
    ledger: &WalletLedger,
    policy: &SignalPolicy,
    top_n: usize,
    now: DateTime<Utc>,
) -> Option<String> {
    let mut ranked = Vec::new();
    for stat in ledger.top_by_volume(usize::MAX).await {
        if ranked.len() >= top_n {
            break;
        }
        let rate = ledger
            .success_rate(&stat.address, policy.success_window_hours, now)
            .await;
        if check_wallet(Some(&stat), rate, policy) == Qualification::Qualified {
            ranked.push((stat, rate));
        }
    }

    if ranked.is_empty() {
        return None;
    }
    Some(notifier::format_top_wallets(&ranked))
}

/// Recent high-confidence signals. `None` when there are none.
pub async fn recent_signals_report(
    signals: &SignalGenerator,
    config: &AggregatorConfig,
    now: DateTime<Utc>,
) -> Option<String> {
    let recent = signals
        .recent(
            ChronoDuration::hours(config.signal_window_hours),
            config.display_confidence,
            config.signal_limit,
            now,
        )
        .await;

    if recent.is_empty() {
        return None;
    }
    Some(notifier::format_recent_signals(&recent))
}

/// Periodic "top whales" summary.
pub async fn run_top_wallets_job(
    ledger: WalletLedger,
    policy: SignalPolicy,
    config: AggregatorConfig,
    notifier: Option<Arc<Notifier>>,
) {
    let mut ticker = interval(Duration::from_secs(config.top_interval_secs.max(1)));
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match top_wallets_report(&ledger, &policy, config.top_n, Utc::now()).await {
            Some(report) => {
                let wallets = ledger.len().await;
                tracing::info!(wallets, "Publishing top whales report");
                notifier::deliver(notifier.as_deref(), &report).await;
            }
            None => tracing::debug!("Top whales report: no qualifying wallets"),
        }
    }
}

/// Periodic "recent signals" summary.
pub async fn run_recent_signals_job(
    signals: SignalGenerator,
    config: AggregatorConfig,
    notifier: Option<Arc<Notifier>>,
) {
    let mut ticker = interval(Duration::from_secs(config.signals_interval_secs.max(1)));
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match recent_signals_report(&signals, &config, Utc::now()).await {
            Some(report) => {
                tracing::info!("Publishing recent signals report");
                notifier::deliver(notifier.as_deref(), &report).await;
            }
            None => tracing::debug!("Recent signals report: nothing to report"),
        }
    }
}
