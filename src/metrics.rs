use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::execution::TradeSimulator;

/// Install the Prometheus exporter as the global recorder and register all
/// application metrics. The returned handle's `render()` produces the
/// text/plain scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {e}"))?;

    register_metrics();
    Ok(handle)
}

/// Pre-register counters and gauges so they appear before the first event.
pub fn register_metrics() {
    counter!("transactions_observed_total").absolute(0);
    counter!("whale_transactions_total").absolute(0);
    counter!("normalize_failures_total").absolute(0);
    counter!("signals_emitted_total").absolute(0);
    counter!("positions_opened_total").absolute(0);
    counter!("positions_rejected_total").absolute(0);
    counter!("copy_price_unavailable_total").absolute(0);
    for kind in ["whale_transfer", "high_fee", "token_transfer"] {
        counter!("tx_alerts_total", "kind" => kind).absolute(0);
    }

    gauge!("tracked_wallets").set(0.0);
    gauge!("open_positions").set(0.0);
    gauge!("account_balance").set(0.0);
    gauge!("realized_pnl").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("pipeline_latency_seconds").record(0.0);
}

/// Refresh the account gauges from the simulator.
pub async fn record_account(simulator: &TradeSimulator) {
    let summary = simulator.summary().await;
    gauge!("open_positions").set(summary.open_positions as f64);
    gauge!("account_balance").set(to_f64(summary.balance));
    gauge!("realized_pnl").set(to_f64(summary.realized_pnl));
}

pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
