use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use rust_decimal::Decimal;
use tokio::sync::{broadcast, mpsc, Semaphore};

use crate::api::ws_types::WsMessage;
use crate::intelligence::classifier::{self, AlertThresholds, ClassificationMode, TxAlert};
use crate::intelligence::{SignalGenerator, WalletLedger};
use crate::models::{Signal, Transaction, WhaleHistoryEntry};
use crate::rpc::DetailClient;
use crate::services::notifier::{self, Notifier};

use super::feed_listener::FeedItem;
use super::normalizer;

/// Shared collaborators for every transaction task.
#[derive(Clone)]
pub struct PipelineContext {
    pub ledger: WalletLedger,
    pub signals: SignalGenerator,
    pub thresholds: AlertThresholds,
    pub mode: ClassificationMode,
    pub native_price_usd: Decimal,
    pub detail: Option<DetailClient>,
    pub signal_tx: Option<mpsc::Sender<Signal>>,
    pub notifier: Option<Arc<Notifier>>,
    pub ws_tx: broadcast::Sender<WsMessage>,
}

/// What the pipeline did with one transaction.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutcome {
    pub alerts: Vec<TxAlert>,
    /// The transaction qualified for and updated the wallet ledger.
    pub recorded: bool,
    pub signal: Option<Signal>,
}

/// Run one normalized transaction through the analytics core:
/// 1. Raise observation alerts
/// 2. Skip unless it is a whale transfer
/// 3. Update the wallet ledger and whale history
/// 4. Evaluate the sender for a copy signal and forward it
pub async fn process_transaction(
    tx: &Transaction,
    ctx: &PipelineContext,
    now: DateTime<Utc>,
) -> ProcessOutcome {
    let start = Instant::now();
    counter!("transactions_observed_total").increment(1);

    let alerts = classifier::detect_alerts(tx, &ctx.thresholds);
    for alert in &alerts {
        counter!("tx_alerts_total", "kind" => alert_kind(*alert)).increment(1);
        notifier::deliver(ctx.notifier.as_deref(), &notifier::format_tx_alert(*alert, tx)).await;
    }

    if !classifier::is_whale_transfer(tx, &ctx.thresholds) {
        return ProcessOutcome {
            alerts,
            ..ProcessOutcome::default()
        };
    }

    tracing::info!(
        tx_hash = %tx.hash,
        from = %tx.from,
        to = %tx.to,
        value = %tx.value,
        usd_value = %tx.usd_value,
        "Whale transfer detected"
    );

    let flags = classifier::classify_activity(tx, ctx.mode);
    ctx.ledger.record_activity(tx, flags.is_buy, flags.is_sell, now).await;
    ctx.ledger
        .append_history(WhaleHistoryEntry {
            tx_hash: tx.hash.clone(),
            from: tx.from.clone(),
            to: tx.to.clone(),
            usd_value: tx.usd_value,
            is_buy: flags.is_buy,
            is_sell: flags.is_sell,
            timestamp: now,
        })
        .await;
    counter!("whale_transactions_total").increment(1);
    let tracked = ctx.ledger.len().await;
    gauge!("tracked_wallets").set(tracked as f64);

    let signal = ctx.signals.evaluate(tx, &ctx.ledger, now).await;
    if let Some(signal) = &signal {
        emit_signal(signal, ctx).await;
    }

    histogram!("pipeline_latency_seconds").record(start.elapsed().as_secs_f64());

    ProcessOutcome {
        alerts,
        recorded: true,
        signal,
    }
}

async fn emit_signal(signal: &Signal, ctx: &PipelineContext) {
    counter!("signals_emitted_total").increment(1);
    tracing::info!(
        signal_id = %signal.id,
        wallet = %signal.whale_address,
        signal_type = %signal.signal_type,
        value = %signal.value,
        success_rate = %signal.success_rate,
        confidence = %signal.confidence,
        "Copy signal emitted"
    );

    notifier::deliver(ctx.notifier.as_deref(), &notifier::format_signal_alert(signal)).await;
    let _ = ctx.ws_tx.send(WsMessage::Signal(signal.clone()));

    if let Some(tx) = &ctx.signal_tx {
        if let Err(e) = tx.send(signal.clone()).await {
            tracing::error!(error = %e, "Failed to send signal to copy engine");
        }
    }
}

fn alert_kind(alert: TxAlert) -> &'static str {
    match alert {
        TxAlert::WhaleTransfer => "whale_transfer",
        TxAlert::HighFee => "high_fee",
        TxAlert::TokenTransfer => "token_transfer",
    }
}

/// Turn a feed item into a normalized transaction. Malformed payloads and
/// unavailable details are logged and skipped.
pub async fn resolve_item(item: FeedItem, ctx: &PipelineContext, now: DateTime<Utc>) -> Option<Transaction> {
    match item {
        FeedItem::Payload(payload) => match normalizer::normalize_value(&payload, ctx.native_price_usd, now) {
            Ok(tx) => Some(tx),
            Err(e) => {
                counter!("normalize_failures_total").increment(1);
                tracing::debug!(error = %e, "Skipping malformed feed payload");
                None
            }
        },
        FeedItem::Hash(hash) => match &ctx.detail {
            Some(detail) => detail.fetch(&hash, now).await,
            None => {
                tracing::trace!(tx_hash = %hash, "No detail client configured, skipping hash");
                None
            }
        },
    }
}

/// Drain the feed channel, running each item on its own task with at most
/// `max_in_flight` tasks alive. A permit is taken before the next item is
/// received, so a saturated pipeline stops draining and the bounded feed
/// channel pushes back on the listener.
pub async fn run_pipeline(
    mut rx: mpsc::Receiver<FeedItem>,
    ctx: Arc<PipelineContext>,
    max_in_flight: usize,
) {
    let permits = Arc::new(Semaphore::new(max_in_flight.max(1)));
    tracing::info!(max_in_flight = max_in_flight.max(1), "Pipeline dispatcher started");

    loop {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let Some(item) = rx.recv().await else {
            break;
        };

        let ctx = ctx.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let now = Utc::now();
            if let Some(tx) = resolve_item(item, &ctx, now).await {
                process_transaction(&tx, &ctx, now).await;
            }
        });
    }

    tracing::warn!("Feed channel closed, pipeline dispatcher stopped");
}
