use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use tokio::sync::{broadcast, mpsc};

use crate::api::ws_types::{TradeRejection, WsMessage};
use crate::models::{Position, Signal};
use crate::services::notifier::{self, Notifier};

use super::price::PriceSource;
use super::simulator::{symbol_for, OpenRejection, TradeSimulator};

/// What happened to a single signal.
#[derive(Debug, Clone, PartialEq)]
pub enum CopyOutcome {
    Opened(Position),
    Rejected(OpenRejection),
    PriceUnavailable,
    Paused,
}

/// Run the copy engine loop. Receives signals and opens simulated positions.
pub async fn run_copy_engine<P: PriceSource>(
    mut rx: mpsc::Receiver<Signal>,
    simulator: TradeSimulator,
    prices: P,
    notifier: Option<Arc<Notifier>>,
    ws_tx: broadcast::Sender<WsMessage>,
    pause_flag: Arc<AtomicBool>,
) {
    let balance = simulator.balance().await;
    tracing::info!(
        balance = %balance,
        risk_fraction = %simulator.policy().risk_fraction,
        max_trade_amount = %simulator.policy().max_trade_amount,
        "Copy engine started"
    );

    while let Some(signal) = rx.recv().await {
        let outcome = process_signal(&signal, &simulator, &prices, &pause_flag).await;
        report_outcome(&signal, &outcome, &simulator, notifier.as_deref(), &ws_tx).await;
    }

    tracing::warn!("Copy engine channel closed, shutting down");
}

/// Open a position for one signal unless the engine is paused or no entry
/// price is available.
pub async fn process_signal<P: PriceSource>(
    signal: &Signal,
    simulator: &TradeSimulator,
    prices: &P,
    pause_flag: &AtomicBool,
) -> CopyOutcome {
    if pause_flag.load(Ordering::Relaxed) {
        tracing::info!(
            signal_id = %signal.id,
            wallet = %signal.whale_address,
            "Copy engine paused, skipping signal"
        );
        return CopyOutcome::Paused;
    }

    let symbol = symbol_for(signal.signal_type);
    let Some(entry_price) = prices.price(symbol).await else {
        tracing::warn!(
            signal_id = %signal.id,
            symbol,
            "Price unavailable, signal skipped"
        );
        counter!("copy_price_unavailable_total").increment(1);
        return CopyOutcome::PriceUnavailable;
    };

    tracing::info!(
        signal_id = %signal.id,
        wallet = %signal.whale_address,
        signal_type = %signal.signal_type,
        confidence = %signal.confidence,
        entry_price = %entry_price,
        "Processing copy signal"
    );

    match simulator.open_position(signal, entry_price, Utc::now()).await {
        Ok(position) => {
            counter!("positions_opened_total").increment(1);
            CopyOutcome::Opened(position)
        }
        Err(rejection) => {
            tracing::warn!(
                signal_id = %signal.id,
                wallet = %signal.whale_address,
                reason = %rejection,
                "Copy trade rejected"
            );
            counter!("positions_rejected_total").increment(1);
            CopyOutcome::Rejected(rejection)
        }
    }
}

async fn report_outcome(
    signal: &Signal,
    outcome: &CopyOutcome,
    simulator: &TradeSimulator,
    notifier: Option<&Notifier>,
    ws_tx: &broadcast::Sender<WsMessage>,
) {
    match outcome {
        CopyOutcome::Opened(position) => {
            let balance = simulator.balance().await;
            notifier::deliver(notifier, &notifier::format_trade_opened(position, balance)).await;
            let _ = ws_tx.send(WsMessage::PositionOpened(position.clone()));
            let _ = ws_tx.send(WsMessage::AccountUpdate(simulator.summary().await));
            crate::metrics::record_account(simulator).await;
        }
        CopyOutcome::Rejected(rejection) => {
            notifier::deliver(notifier, &notifier::format_trade_rejected(signal, rejection)).await;
            let _ = ws_tx.send(WsMessage::TradeRejected(TradeRejection {
                signal_id: signal.id.to_string(),
                whale_address: signal.whale_address.clone(),
                reason: rejection.to_string(),
            }));
        }
        CopyOutcome::PriceUnavailable | CopyOutcome::Paused => {}
    }
}
