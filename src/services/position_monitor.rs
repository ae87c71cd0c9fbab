use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::sync::broadcast;
use tokio::time::{interval, Duration};

use crate::api::ws_types::WsMessage;
use crate::execution::price::PriceBoard;
use crate::execution::simulator::TradeSimulator;
use crate::models::PnlRecord;
use crate::services::notifier::{self, Notifier};

/// One monitoring pass: price every symbol with an active position, then
/// let the simulator close whatever crossed its stop-loss or take-profit.
/// Symbols without a price are left for the next pass.
pub async fn monitor_once(
    simulator: &TradeSimulator,
    prices: &PriceBoard,
    now: DateTime<Utc>,
) -> Vec<PnlRecord> {
    let symbols = simulator.active_symbols().await;
    if symbols.is_empty() {
        tracing::trace!("Position monitor: no open positions");
        return Vec::new();
    }

    let quotes = prices.prices_for(&symbols).await;
    for symbol in symbols.iter().filter(|s| !quotes.contains_key(*s)) {
        tracing::warn!(symbol = %symbol, "Position monitor: price unavailable, retrying next tick");
    }

    simulator.monitor_tick(&quotes, now).await
}

/// Run the position monitor loop until shutdown. Exits keep firing while the
/// copy engine is paused.
pub async fn run_position_monitor(
    simulator: TradeSimulator,
    prices: PriceBoard,
    interval_secs: u64,
    notifier: Option<Arc<Notifier>>,
    ws_tx: broadcast::Sender<WsMessage>,
) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
    tracing::info!(interval_secs, "Position monitor started");

    loop {
        ticker.tick().await;

        let closed = monitor_once(&simulator, &prices, Utc::now()).await;
        if closed.is_empty() {
            continue;
        }

        for record in &closed {
            let reason = record.close_reason.map(|r| r.as_str()).unwrap_or("UNKNOWN");
            counter!("positions_closed_total", "reason" => reason).increment(1);
            notifier::deliver(notifier.as_deref(), &notifier::format_trade_closed(record)).await;
            let _ = ws_tx.send(WsMessage::PositionClosed(record.clone()));
        }

        crate::metrics::record_account(&simulator).await;
        let _ = ws_tx.send(WsMessage::AccountUpdate(simulator.summary().await));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::risk::RiskPolicy;
    use crate::execution::venue::SimulatedVenue;
    use crate::models::{CloseReason, Signal, SignalType};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn signal() -> Signal {
        Signal {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            whale_address: "0xwhale".into(),
            counterparty: "0xrouter".into(),
            value: Decimal::from(400_000),
            success_rate: Decimal::new(8, 1),
            transaction_count: 5,
            signal_type: SignalType::UniswapSwap,
            confidence: Decimal::new(7, 1),
            tx_hash: "0xsrc".into(),
        }
    }

    #[tokio::test]
    async fn test_monitor_once_closes_on_stop_loss() {
        let sim = TradeSimulator::new(
            Decimal::from(1000),
            RiskPolicy::default(),
            Arc::new(SimulatedVenue::default()),
        );
        sim.open_position(&signal(), Decimal::from(3000), Utc::now()).await.unwrap();

        let board = PriceBoard::new(None);

        // No quote yet: nothing closes
        assert!(monitor_once(&sim, &board, Utc::now()).await.is_empty());

        board.set("ETHUSDT", Decimal::from(2800)).await;
        let closed = monitor_once(&sim, &board, Utc::now()).await;
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].close_reason, Some(CloseReason::StopLoss));
        assert!(sim.active_positions().await.is_empty());
    }
}
