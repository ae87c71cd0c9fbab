use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use uuid::Uuid;

use whalecopy::api::ws_types::WsMessage;
use whalecopy::config::AppConfig;
use whalecopy::execution::{PriceBoard, SimulatedVenue, TradeSimulator, DEFAULT_SYMBOL};
use whalecopy::intelligence::{SignalGenerator, WalletLedger};
use whalecopy::models::{Signal, SignalType, Transaction};
use whalecopy::AppState;

pub const SWAP_SELECTOR: &str = "0x7ff36ab5";

/// In-memory application state built from `config`. The Prometheus handle
/// belongs to a recorder that is never installed globally, so tests can
/// build as many states as they like.
#[allow(dead_code)]
pub async fn test_state(config: AppConfig) -> AppState {
    let (ws_tx, _) = broadcast::channel::<WsMessage>(64);
    let prices = PriceBoard::new(None);
    prices.set(DEFAULT_SYMBOL, Decimal::from(3000)).await;

    AppState {
        ledger: WalletLedger::new(config.whale_history_capacity),
        signals: SignalGenerator::new(config.signal_policy(), config.signal_history_capacity),
        simulator: TradeSimulator::new(
            config.starting_balance,
            config.risk_policy(),
            Arc::new(SimulatedVenue::default()),
        ),
        prices,
        ws_tx,
        metrics_handle: PrometheusBuilder::new().build_recorder().handle(),
        notifier: None,
        pause_flag: Arc::new(AtomicBool::new(false)),
        config,
    }
}

/// A swap paying `eth` native value from `from`, priced at 3000 USD/ETH.
#[allow(dead_code)]
pub fn swap_tx(hash: &str, from: &str, eth: i64, at: DateTime<Utc>) -> Transaction {
    Transaction {
        hash: hash.into(),
        from: from.into(),
        to: "0x7a250d5630b4cf539739df2c5dacb4c659f2488d".into(),
        value: Decimal::from(eth),
        usd_value: Decimal::from(eth * 3000),
        fee: Decimal::new(3, 3),
        gas_used: 150_000,
        gas_price_gwei: Decimal::from(20),
        call_data: format!("{SWAP_SELECTOR}0000000000000000"),
        observed_at: at,
    }
}

#[allow(dead_code)]
pub fn make_signal(confidence: Decimal, at: DateTime<Utc>) -> Signal {
    Signal {
        id: Uuid::new_v4(),
        timestamp: at,
        whale_address: "0xwhale00000000000000000000000000000000001".into(),
        counterparty: "0xrouter".into(),
        value: Decimal::from(450_000),
        success_rate: Decimal::new(8, 1),
        transaction_count: 5,
        signal_type: SignalType::UniswapSwap,
        confidence,
        tx_hash: format!("0x{}", Uuid::new_v4().simple()),
    }
}
