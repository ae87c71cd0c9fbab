pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod execution;
pub mod ingestion;
pub mod intelligence;
pub mod metrics;
pub mod models;
pub mod rpc;
pub mod services;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::api::ws_types::WsMessage;
use crate::config::AppConfig;
use crate::execution::{PriceBoard, TradeSimulator};
use crate::intelligence::{SignalGenerator, WalletLedger};
use crate::services::notifier::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub ledger: WalletLedger,
    pub signals: SignalGenerator,
    pub simulator: TradeSimulator,
    pub prices: PriceBoard,
    pub ws_tx: broadcast::Sender<WsMessage>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub notifier: Option<Arc<Notifier>>,
    /// Set by the control API; the copy engine skips signals while true.
    pub pause_flag: Arc<AtomicBool>,
}
