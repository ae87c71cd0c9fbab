use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use whalecopy::api::router::create_router;
use whalecopy::api::ws_types::WsMessage;
use whalecopy::config::AppConfig;
use whalecopy::execution::copy_engine::run_copy_engine;
use whalecopy::execution::{PriceBoard, SimulatedVenue, TradeSimulator, DEFAULT_SYMBOL};
use whalecopy::ingestion::feed_listener::FeedItem;
use whalecopy::ingestion::{run_feed_listener, run_pipeline, PipelineContext};
use whalecopy::intelligence::{SignalGenerator, WalletLedger};
use whalecopy::models::Signal;
use whalecopy::rpc::DetailClient;
use whalecopy::services::notifier::Notifier;
use whalecopy::services::snapshot::{self, JsonFileStore, PgSnapshotStore, SnapshotStore};
use whalecopy::services::{aggregator, position_monitor};
use whalecopy::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // Both ring and aws-lc-rs can end up linked; pin one before any TLS use.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);
    let metrics_handle = metrics::init_metrics()?;

    // --- Analytics state, restored from the last snapshot ---
    let ledger = WalletLedger::new(config.whale_history_capacity);
    let signals = SignalGenerator::new(config.signal_policy(), config.signal_history_capacity);

    let store = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = db::init_pool(url).await?;
            tracing::info!("Database connected");
            SnapshotStore::Postgres(PgSnapshotStore::new(pool).await?)
        }
        None => SnapshotStore::File(JsonFileStore::new(&config.snapshot_path)),
    };

    match store.load().await {
        Ok(Some(saved)) => snapshot::restore_snapshot(saved, &ledger, &signals).await,
        Ok(None) => tracing::info!(store = store.kind(), "No snapshot found, starting fresh"),
        Err(e) => tracing::error!(error = %e, store = store.kind(), "Failed to load snapshot, starting fresh"),
    }

    let notifier = match (&config.telegram_bot_token, &config.telegram_chat_id) {
        (Some(token), Some(chat_id)) => {
            tracing::info!("Telegram notifier enabled");
            Some(Arc::new(Notifier::new(token.clone(), chat_id.clone())))
        }
        _ => {
            tracing::info!("Telegram not configured, notifications go to the log");
            None
        }
    };

    // --- Simulated execution ---
    let (ws_broadcast_tx, _) = broadcast::channel::<WsMessage>(256);
    let pause_flag = Arc::new(AtomicBool::new(false));
    let prices = PriceBoard::new(Some(config.native_price_usd));
    prices.set(DEFAULT_SYMBOL, config.native_price_usd).await;

    let simulator = TradeSimulator::new(
        config.starting_balance,
        config.risk_policy(),
        Arc::new(SimulatedVenue::new(config.simulated_slippage_bps)),
    );
    metrics::record_account(&simulator).await;

    let signal_tx = if config.copy_enabled {
        let (signal_tx, signal_rx) = mpsc::channel::<Signal>(500);
        tokio::spawn(run_copy_engine(
            signal_rx,
            simulator.clone(),
            prices.clone(),
            notifier.clone(),
            ws_broadcast_tx.clone(),
            pause_flag.clone(),
        ));
        tracing::info!(
            balance = %config.starting_balance,
            slippage_bps = config.simulated_slippage_bps,
            "Copy engine spawned"
        );
        Some(signal_tx)
    } else {
        tracing::info!("Copy engine disabled (COPY_ENABLED=false)");
        None
    };

    tokio::spawn(position_monitor::run_position_monitor(
        simulator.clone(),
        prices.clone(),
        config.position_monitor_interval_secs,
        notifier.clone(),
        ws_broadcast_tx.clone(),
    ));

    // --- Data pipeline: feed -> analytics -> copy engine ---
    let (feed_tx, feed_rx) = mpsc::channel::<FeedItem>(config.feed_channel_capacity.max(1));
    let pipeline = Arc::new(PipelineContext {
        ledger: ledger.clone(),
        signals: signals.clone(),
        thresholds: config.alert_thresholds(),
        mode: config.classification_mode(),
        native_price_usd: config.native_price_usd,
        detail: Some(DetailClient::with_timeout(
            config.eth_rpc_url.clone(),
            config.native_price_usd,
            Duration::from_secs(config.rpc_timeout_secs.max(1)),
        )?),
        signal_tx,
        notifier: notifier.clone(),
        ws_tx: ws_broadcast_tx.clone(),
    });
    tracing::info!(
        mode = %pipeline.mode,
        whale_threshold_eth = %config.whale_threshold_eth,
        copy_threshold_usd = %config.copy_trade_threshold_usd,
        "Starting transaction pipeline"
    );
    tokio::spawn(run_pipeline(feed_rx, pipeline, config.pipeline_max_in_flight));
    tokio::spawn(run_feed_listener(
        config.eth_ws_url.clone(),
        config.feed_full_transactions,
        feed_tx,
    ));

    // --- Periodic jobs ---
    let aggregator_config = config.aggregator_config();
    tokio::spawn(aggregator::run_top_wallets_job(
        ledger.clone(),
        config.signal_policy(),
        aggregator_config.clone(),
        notifier.clone(),
    ));
    tokio::spawn(aggregator::run_recent_signals_job(
        signals.clone(),
        aggregator_config,
        notifier.clone(),
    ));
    tokio::spawn(snapshot::run_snapshot_job(
        store,
        ledger.clone(),
        signals.clone(),
        config.snapshot_interval_secs,
        config.wallet_ttl(),
    ));

    let state = AppState {
        config,
        ledger,
        signals,
        simulator,
        prices,
        ws_tx: ws_broadcast_tx,
        metrics_handle,
        notifier,
        pause_flag,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

/// `RUST_LOG` filter (default `info`); JSON lines when `LOG_FORMAT=json`.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let (plain, structured) = if json {
        (None, Some(fmt::layer().json()))
    } else {
        (Some(fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(structured)
        .init();
}
