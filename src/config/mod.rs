use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

use crate::execution::risk::RiskPolicy;
use crate::intelligence::classifier::{AlertThresholds, ClassificationMode};
use crate::intelligence::signal_generator::SignalPolicy;
use crate::services::aggregator::AggregatorConfig;

const DEFAULT_ETH_WS_URL: &str = "wss://ethereum-rpc.publicnode.com";
const DEFAULT_ETH_RPC_URL: &str = "https://ethereum-rpc.publicnode.com";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// When set, snapshots go to Postgres instead of `snapshot_path`.
    pub database_url: Option<String>,
    pub snapshot_path: String,
    pub api_token: Option<String>,

    // Node endpoints
    pub eth_ws_url: String,
    pub eth_rpc_url: String,
    /// Ask the node for full transaction objects instead of bare hashes.
    pub feed_full_transactions: bool,
    /// Per-request timeout for transaction detail lookups.
    pub rpc_timeout_secs: u64,
    pub native_price_usd: Decimal,

    // Analytics
    pub whale_threshold_eth: Decimal,
    pub copy_trade_threshold_usd: Decimal,
    pub min_signal_tx_count: u64,
    pub min_signal_success_rate: Decimal,
    pub success_window_hours: i64,
    pub classification_mode: String,
    pub whale_history_capacity: usize,
    pub signal_history_capacity: usize,
    pub wallet_ttl_hours: i64,

    // Simulated execution
    pub copy_enabled: bool,
    pub starting_balance: Decimal,
    pub risk_fraction: Decimal,
    pub max_trade_amount: Decimal,
    pub min_trade_amount: Decimal,
    pub stop_loss_fraction: Decimal,
    pub take_profit_fraction: Decimal,
    pub simulated_slippage_bps: u32,

    // Notifications
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,

    // Scheduling and backpressure
    pub position_monitor_interval_secs: u64,
    pub snapshot_interval_secs: u64,
    pub aggregator_top_interval_secs: u64,
    pub aggregator_signals_interval_secs: u64,
    pub aggregator_top_n: usize,
    pub signal_display_confidence: Decimal,
    pub feed_channel_capacity: usize,
    pub pipeline_max_in_flight: usize,
}

/// Read `key`, falling back to `default` when unset or unparseable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Invalid config value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            database_url: None,
            snapshot_path: "whalecopy_state.json".into(),
            api_token: None,

            eth_ws_url: DEFAULT_ETH_WS_URL.into(),
            eth_rpc_url: DEFAULT_ETH_RPC_URL.into(),
            feed_full_transactions: false,
            rpc_timeout_secs: 10,
            native_price_usd: Decimal::from(3000),

            whale_threshold_eth: Decimal::from(100),
            copy_trade_threshold_usd: Decimal::from(300_000),
            min_signal_tx_count: 5,
            min_signal_success_rate: Decimal::new(7, 1),
            success_window_hours: 24,
            classification_mode: "mirrored".into(),
            whale_history_capacity: 1000,
            signal_history_capacity: 100,
            wallet_ttl_hours: 720,

            copy_enabled: true,
            starting_balance: Decimal::from(1000),
            risk_fraction: Decimal::new(2, 2),
            max_trade_amount: Decimal::from(100),
            min_trade_amount: Decimal::from(10),
            stop_loss_fraction: Decimal::new(5, 2),
            take_profit_fraction: Decimal::new(15, 2),
            simulated_slippage_bps: 0,

            telegram_bot_token: None,
            telegram_chat_id: None,

            position_monitor_interval_secs: 5,
            snapshot_interval_secs: 60,
            aggregator_top_interval_secs: 300,
            aggregator_signals_interval_secs: 600,
            aggregator_top_n: 10,
            signal_display_confidence: Decimal::new(7, 1),
            feed_channel_capacity: 1000,
            pipeline_max_in_flight: 64,
        }
    }
}

impl AppConfig {
    /// Environment overrides on top of [`AppConfig::default`].
    pub fn from_env() -> anyhow::Result<Self> {
        let d = Self::default();

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("PORT must be a valid port number: {e}"))?,
            Err(_) => d.port,
        };

        let native_price_usd: Decimal = env_or("NATIVE_PRICE_USD", d.native_price_usd);
        if native_price_usd <= Decimal::ZERO {
            anyhow::bail!("NATIVE_PRICE_USD must be positive");
        }

        Ok(Self {
            host: env::var("HOST").unwrap_or(d.host),
            port,
            database_url: env_opt("DATABASE_URL"),
            snapshot_path: env::var("SNAPSHOT_PATH").unwrap_or(d.snapshot_path),
            api_token: env_opt("API_TOKEN"),

            eth_ws_url: env::var("ETH_WS_URL").unwrap_or(d.eth_ws_url),
            eth_rpc_url: env::var("ETH_RPC_URL").unwrap_or(d.eth_rpc_url),
            feed_full_transactions: env_or("FEED_FULL_TRANSACTIONS", d.feed_full_transactions),
            rpc_timeout_secs: env_or("RPC_TIMEOUT_SECS", d.rpc_timeout_secs),
            native_price_usd,

            whale_threshold_eth: env_or("WHALE_THRESHOLD_ETH", d.whale_threshold_eth),
            copy_trade_threshold_usd: env_or("COPY_TRADE_THRESHOLD_USD", d.copy_trade_threshold_usd),
            min_signal_tx_count: env_or("MIN_SIGNAL_TX_COUNT", d.min_signal_tx_count),
            min_signal_success_rate: env_or("MIN_SIGNAL_SUCCESS_RATE", d.min_signal_success_rate),
            success_window_hours: env_or("SUCCESS_WINDOW_HOURS", d.success_window_hours),
            classification_mode: env::var("CLASSIFICATION_MODE").unwrap_or(d.classification_mode),
            whale_history_capacity: env_or("WHALE_HISTORY_CAPACITY", d.whale_history_capacity),
            signal_history_capacity: env_or("SIGNAL_HISTORY_CAPACITY", d.signal_history_capacity),
            wallet_ttl_hours: env_or("WALLET_TTL_HOURS", d.wallet_ttl_hours),

            copy_enabled: env_or("COPY_ENABLED", d.copy_enabled),
            starting_balance: env_or("STARTING_BALANCE", d.starting_balance),
            risk_fraction: env_or("RISK_FRACTION", d.risk_fraction),
            max_trade_amount: env_or("MAX_TRADE_AMOUNT", d.max_trade_amount),
            min_trade_amount: env_or("MIN_TRADE_AMOUNT", d.min_trade_amount),
            stop_loss_fraction: env_or("STOP_LOSS_FRACTION", d.stop_loss_fraction),
            take_profit_fraction: env_or("TAKE_PROFIT_FRACTION", d.take_profit_fraction),
            simulated_slippage_bps: env_or("SIMULATED_SLIPPAGE_BPS", d.simulated_slippage_bps),

            telegram_bot_token: env_opt("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: env_opt("TELEGRAM_CHAT_ID"),

            position_monitor_interval_secs: env_or("POSITION_MONITOR_INTERVAL_SECS", d.position_monitor_interval_secs),
            snapshot_interval_secs: env_or("SNAPSHOT_INTERVAL_SECS", d.snapshot_interval_secs),
            aggregator_top_interval_secs: env_or("AGGREGATOR_TOP_INTERVAL_SECS", d.aggregator_top_interval_secs),
            aggregator_signals_interval_secs: env_or(
                "AGGREGATOR_SIGNALS_INTERVAL_SECS",
                d.aggregator_signals_interval_secs,
            ),
            aggregator_top_n: env_or("AGGREGATOR_TOP_N", d.aggregator_top_n),
            signal_display_confidence: env_or("SIGNAL_DISPLAY_CONFIDENCE", d.signal_display_confidence),
            feed_channel_capacity: env_or("FEED_CHANNEL_CAPACITY", d.feed_channel_capacity),
            pipeline_max_in_flight: env_or("PIPELINE_MAX_IN_FLIGHT", d.pipeline_max_in_flight),
        })
    }

    pub fn signal_policy(&self) -> SignalPolicy {
        SignalPolicy {
            copy_trade_threshold: self.copy_trade_threshold_usd,
            min_transaction_count: self.min_signal_tx_count,
            min_success_rate: self.min_signal_success_rate,
            success_window_hours: self.success_window_hours,
        }
    }

    pub fn risk_policy(&self) -> RiskPolicy {
        RiskPolicy {
            risk_fraction: self.risk_fraction,
            max_trade_amount: self.max_trade_amount,
            min_trade_amount: self.min_trade_amount,
            stop_loss_fraction: self.stop_loss_fraction,
            take_profit_fraction: self.take_profit_fraction,
        }
    }

    pub fn alert_thresholds(&self) -> AlertThresholds {
        AlertThresholds {
            whale_value: self.whale_threshold_eth,
            ..AlertThresholds::default()
        }
    }

    pub fn classification_mode(&self) -> ClassificationMode {
        ClassificationMode::from_str(&self.classification_mode)
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            top_n: self.aggregator_top_n,
            top_interval_secs: self.aggregator_top_interval_secs,
            signals_interval_secs: self.aggregator_signals_interval_secs,
            display_confidence: self.signal_display_confidence,
            ..AggregatorConfig::default()
        }
    }

    pub fn wallet_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.wallet_ttl_hours.max(0))
    }
}
