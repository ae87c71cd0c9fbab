use rust_decimal::Decimal;
use serde_json::json;

use crate::execution::simulator::OpenRejection;
use crate::intelligence::classifier::TxAlert;
use crate::models::{PnlRecord, Position, Signal, Transaction, WalletStat};

/// Telegram notification service. Failures are logged but never block the main flow.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl Notifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token,
            chat_id,
        }
    }

    /// Send a Telegram message. Failures are logged as warnings.
    pub async fn send(&self, message: &str) {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let body = json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "Markdown",
        });

        match self.http.post(&url).json(&body).send().await {
            Ok(resp) => {
                if !resp.status().is_success() {
                    tracing::warn!(
                        status = %resp.status(),
                        "Telegram sendMessage returned non-2xx"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to send Telegram notification");
            }
        }
    }
}

/// Hand a message to the notifier when one is configured, otherwise log it.
pub async fn deliver(notifier: Option<&Notifier>, message: &str) {
    match notifier {
        Some(n) => n.send(message).await,
        None => tracing::debug!(text = message, "Notification (no notifier configured)"),
    }
}

fn short(addr: &str) -> String {
    let head = addr.get(..6);
    let tail = addr.len().checked_sub(4).and_then(|start| addr.get(start..));
    if let (true, Some(head), Some(tail)) = (addr.len() > 10, head, tail) {
        format!("{head}...{tail}")
    } else if addr.is_empty() {
        "(contract creation)".to_string()
    } else {
        addr.to_string()
    }
}

fn pct(rate: Decimal) -> Decimal {
    (rate * Decimal::ONE_HUNDRED).round_dp(1)
}

/// Format a copy-trade signal alert.
pub fn format_signal_alert(signal: &Signal) -> String {
    format!(
        "*Copy Signal*\nWhale: `{}`\nCounterparty: `{}`\nType: {}\nValue: ${}\nSuccess Rate: {}%\nTransactions: {}\nConfidence: {}%\nTx: `{}`",
        short(&signal.whale_address),
        short(&signal.counterparty),
        signal.signal_type,
        signal.value.round_dp(2),
        pct(signal.success_rate),
        signal.transaction_count,
        pct(signal.confidence),
        short(&signal.tx_hash),
    )
}

/// Format an observation alert for a single transaction.
pub fn format_tx_alert(alert: TxAlert, tx: &Transaction) -> String {
    match alert {
        TxAlert::WhaleTransfer => format!(
            "*Whale Transfer*\nFrom: `{}`\nTo: `{}`\nValue: {} ETH (${})\nTx: `{}`",
            short(&tx.from),
            short(&tx.to),
            tx.value.round_dp(4),
            tx.usd_value.round_dp(2),
            short(&tx.hash),
        ),
        TxAlert::HighFee => format!(
            "*High Fee Transaction*\nFrom: `{}`\nFee: {} ETH\nGas Price: {} gwei\nTx: `{}`",
            short(&tx.from),
            tx.fee.round_dp(6),
            tx.gas_price_gwei.round_dp(2),
            short(&tx.hash),
        ),
        TxAlert::TokenTransfer => format!(
            "*Probable Token Transfer*\nFrom: `{}`\nContract: `{}`\nGas: {}\nTx: `{}`",
            short(&tx.from),
            short(&tx.to),
            tx.gas_used,
            short(&tx.hash),
        ),
    }
}

pub fn format_trade_opened(position: &Position, balance: Decimal) -> String {
    format!(
        "*Position Opened*\nSymbol: {}\nSide: {}\nEntry: {}\nQuantity: {}\nNotional: ${}\nStop Loss: {}\nTake Profit: {}\nBalance: ${}",
        position.symbol,
        position.side,
        position.entry_price.round_dp(2),
        position.quantity.round_dp(8),
        position.notional.round_dp(2),
        position.stop_loss.round_dp(2),
        position.take_profit.round_dp(2),
        balance.round_dp(2),
    )
}

pub fn format_trade_rejected(signal: &Signal, reason: &OpenRejection) -> String {
    format!(
        "*Trade Rejected*\nWhale: `{}`\nType: {}\nReason: {}",
        short(&signal.whale_address),
        signal.signal_type,
        reason,
    )
}

pub fn format_trade_closed(record: &PnlRecord) -> String {
    let reason = record
        .close_reason
        .map(|r| r.to_string())
        .unwrap_or_else(|| "UNKNOWN".into());

    format!(
        "*Position Closed* ({})\nSymbol: {}\nEntry: {}\nExit: {}\nPnL: ${} ({}%)",
        reason,
        record.symbol,
        record.entry_price.round_dp(2),
        record.exit_price.unwrap_or_default().round_dp(2),
        record.pnl.unwrap_or_default().round_dp(2),
        record.pnl_pct.unwrap_or_default().round_dp(2),
    )
}

/// Ranked "top whales" report line set.
pub fn format_top_wallets(wallets: &[(WalletStat, Decimal)]) -> String {
    let mut out = String::from("*Top Whales by Volume*\n");
    for (rank, (stat, success_rate)) in wallets.iter().enumerate() {
        out.push_str(&format!(
            "{}. `{}` volume ${} | {} txs | avg ${} | success {}%\n",
            rank + 1,
            short(&stat.address),
            stat.total_volume.round_dp(2),
            stat.transaction_count,
            stat.average_size.round_dp(2),
            pct(*success_rate),
        ));
    }
    out
}

pub fn format_recent_signals(signals: &[Signal]) -> String {
    let mut out = String::from("*Recent High-Confidence Signals*\n");
    for (rank, signal) in signals.iter().enumerate() {
        out.push_str(&format!(
            "{}. `{}` {} ${} | confidence {}% | {}\n",
            rank + 1,
            short(&signal.whale_address),
            signal.signal_type,
            signal.value.round_dp(2),
            pct(signal.confidence),
            signal.timestamp.format("%H:%M:%S"),
        ));
    }
    out
}
