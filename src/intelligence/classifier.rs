use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{SignalType, Transaction};

// ---------------------------------------------------------------------------
// Function selectors
// ---------------------------------------------------------------------------

/// swapExactETHForTokens(uint256,address[],address,uint256)
const SWAP_EXACT_ETH_FOR_TOKENS: &str = "0x7ff36ab5";
/// swapExactTokensForTokens(uint256,uint256,address[],address,uint256)
const SWAP_EXACT_TOKENS_FOR_TOKENS: &str = "0x38ed1739";
/// swapExactTokensForETH(uint256,uint256,address[],address,uint256)
const SWAP_EXACT_TOKENS_FOR_ETH: &str = "0x18cbafe5";
/// transfer(address,uint256)
const ERC20_TRANSFER: &str = "0xa9059cbb";
/// transferFrom(address,address,uint256)
const ERC20_TRANSFER_FROM: &str = "0x23b872dd";

/// Classify a transaction from its call-data selector.
pub fn classify_signal_type(tx: &Transaction) -> SignalType {
    match tx.selector().as_deref() {
        Some(SWAP_EXACT_ETH_FOR_TOKENS)
        | Some(SWAP_EXACT_TOKENS_FOR_TOKENS)
        | Some(SWAP_EXACT_TOKENS_FOR_ETH) => SignalType::UniswapSwap,
        Some(ERC20_TRANSFER) => SignalType::TokenTransfer,
        Some(ERC20_TRANSFER_FROM) => SignalType::TokenTransferFrom,
        None if tx.value > Decimal::ZERO => SignalType::EthTransfer,
        _ => SignalType::ContractInteraction,
    }
}

// ---------------------------------------------------------------------------
// Buy / sell flags
// ---------------------------------------------------------------------------

/// How buy/sell flags are derived for the wallet ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMode {
    /// Both flags come from the same predicate (the transaction is a swap),
    /// so a swap counts as a buy and a sell at once.
    Mirrored,
    /// A swap paying native value is a buy; a swap without value is a sell.
    Directional,
}

impl ClassificationMode {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "directional" => ClassificationMode::Directional,
            _ => ClassificationMode::Mirrored,
        }
    }
}

impl fmt::Display for ClassificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationMode::Mirrored => write!(f, "mirrored"),
            ClassificationMode::Directional => write!(f, "directional"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityFlags {
    pub is_buy: bool,
    pub is_sell: bool,
}

pub fn classify_activity(tx: &Transaction, mode: ClassificationMode) -> ActivityFlags {
    let is_swap = classify_signal_type(tx) == SignalType::UniswapSwap;

    match mode {
        ClassificationMode::Mirrored => ActivityFlags {
            is_buy: is_swap,
            is_sell: is_swap,
        },
        ClassificationMode::Directional => ActivityFlags {
            is_buy: is_swap && tx.value > Decimal::ZERO,
            is_sell: is_swap && tx.value.is_zero(),
        },
    }
}

// ---------------------------------------------------------------------------
// Observation alerts
// ---------------------------------------------------------------------------

/// Thresholds for the per-transaction observation alerts.
#[derive(Debug, Clone)]
pub struct AlertThresholds {
    /// Native value (ETH) at which a transfer is whale-grade.
    pub whale_value: Decimal,
    /// Fee (ETH) at which a transaction is reported as high-fee.
    pub high_fee: Decimal,
    /// Below this native value a gas-heavy call is a probable token transfer.
    pub token_transfer_max_value: Decimal,
    pub token_transfer_min_gas: u64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            whale_value: Decimal::from(100),
            high_fee: Decimal::new(1, 1),                // 0.1 ETH
            token_transfer_max_value: Decimal::new(1, 2), // 0.01 ETH
            token_transfer_min_gas: 65_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxAlert {
    WhaleTransfer,
    HighFee,
    TokenTransfer,
}

/// Every alert category the transaction falls into.
pub fn detect_alerts(tx: &Transaction, thresholds: &AlertThresholds) -> Vec<TxAlert> {
    let mut alerts = Vec::new();

    if is_whale_transfer(tx, thresholds) {
        alerts.push(TxAlert::WhaleTransfer);
    }
    if tx.fee >= thresholds.high_fee {
        alerts.push(TxAlert::HighFee);
    }
    if tx.value < thresholds.token_transfer_max_value && tx.gas_used > thresholds.token_transfer_min_gas {
        alerts.push(TxAlert::TokenTransfer);
    }

    alerts
}

/// Whether the transaction qualifies for the wallet ledger.
pub fn is_whale_transfer(tx: &Transaction, thresholds: &AlertThresholds) -> bool {
    tx.value >= thresholds.whale_value
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
