use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::Transaction;
use crate::rpc::types::RpcTransaction;

/// ETH has 18 decimals.
const WEI_DECIMALS: u32 = 18;

/// Gwei has 9 decimals relative to wei.
const GWEI_DECIMALS: u32 = 9;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("transaction has no hash")]
    MissingHash,

    #[error("transaction {0} has no sender")]
    MissingSender(String),

    #[error("malformed hex quantity in `{field}`: {raw}")]
    MalformedQuantity { field: &'static str, raw: String },

    #[error("malformed `{field}`: {raw}")]
    MalformedField { field: &'static str, raw: String },

    #[error("quantity out of range in `{0}`")]
    OutOfRange(&'static str),

    #[error("payload is not a transaction object: {0}")]
    InvalidPayload(String),
}

/// Convert a raw JSON-RPC transaction into the canonical `Transaction`.
///
/// `native_price_usd` converts the ETH value to the monetary value used by
/// the wallet ledger and signal thresholds.
pub fn normalize(
    raw: &RpcTransaction,
    native_price_usd: Decimal,
    observed_at: DateTime<Utc>,
) -> Result<Transaction, NormalizeError> {
    let hash = raw
        .hash
        .as_deref()
        .filter(|h| !h.is_empty())
        .ok_or(NormalizeError::MissingHash)?;
    let hash = ascii_lowercase("hash", hash)?;

    let from = raw
        .from
        .as_deref()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| NormalizeError::MissingSender(hash.clone()))?;
    let from = ascii_lowercase("from", from)?;

    let to = ascii_lowercase("to", raw.to.as_deref().unwrap_or_default())?;

    let value_wei = parse_hex_quantity("value", raw.value.as_deref())?;
    let gas = parse_hex_quantity("gas", raw.gas.as_deref())?;
    let gas_price_wei = match raw.gas_price.as_deref() {
        Some(p) => parse_hex_quantity("gasPrice", Some(p))?,
        None => parse_hex_quantity("maxFeePerGas", raw.max_fee_per_gas.as_deref())?,
    };

    let fee_wei = gas
        .checked_mul(gas_price_wei)
        .ok_or(NormalizeError::OutOfRange("fee"))?;

    let value = scale_down("value", value_wei, WEI_DECIMALS)?;
    let fee = scale_down("fee", fee_wei, WEI_DECIMALS)?;
    let gas_price_gwei = scale_down("gasPrice", gas_price_wei, GWEI_DECIMALS)?;
    let gas_used = u64::try_from(gas).map_err(|_| NormalizeError::OutOfRange("gas"))?;

    let call_data = match raw.input.as_deref() {
        Some(input) if !input.is_empty() => parse_call_data(input)?,
        _ => "0x".to_string(),
    };

    Ok(Transaction {
        hash,
        from,
        to,
        value,
        usd_value: value * native_price_usd,
        fee,
        gas_used,
        gas_price_gwei,
        call_data,
        observed_at,
    })
}

/// Normalize an untyped JSON payload (feed notification or RPC result).
pub fn normalize_value(
    payload: &serde_json::Value,
    native_price_usd: Decimal,
    observed_at: DateTime<Utc>,
) -> Result<Transaction, NormalizeError> {
    let raw: RpcTransaction = serde_json::from_value(payload.clone())
        .map_err(|e| NormalizeError::InvalidPayload(e.to_string()))?;
    normalize(&raw, native_price_usd, observed_at)
}

fn ascii_lowercase(field: &'static str, raw: &str) -> Result<String, NormalizeError> {
    if !raw.is_ascii() {
        return Err(NormalizeError::MalformedField {
            field,
            raw: raw.to_string(),
        });
    }
    Ok(raw.to_ascii_lowercase())
}

/// Call data must be `0x` followed by hex digits only.
fn parse_call_data(raw: &str) -> Result<String, NormalizeError> {
    let well_formed = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .is_some_and(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()));
    if !well_formed {
        return Err(NormalizeError::MalformedField {
            field: "input",
            raw: raw.to_string(),
        });
    }
    Ok(raw.to_ascii_lowercase())
}

/// Parse a `0x`-prefixed hex quantity. A missing or empty quantity is zero.
fn parse_hex_quantity(field: &'static str, raw: Option<&str>) -> Result<u128, NormalizeError> {
    let Some(raw) = raw else {
        return Ok(0);
    };

    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw)
        .trim_start_matches('0');

    if digits.is_empty() {
        return Ok(0);
    }

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(NormalizeError::MalformedQuantity {
            field,
            raw: raw.to_string(),
        });
    }

    // u128 holds 32 hex digits
    if digits.len() > 32 {
        return Err(NormalizeError::OutOfRange(field));
    }

    u128::from_str_radix(digits, 16).map_err(|_| NormalizeError::MalformedQuantity {
        field,
        raw: raw.to_string(),
    })
}

/// Divide an integer base-unit amount by 10^decimals without losing precision.
fn scale_down(field: &'static str, amount: u128, decimals: u32) -> Result<Decimal, NormalizeError> {
    let signed = i128::try_from(amount).map_err(|_| NormalizeError::OutOfRange(field))?;
    Decimal::try_from_i128_with_scale(signed, decimals)
        .map(|d| d.normalize())
        .map_err(|_| NormalizeError::OutOfRange(field))
}
