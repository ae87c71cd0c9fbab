use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of `0x` + a 4-byte function selector in hex.
pub const SELECTOR_HEX_LEN: usize = 10;

/// Canonical, immutable view of an observed Ethereum transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    /// Sender address (lower-case).
    pub from: String,
    /// Recipient address (lower-case). Empty for contract creation.
    pub to: String,
    /// Native value in ETH.
    pub value: Decimal,
    /// `value` converted to USD at the configured native price.
    pub usd_value: Decimal,
    /// gas × gas price, in ETH.
    pub fee: Decimal,
    pub gas_used: u64,
    pub gas_price_gwei: Decimal,
    /// Hex-encoded call data including the `0x` prefix.
    pub call_data: String,
    pub observed_at: DateTime<Utc>,
}

impl Transaction {
    /// The 4-byte function selector (`0x` + 8 hex chars), lower-cased, if
    /// the call data is long enough to carry one.
    pub fn selector(&self) -> Option<String> {
        self.call_data
            .get(..SELECTOR_HEX_LEN)
            .map(|selector| selector.to_ascii_lowercase())
    }
}

/// At most the first `n` bytes of `s`, cut back to a char boundary.
fn prefix(s: &str, n: usize) -> &str {
    let mut end = n.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tx: hash={} from={} to={} value={} ETH fee={} ETH",
            prefix(&self.hash, 10),
            prefix(&self.from, 10),
            prefix(&self.to, 10),
            self.value,
            self.fee,
        )
    }
}
