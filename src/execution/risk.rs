use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sizing and exit limits for simulated positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPolicy {
    /// Fraction of the account balance committed per trade (default 2%).
    pub risk_fraction: Decimal,
    /// Cap on a single trade's notional (default 100).
    pub max_trade_amount: Decimal,
    /// Floor below which a trade is not worth opening (default 10).
    pub min_trade_amount: Decimal,
    /// Stop-loss distance below entry (default 5%).
    pub stop_loss_fraction: Decimal,
    /// Take-profit distance above entry (default 15%).
    pub take_profit_fraction: Decimal,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            risk_fraction: Decimal::new(2, 2), // 0.02
            max_trade_amount: Decimal::from(100),
            min_trade_amount: Decimal::from(10),
            stop_loss_fraction: Decimal::new(5, 2),    // 0.05
            take_profit_fraction: Decimal::new(15, 2), // 0.15
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RiskViolation {
    #[error("notional {notional} below minimum trade amount {min}")]
    BelowMinimum { notional: Decimal, min: Decimal },

    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    #[error("invalid entry price {0}")]
    InvalidPrice(Decimal),
}

/// Sized order produced from the account balance and an entry price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizedOrder {
    pub notional: Decimal,
    pub quantity: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

/// `notional = min(balance × risk_fraction, max_trade_amount)`.
pub fn notional_for(balance: Decimal, policy: &RiskPolicy) -> Decimal {
    (balance * policy.risk_fraction).min(policy.max_trade_amount)
}

/// Size a position and derive its exit levels. Rejections leave the caller's
/// state untouched.
pub fn size_position(
    balance: Decimal,
    entry_price: Decimal,
    policy: &RiskPolicy,
) -> Result<SizedOrder, RiskViolation> {
    if entry_price <= Decimal::ZERO {
        return Err(RiskViolation::InvalidPrice(entry_price));
    }

    let notional = notional_for(balance, policy);

    if notional < policy.min_trade_amount {
        return Err(RiskViolation::BelowMinimum {
            notional,
            min: policy.min_trade_amount,
        });
    }

    if notional > balance {
        return Err(RiskViolation::InsufficientBalance {
            required: notional,
            available: balance,
        });
    }

    let (stop_loss, take_profit) = exit_levels(entry_price, policy);

    Ok(SizedOrder {
        notional,
        quantity: notional / entry_price,
        stop_loss,
        take_profit,
    })
}

/// Stop-loss and take-profit prices for an entry.
pub fn exit_levels(entry_price: Decimal, policy: &RiskPolicy) -> (Decimal, Decimal) {
    (
        entry_price * (Decimal::ONE - policy.stop_loss_fraction),
        entry_price * (Decimal::ONE + policy.take_profit_fraction),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
