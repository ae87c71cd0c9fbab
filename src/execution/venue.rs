use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::Side;

/// Order handed to an execution venue. The venue never manages exits; the
/// simulator owns stop-loss and take-profit.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub notional: Decimal,
    pub reference_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    pub price: Decimal,
    pub quantity: Decimal,
    /// Relative difference between fill and reference price.
    pub slippage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VenueRejection {
    #[error("invalid reference price {0}")]
    InvalidPrice(Decimal),

    #[error("invalid notional {0}")]
    InvalidNotional(Decimal),

    #[error("venue unavailable: {0}")]
    Unavailable(String),
}

/// An exchange adapter: takes an order, returns a fill or a rejection.
pub trait ExecutionVenue: Send + Sync {
    fn open(&self, order: &OrderRequest) -> Result<Fill, VenueRejection>;
}

/// In-memory venue that fills at the reference price, worsened by a fixed
/// slippage in basis points.
#[derive(Debug, Clone, Default)]
pub struct SimulatedVenue {
    slippage_bps: u32,
}

impl SimulatedVenue {
    pub fn new(slippage_bps: u32) -> Self {
        Self { slippage_bps }
    }
}

impl ExecutionVenue for SimulatedVenue {
    fn open(&self, order: &OrderRequest) -> Result<Fill, VenueRejection> {
        if order.reference_price <= Decimal::ZERO {
            return Err(VenueRejection::InvalidPrice(order.reference_price));
        }
        if order.notional <= Decimal::ZERO {
            return Err(VenueRejection::InvalidNotional(order.notional));
        }

        let slippage = Decimal::from(self.slippage_bps) / Decimal::from(10_000);
        let price = match order.side {
            Side::Buy => order.reference_price * (Decimal::ONE + slippage),
            Side::Sell => order.reference_price * (Decimal::ONE - slippage),
        };

        if price <= Decimal::ZERO {
            return Err(VenueRejection::InvalidPrice(price));
        }

        tracing::debug!(
            symbol = %order.symbol,
            side = %order.side,
            notional = %order.notional,
            reference_price = %order.reference_price,
            fill_price = %price,
            "[SIMULATED] Order filled"
        );

        Ok(Fill {
            price,
            quantity: order.notional / price,
            slippage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(side: Side, notional: i64, price: i64) -> OrderRequest {
        OrderRequest {
            symbol: "ETHUSDT".into(),
            side,
            notional: Decimal::from(notional),
            reference_price: Decimal::from(price),
        }
    }

    #[test]
    fn test_fills_at_reference_without_slippage() {
        let fill = SimulatedVenue::default().open(&order(Side::Buy, 30, 3000)).unwrap();
        assert_eq!(fill.price, Decimal::from(3000));
        assert_eq!(fill.quantity, Decimal::new(1, 2));
        assert_eq!(fill.slippage, Decimal::ZERO);
    }

    #[test]
    fn test_slippage_worsens_buy_price() {
        let fill = SimulatedVenue::new(50).open(&order(Side::Buy, 30, 3000)).unwrap();
        // 50 bps on 3000
        assert_eq!(fill.price, Decimal::from(3015));

        let fill = SimulatedVenue::new(50).open(&order(Side::Sell, 30, 3000)).unwrap();
        assert_eq!(fill.price, Decimal::from(2985));
    }

    #[test]
    fn test_rejects_non_positive_inputs() {
        let venue = SimulatedVenue::default();
        assert_eq!(
            venue.open(&order(Side::Buy, 30, 0)),
            Err(VenueRejection::InvalidPrice(Decimal::ZERO))
        );
        assert_eq!(
            venue.open(&order(Side::Buy, 0, 3000)),
            Err(VenueRejection::InvalidNotional(Decimal::ZERO))
        );
    }
}
