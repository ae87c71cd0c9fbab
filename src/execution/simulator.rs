use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{CloseReason, PnlRecord, Position, PositionStatus, Side, Signal, SignalType};

use super::risk::{self, RiskPolicy, RiskViolation};
use super::venue::{ExecutionVenue, OrderRequest, VenueRejection};

/// Every signal type is traded on the same pair.
pub const DEFAULT_SYMBOL: &str = "ETHUSDT";

pub fn symbol_for(_signal_type: SignalType) -> &'static str {
    DEFAULT_SYMBOL
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenRejection {
    #[error("risk check failed: {0}")]
    Risk(#[from] RiskViolation),

    #[error("venue rejected order: {0}")]
    Venue(#[from] VenueRejection),

    #[error("fill produced non-positive quantity {0}")]
    InvalidQuantity(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloseError {
    #[error("position {0} is not active")]
    NotActive(Uuid),

    #[error("invalid exit price {0}")]
    InvalidExitPrice(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulatorSummary {
    pub balance: Decimal,
    pub open_positions: usize,
    pub closed_positions: usize,
    pub wins: usize,
    pub losses: usize,
    pub realized_pnl: Decimal,
}

/// Simulated account: balance, active positions and the PnL ledger.
///
/// All three live behind one lock so that a debit/credit and the matching
/// insert/remove of a position happen as one step. A monitor tick never sees
/// an active position whose notional has not been debited, and a position
/// can only be removed from the active set (and credited) once.
#[derive(Clone)]
pub struct TradeSimulator {
    inner: Arc<Mutex<SimulatorInner>>,
    policy: RiskPolicy,
    venue: Arc<dyn ExecutionVenue>,
}

struct SimulatorInner {
    balance: Decimal,
    active: HashMap<Uuid, Position>,
    ledger: Vec<PnlRecord>,
    /// position id → index into `ledger`.
    ledger_index: HashMap<Uuid, usize>,
}

impl TradeSimulator {
    pub fn new(starting_balance: Decimal, policy: RiskPolicy, venue: Arc<dyn ExecutionVenue>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimulatorInner {
                balance: starting_balance,
                active: HashMap::new(),
                ledger: Vec::new(),
                ledger_index: HashMap::new(),
            })),
            policy,
            venue,
        }
    }

    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Open a long position mirroring `signal` at `entry_price`.
    ///
    /// A rejection leaves balance, active set and ledger untouched.
    pub async fn open_position(
        &self,
        signal: &Signal,
        entry_price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Position, OpenRejection> {
        let mut inner = self.inner.lock().await;

        let sized = risk::size_position(inner.balance, entry_price, &self.policy)?;
        let symbol = symbol_for(signal.signal_type);

        let fill = self.venue.open(&OrderRequest {
            symbol: symbol.to_string(),
            side: Side::Buy,
            notional: sized.notional,
            reference_price: entry_price,
        })?;

        if fill.quantity <= Decimal::ZERO {
            return Err(OpenRejection::InvalidQuantity(fill.quantity));
        }

        let (stop_loss, take_profit) = risk::exit_levels(fill.price, &self.policy);
        let position = Position {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            side: Side::Buy,
            entry_price: fill.price,
            quantity: fill.quantity,
            notional: sized.notional,
            signal_id: signal.id,
            entry_time: now,
            stop_loss,
            take_profit,
        };

        inner.balance -= position.notional;
        let index = inner.ledger.len();
        inner.ledger.push(PnlRecord::opened(&position));
        inner.ledger_index.insert(position.id, index);
        inner.active.insert(position.id, position.clone());

        tracing::info!(
            position_id = %position.id,
            signal_id = %signal.id,
            symbol = %position.symbol,
            entry_price = %position.entry_price,
            quantity = %position.quantity,
            notional = %position.notional,
            stop_loss = %position.stop_loss,
            take_profit = %position.take_profit,
            balance = %inner.balance,
            "Position opened"
        );

        Ok(position)
    }

    /// Close an active position at `exit_price`. A position that is no longer
    /// active cannot be closed again.
    pub async fn close_position(
        &self,
        position_id: Uuid,
        exit_price: Decimal,
        reason: CloseReason,
        now: DateTime<Utc>,
    ) -> Result<PnlRecord, CloseError> {
        if exit_price <= Decimal::ZERO {
            return Err(CloseError::InvalidExitPrice(exit_price));
        }

        let mut inner = self.inner.lock().await;
        let Some(position) = inner.active.remove(&position_id) else {
            tracing::warn!(position_id = %position_id, reason = %reason, "Close refused: position not active");
            return Err(CloseError::NotActive(position_id));
        };

        Ok(inner.settle(position, exit_price, reason, now))
    }

    /// Evaluate every active position against the supplied prices. Stop-loss
    /// is checked before take-profit. Positions without a price are skipped
    /// until the next tick. Returns the records closed by this tick.
    pub async fn monitor_tick(
        &self,
        prices: &HashMap<String, Decimal>,
        now: DateTime<Utc>,
    ) -> Vec<PnlRecord> {
        let mut inner = self.inner.lock().await;

        let mut triggered = Vec::new();
        for position in inner.active.values() {
            let Some(&price) = prices.get(&position.symbol) else {
                tracing::debug!(
                    position_id = %position.id,
                    symbol = %position.symbol,
                    "No price for position, skipping this tick"
                );
                continue;
            };

            if price <= position.stop_loss {
                triggered.push((position.id, price, CloseReason::StopLoss));
            } else if price >= position.take_profit {
                triggered.push((position.id, price, CloseReason::TakeProfit));
            }
        }

        let mut closed = Vec::with_capacity(triggered.len());
        for (id, price, reason) in triggered {
            if let Some(position) = inner.active.remove(&id) {
                closed.push(inner.settle(position, price, reason, now));
            }
        }
        closed
    }

    pub async fn balance(&self) -> Decimal {
        self.inner.lock().await.balance
    }

    /// Active positions ordered by entry time.
    pub async fn active_positions(&self) -> Vec<Position> {
        let inner = self.inner.lock().await;
        let mut positions: Vec<Position> = inner.active.values().cloned().collect();
        positions.sort_by_key(|p| p.entry_time);
        positions
    }

    pub async fn active_position(&self, id: Uuid) -> Option<Position> {
        self.inner.lock().await.active.get(&id).cloned()
    }

    /// Symbols with at least one active position.
    pub async fn active_symbols(&self) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner
            .active
            .values()
            .map(|p| p.symbol.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// PnL ledger in open order.
    pub async fn pnl_ledger(&self) -> Vec<PnlRecord> {
        self.inner.lock().await.ledger.clone()
    }

    pub async fn total_realized_pnl(&self) -> Decimal {
        self.inner
            .lock()
            .await
            .ledger
            .iter()
            .filter_map(|r| r.pnl)
            .sum()
    }

    pub async fn summary(&self) -> SimulatorSummary {
        let inner = self.inner.lock().await;
        let closed: Vec<&PnlRecord> = inner
            .ledger
            .iter()
            .filter(|r| r.status == PositionStatus::Closed)
            .collect();

        SimulatorSummary {
            balance: inner.balance,
            open_positions: inner.active.len(),
            closed_positions: closed.len(),
            wins: closed.iter().filter(|r| r.pnl.is_some_and(|p| p > Decimal::ZERO)).count(),
            losses: closed.iter().filter(|r| r.pnl.is_some_and(|p| p < Decimal::ZERO)).count(),
            realized_pnl: closed.iter().filter_map(|r| r.pnl).sum(),
        }
    }
}

impl SimulatorInner {
    /// Credit the account and complete the ledger entry for a position that
    /// has already been removed from the active set.
    fn settle(
        &mut self,
        position: Position,
        exit_price: Decimal,
        reason: CloseReason,
        now: DateTime<Utc>,
    ) -> PnlRecord {
        let pnl = (exit_price - position.entry_price) * position.quantity;
        let pnl_pct = (exit_price - position.entry_price) / position.entry_price * Decimal::ONE_HUNDRED;

        self.balance += position.notional + pnl;

        let index = match self.ledger_index.get(&position.id) {
            Some(&i) => i,
            None => {
                // Opened positions always have a ledger row
                tracing::error!(position_id = %position.id, "Ledger entry missing for position, appending");
                self.ledger.push(PnlRecord::opened(&position));
                let i = self.ledger.len() - 1;
                self.ledger_index.insert(position.id, i);
                i
            }
        };
        let balance = self.balance;
        let record = &mut self.ledger[index];

        record.status = PositionStatus::Closed;
        record.exit_price = Some(exit_price);
        record.exit_time = Some(now);
        record.pnl = Some(pnl);
        record.pnl_pct = Some(pnl_pct);
        record.close_reason = Some(reason);

        tracing::info!(
            position_id = %position.id,
            symbol = %position.symbol,
            reason = %reason,
            entry_price = %position.entry_price,
            exit_price = %exit_price,
            pnl = %pnl,
            pnl_pct = %pnl_pct.round_dp(2),
            balance = %balance,
            "Position closed"
        );

        record.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::venue::SimulatedVenue;

    fn simulator(balance: i64) -> TradeSimulator {
        TradeSimulator::new(
            Decimal::from(balance),
            RiskPolicy::default(),
            Arc::new(SimulatedVenue::default()),
        )
    }

    fn signal() -> Signal {
        Signal {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            whale_address: "0xwhale".into(),
            counterparty: "0xrouter".into(),
            value: Decimal::from(450_000),
            success_rate: Decimal::new(8, 1),
            transaction_count: 6,
            signal_type: SignalType::UniswapSwap,
            confidence: Decimal::new(75, 2),
            tx_hash: "0xsource".into(),
        }
    }

    fn prices(price: i64) -> HashMap<String, Decimal> {
        HashMap::from([(DEFAULT_SYMBOL.to_string(), Decimal::from(price))])
    }

    #[tokio::test]
    async fn test_open_debits_balance_and_records_ledger() {
        let sim = simulator(1000);
        let sig = signal();
        let position = sim.open_position(&sig, Decimal::from(3000), Utc::now()).await.unwrap();

        assert_eq!(position.symbol, "ETHUSDT");
        assert_eq!(position.notional, Decimal::from(20));
        assert_eq!(position.signal_id, sig.id);
        assert_eq!(sim.balance().await, Decimal::from(980));
        assert_eq!(sim.active_positions().await.len(), 1);

        let ledger = sim.pnl_ledger().await;
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].status, PositionStatus::Open);
    }

    #[tokio::test]
    async fn test_open_rejected_below_minimum_leaves_balance() {
        let sim = simulator(50);
        let result = sim.open_position(&signal(), Decimal::from(3000), Utc::now()).await;

        assert!(matches!(
            result,
            Err(OpenRejection::Risk(RiskViolation::BelowMinimum { .. }))
        ));
        assert_eq!(sim.balance().await, Decimal::from(50));
        assert!(sim.active_positions().await.is_empty());
        assert!(sim.pnl_ledger().await.is_empty());
    }

    #[tokio::test]
    async fn test_monitor_tick_take_profit() {
        let sim = simulator(1000);
        // 20 / 2000 keeps the quantity exact
        let position = sim.open_position(&signal(), Decimal::from(2000), Utc::now()).await.unwrap();
        assert_eq!(position.quantity, Decimal::new(1, 2));
        assert_eq!(position.take_profit, Decimal::from(2300));

        // Between the levels: nothing happens
        assert!(sim.monitor_tick(&prices(2100), Utc::now()).await.is_empty());

        let closed = sim.monitor_tick(&prices(2300), Utc::now()).await;
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].close_reason, Some(CloseReason::TakeProfit));
        assert_eq!(closed[0].pnl, Some(Decimal::from(3)));
        assert_eq!(closed[0].pnl_pct, Some(Decimal::from(15)));
        assert_eq!(sim.balance().await, Decimal::from(1003));
        assert!(sim.active_positions().await.is_empty());
    }

    #[tokio::test]
    async fn test_monitor_tick_skips_missing_price() {
        let sim = simulator(1000);
        sim.open_position(&signal(), Decimal::from(3000), Utc::now()).await.unwrap();

        let closed = sim.monitor_tick(&HashMap::new(), Utc::now()).await;
        assert!(closed.is_empty());
        assert_eq!(sim.active_positions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_double_close_is_refused() {
        let sim = simulator(1000);
        let position = sim.open_position(&signal(), Decimal::from(3000), Utc::now()).await.unwrap();

        sim.close_position(position.id, Decimal::from(3000), CloseReason::Manual, Utc::now())
            .await
            .unwrap();
        let balance = sim.balance().await;

        let second = sim
            .close_position(position.id, Decimal::from(5000), CloseReason::Manual, Utc::now())
            .await;
        assert_eq!(second, Err(CloseError::NotActive(position.id)));
        assert_eq!(sim.balance().await, balance);
        assert_eq!(sim.pnl_ledger().await.len(), 1);
    }

    #[tokio::test]
    async fn test_close_rejects_invalid_exit_price() {
        let sim = simulator(1000);
        let position = sim.open_position(&signal(), Decimal::from(3000), Utc::now()).await.unwrap();

        let result = sim
            .close_position(position.id, Decimal::ZERO, CloseReason::Manual, Utc::now())
            .await;
        assert_eq!(result, Err(CloseError::InvalidExitPrice(Decimal::ZERO)));
        assert!(sim.active_position(position.id).await.is_some());
    }

    #[tokio::test]
    async fn test_summary_counts_wins_and_losses() {
        let sim = simulator(10_000);
        let winner = sim.open_position(&signal(), Decimal::from(3000), Utc::now()).await.unwrap();
        let loser = sim.open_position(&signal(), Decimal::from(3000), Utc::now()).await.unwrap();
        sim.open_position(&signal(), Decimal::from(3000), Utc::now()).await.unwrap();

        sim.close_position(winner.id, Decimal::from(3300), CloseReason::Manual, Utc::now())
            .await
            .unwrap();
        sim.close_position(loser.id, Decimal::from(2900), CloseReason::Manual, Utc::now())
            .await
            .unwrap();

        let summary = sim.summary().await;
        assert_eq!(summary.open_positions, 1);
        assert_eq!(summary.closed_positions, 2);
        assert_eq!(summary.wins, 1);
        assert_eq!(summary.losses, 1);
        assert_eq!(summary.realized_pnl, sim.total_realized_pnl().await);
        assert_eq!(sim.active_symbols().await, vec!["ETHUSDT".to_string()]);
    }

    #[test]
    fn test_symbol_for_every_type() {
        assert_eq!(symbol_for(SignalType::UniswapSwap), "ETHUSDT");
        assert_eq!(symbol_for(SignalType::ContractInteraction), "ETHUSDT");
    }
}
