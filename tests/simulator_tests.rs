mod common;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use whalecopy::execution::risk::RiskViolation;
use whalecopy::execution::simulator::{CloseError, OpenRejection};
use whalecopy::execution::{RiskPolicy, SimulatedVenue, TradeSimulator, DEFAULT_SYMBOL};
use whalecopy::models::{CloseReason, PositionStatus};

fn simulator(balance: i64) -> TradeSimulator {
    TradeSimulator::new(
        Decimal::from(balance),
        RiskPolicy::default(),
        Arc::new(SimulatedVenue::default()),
    )
}

fn quote(price: i64) -> HashMap<String, Decimal> {
    HashMap::from([(DEFAULT_SYMBOL.to_string(), Decimal::from(price))])
}

#[tokio::test]
async fn test_open_at_3000_sets_exit_levels() {
    let sim = simulator(1000);
    let signal = common::make_signal(Decimal::new(8, 1), Utc::now());

    let position = sim.open_position(&signal, Decimal::from(3000), Utc::now()).await.unwrap();

    assert_eq!(position.notional, Decimal::from(20));
    assert_eq!(position.stop_loss, Decimal::from(2850));
    assert_eq!(position.take_profit, Decimal::from(3450));
    assert_eq!(position.signal_id, signal.id);
    assert_eq!(sim.balance().await, Decimal::from(980));

    let ledger = sim.pnl_ledger().await;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].status, PositionStatus::Open);
}

#[tokio::test]
async fn test_tick_below_stop_closes_with_loss() {
    let sim = simulator(1000);
    let position = sim
        .open_position(&common::make_signal(Decimal::new(8, 1), Utc::now()), Decimal::from(3000), Utc::now())
        .await
        .unwrap();

    // Between the levels: nothing happens
    assert!(sim.monitor_tick(&quote(3100), Utc::now()).await.is_empty());

    let closed = sim.monitor_tick(&quote(2800), Utc::now()).await;
    assert_eq!(closed.len(), 1);

    let record = &closed[0];
    let expected_pnl = (Decimal::from(2800) - Decimal::from(3000)) * position.quantity;
    assert_eq!(record.close_reason, Some(CloseReason::StopLoss));
    assert_eq!(record.exit_price, Some(Decimal::from(2800)));
    assert_eq!(record.pnl, Some(expected_pnl));
    assert!(expected_pnl < Decimal::ZERO);

    // Notional back plus the (negative) PnL, up to decimal rounding
    let drift = sim.balance().await - (Decimal::from(1000) + expected_pnl);
    assert!(drift.abs() < Decimal::new(1, 20));
    assert!(sim.active_positions().await.is_empty());
}

#[tokio::test]
async fn test_small_balance_is_rejected_without_side_effects() {
    let sim = simulator(50);

    let err = sim
        .open_position(&common::make_signal(Decimal::new(8, 1), Utc::now()), Decimal::from(3000), Utc::now())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        OpenRejection::Risk(RiskViolation::BelowMinimum {
            notional: Decimal::from(1),
            min: Decimal::from(10),
        })
    );
    assert_eq!(sim.balance().await, Decimal::from(50));
    assert!(sim.pnl_ledger().await.is_empty());
}

#[tokio::test]
async fn test_manual_close_is_final() {
    let sim = simulator(1000);
    let position = sim
        .open_position(&common::make_signal(Decimal::new(8, 1), Utc::now()), Decimal::from(2000), Utc::now())
        .await
        .unwrap();

    let record = sim
        .close_position(position.id, Decimal::from(2100), CloseReason::Manual, Utc::now())
        .await
        .unwrap();
    assert_eq!(record.pnl, Some(Decimal::from(1)));
    assert_eq!(record.close_reason, Some(CloseReason::Manual));

    // A later tick past take-profit cannot close it again
    assert!(sim.monitor_tick(&quote(5000), Utc::now()).await.is_empty());
    assert_eq!(
        sim.close_position(position.id, Decimal::from(2100), CloseReason::Manual, Utc::now()).await,
        Err(CloseError::NotActive(position.id))
    );
    assert_eq!(sim.balance().await, Decimal::from(1001));

    let summary = sim.summary().await;
    assert_eq!(summary.closed_positions, 1);
    assert_eq!(summary.wins, 1);
    assert_eq!(summary.realized_pnl, Decimal::from(1));
}

#[tokio::test]
async fn test_concurrent_ticks_close_once() {
    let sim = simulator(1000);
    sim.open_position(&common::make_signal(Decimal::new(8, 1), Utc::now()), Decimal::from(2000), Utc::now())
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let sim = sim.clone();
            tokio::spawn(async move { sim.monitor_tick(&quote(1800), Utc::now()).await.len() })
        })
        .collect();

    let mut total = 0;
    for handle in handles {
        total += handle.await.unwrap();
    }

    assert_eq!(total, 1);
    assert_eq!(sim.pnl_ledger().await.len(), 1);
    // 20 notional at 2000, closed at 1800: qty 0.01, pnl -2
    assert_eq!(sim.balance().await, Decimal::from(998));
}
