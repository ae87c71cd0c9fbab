pub mod aggregator;
pub mod notifier;
pub mod position_monitor;
pub mod snapshot;
