pub mod classifier;
pub mod ledger;
pub mod scorer;
pub mod signal_generator;

pub use classifier::{classify_activity, classify_signal_type, detect_alerts, ActivityFlags, AlertThresholds, ClassificationMode, TxAlert};
pub use ledger::WalletLedger;
pub use signal_generator::{SignalGenerator, SignalPolicy};
