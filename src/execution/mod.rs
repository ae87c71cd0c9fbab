pub mod copy_engine;
pub mod price;
pub mod risk;
pub mod simulator;
pub mod venue;

pub use price::{FixedPriceSource, PriceBoard, PriceSource};
pub use risk::RiskPolicy;
pub use simulator::{TradeSimulator, DEFAULT_SYMBOL};
pub use venue::{ExecutionVenue, SimulatedVenue};
