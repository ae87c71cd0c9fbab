use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;

/// Reference ETH price used when nothing else is configured.
pub const DEFAULT_NATIVE_PRICE_USD: i64 = 3000;

/// Current price for a trading symbol, or `None` when unavailable.
pub trait PriceSource: Send + Sync {
    fn price(&self, symbol: &str) -> impl Future<Output = Option<Decimal>> + Send;
}

/// Same price for every symbol.
#[derive(Debug, Clone)]
pub struct FixedPriceSource {
    price: Decimal,
}

impl FixedPriceSource {
    pub fn new(price: Decimal) -> Self {
        Self { price }
    }
}

impl Default for FixedPriceSource {
    fn default() -> Self {
        Self::new(Decimal::from(DEFAULT_NATIVE_PRICE_USD))
    }
}

impl PriceSource for FixedPriceSource {
    async fn price(&self, _symbol: &str) -> Option<Decimal> {
        Some(self.price)
    }
}

/// Shared symbol → price map, updated externally (control API). Symbols
/// without an explicit quote fall back to the default price when one is set.
#[derive(Clone)]
pub struct PriceBoard {
    quotes: Arc<RwLock<HashMap<String, Decimal>>>,
    fallback: Option<Decimal>,
}

impl PriceBoard {
    pub fn new(fallback: Option<Decimal>) -> Self {
        Self {
            quotes: Arc::new(RwLock::new(HashMap::new())),
            fallback,
        }
    }

    /// Set the quote for a symbol. Non-positive prices are refused.
    pub async fn set(&self, symbol: &str, price: Decimal) -> bool {
        if price <= Decimal::ZERO {
            return false;
        }
        self.quotes.write().await.insert(symbol.to_uppercase(), price);
        tracing::info!(symbol, price = %price, "Price updated");
        true
    }

    pub async fn clear(&self, symbol: &str) {
        self.quotes.write().await.remove(&symbol.to_uppercase());
    }

    pub async fn quotes(&self) -> HashMap<String, Decimal> {
        self.quotes.read().await.clone()
    }

    /// Prices for a set of symbols; unavailable symbols are left out.
    pub async fn prices_for(&self, symbols: &[String]) -> HashMap<String, Decimal> {
        let mut prices = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            if let Some(p) = self.price(symbol).await {
                prices.insert(symbol.clone(), p);
            }
        }
        prices
    }
}

impl PriceSource for PriceBoard {
    async fn price(&self, symbol: &str) -> Option<Decimal> {
        self.quotes
            .read()
            .await
            .get(&symbol.to_uppercase())
            .copied()
            .or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_price_source() {
        let source = FixedPriceSource::default();
        assert_eq!(source.price("ETHUSDT").await, Some(Decimal::from(3000)));
        assert_eq!(source.price("ANY").await, Some(Decimal::from(3000)));
    }

    #[tokio::test]
    async fn test_price_board_overrides_fallback() {
        let board = PriceBoard::new(Some(Decimal::from(3000)));
        assert_eq!(board.price("ethusdt").await, Some(Decimal::from(3000)));

        assert!(board.set("ethusdt", Decimal::from(2800)).await);
        assert_eq!(board.price("ETHUSDT").await, Some(Decimal::from(2800)));

        board.clear("ETHUSDT").await;
        assert_eq!(board.price("ETHUSDT").await, Some(Decimal::from(3000)));
    }

    #[tokio::test]
    async fn test_price_board_without_fallback() {
        let board = PriceBoard::new(None);
        assert_eq!(board.price("ETHUSDT").await, None);
        assert!(!board.set("ETHUSDT", Decimal::ZERO).await);

        let prices = board.prices_for(&["ETHUSDT".to_string()]).await;
        assert!(prices.is_empty());
    }
}
