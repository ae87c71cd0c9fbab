use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::ingestion::normalizer;
use crate::models::Transaction;

use super::types::{RpcRequest, RpcResponse, RpcTransaction};

#[derive(Debug, Error)]
pub enum DetailClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
}

/// Fetches full transaction objects by hash over JSON-RPC.
#[derive(Debug, Clone)]
pub struct DetailClient {
    http: Client,
    rpc_url: String,
    native_price_usd: Decimal,
    next_id: Arc<AtomicU64>,
}

impl DetailClient {
    pub fn new(http: Client, rpc_url: String, native_price_usd: Decimal) -> Self {
        Self {
            http,
            rpc_url,
            native_price_usd,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Build a client whose requests give up after `timeout`. A timed-out
    /// lookup surfaces as an HTTP error, so `fetch` reports it unavailable.
    pub fn with_timeout(
        rpc_url: String,
        native_price_usd: Decimal,
        timeout: Duration,
    ) -> Result<Self, DetailClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(http, rpc_url, native_price_usd))
    }

    /// `eth_getTransactionByHash`. `Ok(None)` means the node does not know the
    /// hash (dropped or not yet propagated).
    pub async fn get_transaction(&self, hash: &str) -> Result<Option<RpcTransaction>, DetailClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, "eth_getTransactionByHash", serde_json::json!([hash]));

        let resp: RpcResponse<RpcTransaction> = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = resp.error {
            return Err(DetailClientError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        Ok(resp.result)
    }

    /// Fetch and normalize a transaction. Every failure is reported as
    /// unavailable so the caller can skip the hash.
    pub async fn fetch(&self, hash: &str, observed_at: DateTime<Utc>) -> Option<Transaction> {
        match self.get_transaction(hash).await {
            Ok(Some(raw)) => match normalizer::normalize(&raw, self.native_price_usd, observed_at) {
                Ok(tx) => Some(tx),
                Err(e) => {
                    tracing::debug!(tx_hash = hash, error = %e, "Transaction detail could not be normalized");
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(tx_hash = hash, "Transaction detail unavailable");
                None
            }
            Err(DetailClientError::Http(e)) if e.is_timeout() => {
                tracing::warn!(tx_hash = hash, "Transaction detail fetch timed out");
                None
            }
            Err(e) => {
                tracing::warn!(tx_hash = hash, error = %e, "Transaction detail fetch failed");
                None
            }
        }
    }
}
