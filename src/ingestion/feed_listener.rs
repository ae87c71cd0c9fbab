use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval, sleep};
use tokio_tungstenite::{connect_async, tungstenite::Message};

const PING_INTERVAL: Duration = Duration::from_secs(25);
const BASE_RECONNECT_DELAY: Duration = Duration::from_secs(2);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

/// One unit of work handed from the feed to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    /// Only the hash is known; details must be fetched.
    Hash(String),
    /// Full transaction object, ready for normalization.
    Payload(serde_json::Value),
}

/// Classified text frame from the node.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    SubscriptionAck(String),
    Item(FeedItem),
    Ignored,
}

/// Parse a JSON-RPC frame:
/// - `{"id":1,"result":"0x..."}`: subscription confirmation
/// - `{"method":"eth_subscription","params":{"result":"0xhash"}}`: bare hash
/// - `{"method":"eth_subscription","params":{"result":{...}}}`: full transaction
pub fn parse_feed_message(text: &str) -> FeedMessage {
    let msg: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return FeedMessage::Ignored,
    };

    if msg.get("id").is_some() {
        if let Some(result) = msg.get("result") {
            return FeedMessage::SubscriptionAck(
                result.as_str().map(str::to_string).unwrap_or_else(|| result.to_string()),
            );
        }
        return FeedMessage::Ignored;
    }

    let Some(result) = msg.get("params").and_then(|p| p.get("result")) else {
        return FeedMessage::Ignored;
    };

    match result {
        serde_json::Value::String(hash) if !hash.is_empty() => {
            FeedMessage::Item(FeedItem::Hash(hash.to_lowercase()))
        }
        serde_json::Value::Object(_) => FeedMessage::Item(FeedItem::Payload(result.clone())),
        _ => FeedMessage::Ignored,
    }
}

fn subscribe_request(full_transactions: bool) -> serde_json::Value {
    let params = if full_transactions {
        serde_json::json!(["newPendingTransactions", true])
    } else {
        serde_json::json!(["newPendingTransactions"])
    };
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "eth_subscribe",
        "params": params,
    })
}

/// Reconnect delay for the given attempt: 2s doubling up to 60s.
pub fn backoff_delay(attempt: u32) -> Duration {
    BASE_RECONNECT_DELAY
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(MAX_RECONNECT_DELAY)
}

/// Subscribe to pending transactions and forward them into the pipeline.
/// Runs until the receiving side of `feed_tx` is dropped. `send().await`
/// blocks while the pipeline is saturated.
pub async fn run_feed_listener(ws_url: String, full_transactions: bool, feed_tx: mpsc::Sender<FeedItem>) {
    let mut attempt: u32 = 0;

    loop {
        tracing::info!(url = %ws_url, "Feed listener connecting...");

        match connect_async(&ws_url).await {
            Ok((ws_stream, _response)) => {
                tracing::info!("Feed listener connected");
                attempt = 0;

                let (mut write, mut read) = ws_stream.split();

                let subscribe = subscribe_request(full_transactions).to_string();
                if let Err(e) = write.send(Message::Text(subscribe.into())).await {
                    tracing::error!(error = %e, "Failed to send eth_subscribe");
                } else {
                    tracing::info!(full_transactions, "Subscribed to newPendingTransactions");

                    let mut ping_timer = interval(PING_INTERVAL);
                    ping_timer.tick().await;

                    loop {
                        tokio::select! {
                            msg = read.next() => {
                                match msg {
                                    Some(Ok(Message::Text(text))) => {
                                        match parse_feed_message(text.as_ref()) {
                                            FeedMessage::SubscriptionAck(id) => {
                                                tracing::info!(subscription = %id, "Feed subscription confirmed");
                                            }
                                            FeedMessage::Item(item) => {
                                                if feed_tx.send(item).await.is_err() {
                                                    tracing::warn!("Feed channel closed, stopping listener");
                                                    return;
                                                }
                                            }
                                            FeedMessage::Ignored => {
                                                tracing::trace!("Ignoring unrecognised feed frame");
                                            }
                                        }
                                    }
                                    Some(Ok(Message::Ping(data))) => {
                                        if let Err(e) = write.send(Message::Pong(data)).await {
                                            tracing::warn!(error = %e, "Failed to send pong");
                                            break;
                                        }
                                    }
                                    Some(Ok(Message::Close(_))) => {
                                        tracing::warn!("Feed server sent close frame");
                                        break;
                                    }
                                    Some(Ok(_)) => {}
                                    Some(Err(e)) => {
                                        tracing::error!(error = %e, "Feed read error");
                                        break;
                                    }
                                    None => {
                                        tracing::warn!("Feed stream ended");
                                        break;
                                    }
                                }
                            }
                            _ = ping_timer.tick() => {
                                if let Err(e) = write.send(Message::Ping(vec![].into())).await {
                                    tracing::warn!(error = %e, "Failed to send ping");
                                    break;
                                }
                            }
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Feed connection failed");
            }
        }

        let delay = backoff_delay(attempt);
        attempt = attempt.saturating_add(1);
        tracing::info!(delay_secs = delay.as_secs(), attempt, "Feed listener reconnecting...");
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subscription_ack() {
        let msg = r#"{"jsonrpc":"2.0","id":1,"result":"0x9cef478923ff08bf67fde6c64013158d"}"#;
        assert_eq!(
            parse_feed_message(msg),
            FeedMessage::SubscriptionAck("0x9cef478923ff08bf67fde6c64013158d".into())
        );
    }

    #[test]
    fn test_parse_hash_notification() {
        let msg = r#"{"jsonrpc":"2.0","method":"eth_subscription","params":{"subscription":"0x9c","result":"0xABCDEF"}}"#;
        assert_eq!(
            parse_feed_message(msg),
            FeedMessage::Item(FeedItem::Hash("0xabcdef".into()))
        );
    }

    #[test]
    fn test_parse_full_transaction_notification() {
        let msg = r#"{"jsonrpc":"2.0","method":"eth_subscription","params":{"subscription":"0x9c","result":{"hash":"0x1","from":"0xa","value":"0x0"}}}"#;
        match parse_feed_message(msg) {
            FeedMessage::Item(FeedItem::Payload(v)) => assert_eq!(v["hash"], "0x1"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_garbage_is_ignored() {
        assert_eq!(parse_feed_message("not json"), FeedMessage::Ignored);
        assert_eq!(parse_feed_message(r#"{"params":{}}"#), FeedMessage::Ignored);
        assert_eq!(parse_feed_message(r#"{"params":{"result":42}}"#), FeedMessage::Ignored);
    }

    #[test]
    fn test_backoff_delay_caps() {
        assert_eq!(backoff_delay(0), Duration::from_secs(2));
        assert_eq!(backoff_delay(1), Duration::from_secs(4));
        assert_eq!(backoff_delay(4), Duration::from_secs(32));
        assert_eq!(backoff_delay(5), Duration::from_secs(60));
        assert_eq!(backoff_delay(40), Duration::from_secs(60));
    }
}
