use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use whalecopy::rpc::DetailClient;

/// JSON-RPC node stand-in. The requested hash selects the reply.
async fn node(Json(req): Json<Value>) -> Response {
    let id = req["id"].clone();
    let hash = req["params"][0].as_str().unwrap_or_default().to_string();

    match hash.as_str() {
        "0xnull" => Json(json!({ "jsonrpc": "2.0", "id": id, "result": null })).into_response(),
        "0xerror" => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32000, "message": "header not found" }
        }))
        .into_response(),
        "0xdown" => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        "0xgarbage" => "not json".into_response(),
        "0xnosender" => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": { "hash": "0xnosender", "value": "0x0" }
        }))
        .into_response(),
        "0xslow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "jsonrpc": "2.0", "id": id, "result": null })).into_response()
        }
        _ => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "hash": hash,
                "from": "0xAbC",
                "to": "0xdef",
                "value": "0xde0b6b3a7640000",
                "gas": "0x5208",
                "gasPrice": "0x4a817c800",
                "input": "0x"
            }
        }))
        .into_response(),
    }
}

async fn spawn_node() -> String {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, Router::new().route("/", post(node))).await.unwrap();
    });
    format!("http://{addr}/")
}

async fn client(timeout: Duration) -> DetailClient {
    DetailClient::with_timeout(spawn_node().await, Decimal::from(3000), timeout).unwrap()
}

#[tokio::test]
async fn test_fetch_known_transaction() {
    let client = client(Duration::from_secs(5)).await;

    let tx = client.fetch("0xfound", Utc::now()).await.expect("transaction available");

    assert_eq!(tx.hash, "0xfound");
    assert_eq!(tx.from, "0xabc");
    assert_eq!(tx.value, Decimal::ONE);
    assert_eq!(tx.usd_value, Decimal::from(3000));
}

#[tokio::test]
async fn test_unknown_hash_is_unavailable() {
    let client = client(Duration::from_secs(5)).await;

    assert!(client.get_transaction("0xnull").await.unwrap().is_none());
    assert!(client.fetch("0xnull", Utc::now()).await.is_none());
}

#[tokio::test]
async fn test_failures_are_unavailable() {
    let client = client(Duration::from_secs(5)).await;

    for hash in ["0xerror", "0xdown", "0xgarbage", "0xnosender"] {
        assert!(client.fetch(hash, Utc::now()).await.is_none(), "{hash} should be skipped");
    }
    assert!(client.get_transaction("0xerror").await.is_err());
}

#[tokio::test]
async fn test_slow_node_times_out() {
    let client = client(Duration::from_millis(200)).await;

    let started = std::time::Instant::now();
    assert!(client.fetch("0xslow", Utc::now()).await.is_none());
    assert!(started.elapsed() < Duration::from_secs(4));
}
