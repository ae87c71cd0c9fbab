use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;

use crate::AppState;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4";

/// GET /metrics: Prometheus scrape payload. Gauges derived from the
/// simulator are refreshed first so a scrape never reads stale values.
pub async fn render(State(state): State<AppState>) -> impl IntoResponse {
    crate::metrics::record_account(&state.simulator).await;
    ([(CONTENT_TYPE, PROMETHEUS_TEXT)], state.metrics_handle.render())
}
