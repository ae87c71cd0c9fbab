use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public: liveness and scrape
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Bearer token required when API_TOKEN is set
    let protected = Router::new()
        .route("/api/dashboard/summary", get(handlers::dashboard::summary))
        // Analytics
        .route("/api/wallets", get(handlers::wallets::list))
        .route("/api/wallets/:address", get(handlers::wallets::detail))
        .route("/api/signals", get(handlers::signals::list))
        // Simulated account
        .route("/api/positions", get(handlers::positions::list))
        .route("/api/positions/:id/close", post(handlers::positions::close))
        .route("/api/trades", get(handlers::trades::list))
        // Control
        .route("/api/control/stop", post(handlers::control::stop))
        .route("/api/control/resume", post(handlers::control::resume))
        .route("/api/control/status", get(handlers::control::status))
        .route("/api/prices", get(handlers::prices::list))
        .route(
            "/api/prices/:symbol",
            put(handlers::prices::set).delete(handlers::prices::clear),
        )
        // WebSocket
        .route("/ws", get(handlers::ws::handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
