use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::AppState;

/// Bearer-token authentication middleware.
///
/// If `API_TOKEN` is configured, every request must carry
/// `Authorization: Bearer <token>` matching that value.
/// Without a token authentication is disabled (dev mode).
pub async fn require_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.api_token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let authorized = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        == Some(expected);

    if !authorized {
        tracing::debug!(path = %req.uri().path(), "Rejected unauthenticated request");
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(req).await)
}
