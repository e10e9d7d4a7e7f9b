//! Liveness and readiness

use axum::extract::State;
use axum::http::StatusCode;

use crate::state::SharedState;

/// Liveness probe, no sensitive data
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness: the database answers.
pub async fn ready_check(State(state): State<SharedState>) -> (StatusCode, &'static str) {
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "READY"),
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "DATABASE UNAVAILABLE")
        }
    }
}
