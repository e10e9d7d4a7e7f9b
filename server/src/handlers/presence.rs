//! Login / logout / heartbeat presence handlers.
//!
//! Heartbeats are best-effort: when the database cannot take the write
//! within `heartbeat_timeout_ms` the request is answered with 202 and the
//! client simply beats again later.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::{debug, info, warn};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::SharedState;

pub async fn login_handler(
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let created = state.db.ensure_profile(user.id).await?;
    state.db.set_online_status(user.id, true).await?;
    let profile = state.db.get_profile(user.id).await?.unwrap_or(created);
    info!("User {} logged in", user.id);

    Ok(Json(serde_json::json!({ "ok": true, "profile": profile })))
}

pub async fn logout_handler(
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.db.set_online_status(user.id, false).await?;
    info!("User {} logged out", user.id);
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn offline_handler(
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.db.set_online_status(user.id, false).await?;
    debug!("User {} went offline", user.id);
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn heartbeat_handler(
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let budget = Duration::from_millis(state.config.heartbeat_timeout_ms);

    match tokio::time::timeout(budget, state.db.set_online_status(user.id, true)).await {
        Ok(Ok(())) => Ok((StatusCode::OK, Json(serde_json::json!({ "ok": true })))),
        Ok(Err(e)) if e.is_timeout() => {
            warn!("Heartbeat for {} skipped: {}", user.id, e);
            Ok(skipped())
        }
        Ok(Err(e)) => Err(e.into()),
        Err(_) => {
            warn!("Heartbeat for {} skipped after {:?}", user.id, budget);
            Ok(skipped())
        }
    }
}

fn skipped() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "ok": true, "skipped": true })),
    )
}
