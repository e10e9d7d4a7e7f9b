//! Group invite handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::handlers::parse_path_id;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateGroupInvitePayload {
    to_user_id: Uuid,
}

pub async fn create_group_invite_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(group_id): Path<String>,
    ApiJson(req): ApiJson<CreateGroupInvitePayload>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let group_id = parse_path_id(&group_id, "group id")?;
    let invite = state
        .db
        .create_group_invite(group_id, user.id, req.to_user_id)
        .await?;
    info!("group-invite: {} invited {} to group {}", user.id, req.to_user_id, group_id);
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "invite": invite }))))
}

pub async fn list_group_invites_handler(
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let invites = state.db.list_group_invites(user.id).await?;
    Ok(Json(serde_json::json!({ "invites": invites })))
}

pub async fn reject_group_invite_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_path_id(&id, "invite id")?;
    state.db.reject_group_invite(id, user.id).await?;
    info!("group-invite: {} rejected invite {}", user.id, id);
    Ok(Json(serde_json::json!({ "ok": true })))
}
