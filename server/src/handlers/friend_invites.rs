//! Friend invite handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use wayfarer_shared::{InviteAction, InviteDirection, InviteStatus, PublicProfile, ValidationError};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::handlers::parse_path_id;
use crate::state::SharedState;

/// Either the recipient's internal id or the public id shown in search.
#[derive(Deserialize)]
pub struct CreateFriendInvitePayload {
    recipient_id: Option<Uuid>,
    public_id: Option<String>,
}

#[derive(Deserialize)]
pub struct ListFriendInvitesQuery {
    direction: Option<String>,
    status: Option<String>,
}

pub async fn create_friend_invite_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateFriendInvitePayload>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let recipient = match (req.recipient_id, req.public_id.as_deref().map(str::trim)) {
        (Some(id), _) => id,
        (None, Some(public_id)) if !public_id.is_empty() => state
            .db
            .get_profile_by_public_id(public_id)
            .await?
            .map(|p| p.id)
            .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?,
        _ => return Err(ValidationError::Missing("recipient_id").into()),
    };

    let invite = state.db.create_friend_invite(user.id, recipient).await?;
    info!("friend-invite: {} invited {} (id={})", user.id, recipient, invite.id);

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "invite": invite }))))
}

pub async fn list_friend_invites_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ListFriendInvitesQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let direction: InviteDirection = query.direction.as_deref().unwrap_or("all").parse()?;
    let status: Option<InviteStatus> = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .transpose()?;

    let invites = state.db.list_friend_invites(user.id, direction, status).await?;
    Ok(Json(serde_json::json!({ "invites": invites })))
}

async fn respond(
    state: &SharedState, user: AuthUser, raw_id: &str, action: InviteAction,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_path_id(raw_id, "invite id")?;
    let invite = state.db.respond_friend_invite(id, user.id, action).await?;
    info!("friend-invite: {} {} invite {}", user.id, action.as_str(), id);

    Ok(Json(serde_json::json!({
        "status": invite.status,
        "invite": invite,
    })))
}

pub async fn accept_friend_invite_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    respond(&state, user, &id, InviteAction::Accept).await
}

pub async fn cancel_friend_invite_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    respond(&state, user, &id, InviteAction::Cancel).await
}

pub async fn reject_friend_invite_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    respond(&state, user, &id, InviteAction::Reject).await
}

pub async fn list_friends_handler(
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let friends: Vec<PublicProfile> = state
        .db
        .list_friends(user.id)
        .await?
        .into_iter()
        .map(PublicProfile::from)
        .collect();
    Ok(Json(serde_json::json!({ "friends": friends })))
}
