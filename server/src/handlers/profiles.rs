//! Own-profile and public profile handlers.

use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

use wayfarer_shared::{ProfileSlug, ProfileUpdate, PublicProfile, ValidationError};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::SharedState;

pub async fn get_own_profile_handler(
    State(state): State<SharedState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let profile = state.db.ensure_profile(user.id).await?;
    Ok(Json(serde_json::json!({ "profile": profile })))
}

pub async fn update_own_profile_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if update.is_empty() {
        return Err(ValidationError::Missing("profile fields").into());
    }
    let update = update.validated()?;

    state.db.ensure_profile(user.id).await?;
    let profile = state.db.update_profile(user.id, &update).await?;
    info!("Profile {} updated", user.id);

    Ok(Json(serde_json::json!({ "profile": profile })))
}

/// `/api/u/:slug`. Username slugs were retired in favour of public ids and
/// answer 410.
pub async fn public_profile_handler(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let public_id = match ProfileSlug::parse(&slug)? {
        ProfileSlug::Legacy => {
            return Err(ApiError::Gone(
                "Username links are no longer supported; use the public id".to_string(),
            ))
        }
        ProfileSlug::PublicId(id) => id,
    };

    let profile = state
        .db
        .get_profile_by_public_id(&public_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(serde_json::json!({ "profile": PublicProfile::from(profile) })))
}
