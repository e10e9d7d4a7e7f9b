//! Avatar listing handler

use axum::extract::State;
use axum::Json;

use crate::avatars::list_avatar_urls;
use crate::error::ApiError;
use crate::state::SharedState;

pub async fn list_avatars_handler(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let root = state.config.avatars_dir.clone();
    let prefix = state.config.avatars_url_prefix.clone();

    let avatars = tokio::task::spawn_blocking(move || list_avatar_urls(&root, &prefix))
        .await
        .map_err(|e| ApiError::Internal(format!("avatar listing task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("failed to read avatar directory: {}", e)))?;

    Ok(Json(serde_json::json!({ "avatars": avatars })))
}
