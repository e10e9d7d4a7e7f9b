//! Profile and city search handlers.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use wayfarer_shared::search::{PROFILE_SEARCH_DEFAULT_LIMIT, PROFILE_SEARCH_MAX_LIMIT};
use wayfarer_shared::{clamp_limit, CityQuery, ProfileQuery, PublicProfile};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ProfileSearchParams {
    q: Option<String>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct CitySearchParams {
    q: Option<String>,
    country: Option<String>,
    limit: Option<i64>,
}

pub async fn search_cities_handler(
    State(state): State<SharedState>,
    ApiQuery(params): ApiQuery<CitySearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let query = CityQuery::parse(params.q.as_deref(), params.country.as_deref(), params.limit)?;
    let cities = state.db.search_cities(&query).await?;
    Ok(Json(serde_json::json!({ "cities": cities })))
}

/// Best single match for the add-friend box. Every query is recorded in
/// `add_friend_logs`; a failed log write never fails the search.
pub async fn search_profile_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    ApiQuery(params): ApiQuery<ProfileSearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let query = ProfileQuery::parse(params.q.as_deref().unwrap_or_default())?;

    if let Err(e) = state.db.log_add_friend_query(user.id, query.text()).await {
        warn!("Failed to record add-friend query for {}: {}", user.id, e);
    }

    let found = match query.exact_public_id() {
        Some(public_id) => state.db.get_profile_by_public_id(public_id).await?,
        None => state
            .db
            .search_profiles(&query, Some(user.id), 1)
            .await?
            .into_iter()
            .next(),
    };

    let profile = found
        .filter(|p| p.id != user.id)
        .map(PublicProfile::from);

    Ok(Json(serde_json::json!({ "profile": profile })))
}

pub async fn search_profile_list_handler(
    State(state): State<SharedState>,
    user: AuthUser,
    ApiQuery(params): ApiQuery<ProfileSearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let query = ProfileQuery::parse(params.q.as_deref().unwrap_or_default())?;
    let limit = clamp_limit(params.limit, PROFILE_SEARCH_DEFAULT_LIMIT, PROFILE_SEARCH_MAX_LIMIT);

    let results: Vec<PublicProfile> = state
        .db
        .search_profiles(&query, Some(user.id), limit)
        .await?
        .into_iter()
        .map(PublicProfile::from)
        .collect();

    Ok(Json(serde_json::json!({
        "count": results.len(),
        "results": results,
    })))
}
