//! HTTP routing configuration

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers::{avatars, friend_invites, group_invites, health, presence, profiles, search};
use crate::state::SharedState;

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);
    let avatar_files = ServeDir::new(&state.config.avatars_dir);
    let avatar_prefix = state.config.avatars_url_prefix.clone();

    let api = Router::new()
        .route("/avatars", get(avatars::list_avatars_handler))
        .route(
            "/friend-invites",
            get(friend_invites::list_friend_invites_handler)
                .post(friend_invites::create_friend_invite_handler),
        )
        .route("/friend-invites/:id/accept", post(friend_invites::accept_friend_invite_handler))
        .route("/friend-invites/:id/cancel", post(friend_invites::cancel_friend_invite_handler))
        .route("/friend-invites/:id/reject", post(friend_invites::reject_friend_invite_handler))
        .route("/friends", get(friend_invites::list_friends_handler))
        .route("/groups/invites", get(group_invites::list_group_invites_handler))
        .route("/groups/invites/:id/reject", post(group_invites::reject_group_invite_handler))
        .route("/groups/:group_id/invites", post(group_invites::create_group_invite_handler))
        .route("/locations/cities", get(search::search_cities_handler))
        .route("/profiles/search", get(search::search_profile_handler))
        .route("/profiles/search-list", get(search::search_profile_list_handler))
        .route(
            "/profile",
            get(profiles::get_own_profile_handler).patch(profiles::update_own_profile_handler),
        )
        .route("/u/:slug", get(profiles::public_profile_handler))
        .route("/user/login", post(presence::login_handler))
        .route("/user/logout", post(presence::logout_handler))
        .route("/user/heartbeat", post(presence::heartbeat_handler))
        .route("/user/offline", post(presence::offline_handler));

    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .nest("/api", api);

    let router = if avatar_prefix == "/" {
        router.fallback_service(avatar_files)
    } else {
        router.nest_service(&avatar_prefix, avatar_files)
    };

    router
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Build CORS layer from config. Permissive when no origins are configured.
fn build_cors_layer(origins: &Option<String>) -> CorsLayer {
    match origins {
        Some(list) if !list.is_empty() => {
            let parsed: Vec<_> = list
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parsed))
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any)
        }
        _ => CorsLayer::permissive(),
    }
}

