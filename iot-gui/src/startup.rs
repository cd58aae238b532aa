use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::path::Path;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    app::{deleted, health_check, index, version},
    auth::{login, login_page, logout, password_page, refresh_token, update_password},
    channels, groups,
    messages::{publish, read_messages, read_messages_as_thing},
    metrics::metrics,
    policies, things, users,
};
use crate::middleware::{
    metrics::metrics_middleware,
    referer::referer_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use crate::AppState;

pub fn build_router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page).post(login))
        .route("/refresh_token", get(refresh_token))
        .route("/logout", get(logout))
        .route("/password", get(password_page).post(update_password))
        // users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/bulk", post(users::create_users))
        .route("/users/enabled", post(users::enable_user))
        .route("/users/disabled", post(users::disable_user))
        .route("/users/:id", get(users::view_user).post(users::update_user))
        .route("/users/:id/tags", post(users::update_user_tags))
        .route("/users/:id/identity", post(users::update_user_identity))
        // things
        .route("/things", get(things::list_things).post(things::create_thing))
        .route("/things/bulk", post(things::create_things))
        .route("/things/enabled", post(things::enable_thing))
        .route("/things/disabled", post(things::disable_thing))
        .route("/things/:id", get(things::view_thing).post(things::update_thing))
        .route("/things/:id/tags", post(things::update_thing_tags))
        .route("/things/:id/secret", post(things::update_thing_secret))
        .route("/things/:id/owner", post(things::update_thing_owner))
        .route("/things/:id/channels", get(things::list_thing_channels))
        .route("/things/:id/connect", post(things::connect_channel))
        .route("/disconnectChannel", post(things::disconnect_channel))
        // channels
        .route(
            "/channels",
            get(channels::list_channels).post(channels::create_channel),
        )
        .route("/channels/bulk", post(channels::create_channels))
        .route("/channels/enabled", post(channels::enable_channel))
        .route("/channels/disabled", post(channels::disable_channel))
        .route(
            "/channels/:id",
            get(channels::view_channel).post(channels::update_channel),
        )
        .route("/channels/:id/things", get(channels::list_channel_things))
        .route("/channels/:id/connectThing", post(channels::connect_thing))
        // path id is the channel here too
        .route("/things/:id/connectThing", post(channels::connect_thing))
        .route("/channels/:id/shareThing", post(channels::share_thing))
        .route("/disconnectThing", post(channels::disconnect_thing))
        .route("/connect", post(channels::connect))
        .route("/disconnect", post(channels::disconnect))
        // thing policies
        .route(
            "/things_policies",
            get(policies::list_thing_policies).post(policies::add_thing_policy),
        )
        .route("/things_policies/update", post(policies::update_thing_policy))
        .route("/things_policies/delete", post(policies::delete_thing_policy))
        // groups
        .route("/groups", get(groups::list_groups).post(groups::create_group))
        .route("/groups/bulk", post(groups::create_groups))
        .route("/groups/enabled", post(groups::enable_group))
        .route("/groups/disabled", post(groups::disable_group))
        .route("/groups/:id", get(groups::view_group).post(groups::update_group))
        .route(
            "/groups/:id/members",
            get(groups::list_members).post(groups::assign),
        )
        .route("/groups/:id/unassign", post(groups::unassign))
        // user policies
        .route(
            "/policies",
            get(policies::list_user_policies).post(policies::add_user_policy),
        )
        .route("/policies/update", post(policies::update_user_policy))
        .route("/policies/delete", post(policies::delete_user_policy))
        // messages
        .route("/messages", post(publish))
        .route(
            "/readmessages",
            get(read_messages).post(read_messages_as_thing),
        )
        .route("/deleted", get(deleted))
        .route("/version", get(version))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .fallback_service(ServeDir::new(static_dir))
        .layer(from_fn_with_state(state.clone(), referer_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
