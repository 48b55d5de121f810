use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};

use crate::auth::require_auth;
use crate::handlers::{
    comments, dashboard, likes, playlists, session, subscriptions, tweets, users, videos,
};
use crate::infra::app_state::AppState;

/// Create all v1 API routes
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        // Public endpoints
        .route("/session/login", post(session::login))
        .route("/session/refresh", post(session::refresh))
        .route("/users", post(users::register))
        .merge(create_protected_routes(state))
}

/// Routes behind the access gate
fn create_protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/session/logout", post(session::logout))
        // Accounts
        .route(
            "/users/me",
            get(users::me).patch(users::update_profile),
        )
        .route("/users/me/password", patch(users::change_password))
        .route("/users/me/avatar", patch(users::update_avatar))
        .route("/users/me/cover", patch(users::update_cover))
        .route("/users/me/history", get(users::watch_history))
        .route("/users/channel/{handle}", get(users::channel_profile))
        // Videos
        .route(
            "/videos",
            get(videos::list_videos).post(videos::create_video),
        )
        .route(
            "/videos/{id}",
            get(videos::get_video)
                .patch(videos::update_video)
                .delete(videos::delete_video),
        )
        .route("/videos/{id}/publish", patch(videos::toggle_publish))
        // Comments
        .route(
            "/comments",
            get(comments::list_comments).post(comments::add_comment),
        )
        .route(
            "/comments/{id}",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        // Tweets
        .route(
            "/tweets",
            get(tweets::list_tweets).post(tweets::create_tweet),
        )
        .route(
            "/tweets/{id}",
            patch(tweets::update_tweet).delete(tweets::delete_tweet),
        )
        // Likes
        .route("/like/video", post(likes::toggle_video_like))
        .route("/like/comment", post(likes::toggle_comment_like))
        .route("/like/tweet", post(likes::toggle_tweet_like))
        .route("/like/videos", get(likes::liked_videos))
        // Subscriptions
        .route(
            "/subscriptions/subscribers",
            get(subscriptions::channel_subscribers),
        )
        .route(
            "/subscriptions/channels",
            get(subscriptions::subscribed_channels),
        )
        .route(
            "/subscriptions/{channel_id}",
            post(subscriptions::toggle_subscription),
        )
        // Playlists
        .route(
            "/playlists",
            get(playlists::list_playlists).post(playlists::create_playlist),
        )
        .route(
            "/playlists/{id}",
            get(playlists::get_playlist)
                .patch(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route(
            "/playlists/{id}/videos/{video_id}",
            put(playlists::add_video).delete(playlists::remove_video),
        )
        // Dashboard
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/videos", get(dashboard::videos))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
