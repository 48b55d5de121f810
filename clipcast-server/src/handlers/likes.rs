use axum::{
    Json,
    extract::{Query, State},
};
use clipcast_core::{
    api_types::{ApiResponse, LikeRequest, ListQuery, Listing},
    catalog,
    content::{LikeTarget, LikeToggle},
};

use super::{ApiResult, list};
use crate::auth::CurrentAccount;
use crate::infra::{
    app_state::AppState,
    errors::{ApiJson, AppError},
};

pub async fn toggle_video_like(
    state: State<AppState>,
    caller: CurrentAccount,
    ApiJson(request): ApiJson<LikeRequest>,
) -> ApiResult<LikeToggle> {
    toggle(state, caller, request.video(), "videoId").await
}

pub async fn toggle_comment_like(
    state: State<AppState>,
    caller: CurrentAccount,
    ApiJson(request): ApiJson<LikeRequest>,
) -> ApiResult<LikeToggle> {
    toggle(state, caller, request.comment(), "commentId").await
}

pub async fn toggle_tweet_like(
    state: State<AppState>,
    caller: CurrentAccount,
    ApiJson(request): ApiJson<LikeRequest>,
) -> ApiResult<LikeToggle> {
    toggle(state, caller, request.tweet(), "tweetId").await
}

async fn toggle(
    State(state): State<AppState>,
    caller: CurrentAccount,
    target: Option<LikeTarget>,
    field: &str,
) -> ApiResult<LikeToggle> {
    let target = target.ok_or_else(|| AppError::bad_request(format!("{field} is required")))?;
    let toggle = state.content.toggle_like(caller.id(), target).await?;
    let message = if toggle.liked { "Liked" } else { "Like removed" };
    Ok(Json(ApiResponse::ok(toggle, message)))
}

/// `GET /like/videos`: videos the caller liked, most recent like first.
pub async fn liked_videos(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Query(query): Query<ListQuery>,
) -> ApiResult<Listing> {
    let spec = catalog::liked_videos(caller.id());
    list(&state, &spec, &query, caller.id(), "videos", "Liked videos fetched").await
}
