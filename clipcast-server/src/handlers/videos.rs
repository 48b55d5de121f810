use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use clipcast_core::{
    api_types::{ApiResponse, ListQuery, Listing},
    catalog,
    content::{NewVideo, Video, VideoUpdate},
    store::Document,
};
use tracing::warn;

use super::{ApiResult, list, parse_id, query_id};
use crate::auth::CurrentAccount;
use crate::infra::{
    app_state::AppState,
    errors::{ApiJson, AppError, AppResult},
};

/// `GET /videos`: published videos, or one channel's videos with `userId`.
/// A channel owner listing their own channel also sees unpublished videos.
pub async fn list_videos(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Query(query): Query<ListQuery>,
) -> ApiResult<Listing> {
    let spec = match query_id(query.user_id.as_deref(), "userId")? {
        Some(owner) => catalog::videos_by_owner(owner, owner == caller.id()),
        None => catalog::published_videos(),
    };
    list(&state, &spec, &query, caller.id(), "videos", "Videos fetched").await
}

pub async fn create_video(
    State(state): State<AppState>,
    caller: CurrentAccount,
    ApiJson(new): ApiJson<NewVideo>,
) -> AppResult<(StatusCode, Json<ApiResponse<Video>>)> {
    let video = state.content.create_video(caller.id(), new).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(video, "Video published")),
    ))
}

/// `GET /videos/{id}`: the video with its owner and like counters.
///
/// Counts a view and records the video in the caller's watch history.
pub async fn get_video(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let id = parse_id(&id, "videoId")?;
    let video = state
        .composer
        .compose_one(&catalog::video_detail(id, Some(caller.id())), Some(caller.id()))
        .await?
        .ok_or_else(|| AppError::not_found("video not found"))?;

    state.content.record_view(id).await?;
    if let Err(err) = state.identity.push_watch_history(caller.id(), id).await {
        warn!(error = %err, video_id = %id, "failed to record watch history");
    }
    Ok(Json(ApiResponse::ok(video, "Video fetched")))
}

pub async fn update_video(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<VideoUpdate>,
) -> ApiResult<Video> {
    let id = parse_id(&id, "videoId")?;
    let video = state.content.update_video(caller.id(), id, update).await?;
    Ok(Json(ApiResponse::ok(video, "Video updated")))
}

/// `DELETE /videos/{id}`: also removes the video's comments and likes.
pub async fn delete_video(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id, "videoId")?;
    state.content.delete_video(caller.id(), id).await?;
    Ok(Json(ApiResponse::empty(200, "Video deleted")))
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<String>,
) -> ApiResult<Video> {
    let id = parse_id(&id, "videoId")?;
    let video = state.content.toggle_publish(caller.id(), id).await?;
    let message = if video.is_published {
        "Video published"
    } else {
        "Video unpublished"
    };
    Ok(Json(ApiResponse::ok(video, message)))
}
