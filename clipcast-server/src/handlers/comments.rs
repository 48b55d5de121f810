use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use clipcast_core::{
    api_types::{ApiResponse, ContentRequest, ListQuery, Listing, NewCommentRequest},
    catalog,
    content::Comment,
};

use super::{ApiResult, list, parse_id, query_id};
use crate::auth::CurrentAccount;
use crate::infra::{
    app_state::AppState,
    errors::{ApiJson, AppError, AppResult},
};

/// `GET /comments?videoId=`: newest first unless `sortBy=likesCount`.
pub async fn list_comments(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Query(query): Query<ListQuery>,
) -> ApiResult<Listing> {
    let video = query_id(query.video_id.as_deref(), "videoId")?
        .ok_or_else(|| AppError::bad_request("videoId is required"))?;
    state.content.ensure_video_visible(caller.id(), video).await?;
    let spec = catalog::video_comments(video);
    list(&state, &spec, &query, caller.id(), "comments", "Comments fetched").await
}

pub async fn add_comment(
    State(state): State<AppState>,
    caller: CurrentAccount,
    ApiJson(request): ApiJson<NewCommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Comment>>)> {
    let comment = state
        .content
        .add_comment(caller.id(), request.video_id, &request.content)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(comment, "Comment added")),
    ))
}

pub async fn update_comment(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ContentRequest>,
) -> ApiResult<Comment> {
    let id = parse_id(&id, "commentId")?;
    let comment = state
        .content
        .update_comment(caller.id(), id, &request.content)
        .await?;
    Ok(Json(ApiResponse::ok(comment, "Comment updated")))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id, "commentId")?;
    state.content.delete_comment(caller.id(), id).await?;
    Ok(Json(ApiResponse::empty(200, "Comment deleted")))
}
