use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use clipcast_core::{
    api_types::{ApiResponse, ListQuery, Listing},
    catalog,
    content::{NewPlaylist, Playlist, PlaylistUpdate},
    store::Document,
};

use super::{ApiResult, list, parse_id, query_id};
use crate::auth::CurrentAccount;
use crate::infra::{
    app_state::AppState,
    errors::{ApiJson, AppError, AppResult},
};

pub async fn create_playlist(
    State(state): State<AppState>,
    caller: CurrentAccount,
    ApiJson(new): ApiJson<NewPlaylist>,
) -> AppResult<(StatusCode, Json<ApiResponse<Playlist>>)> {
    let playlist = state.content.create_playlist(caller.id(), new).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(playlist, "Playlist created")),
    ))
}

/// `GET /playlists?userId=`: defaults to the caller's playlists.
pub async fn list_playlists(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Query(query): Query<ListQuery>,
) -> ApiResult<Listing> {
    let owner = query_id(query.user_id.as_deref(), "userId")?.unwrap_or(caller.id());
    let spec = catalog::playlists_by_owner(owner);
    list(&state, &spec, &query, caller.id(), "playlists", "Playlists fetched").await
}

/// `GET /playlists/{id}`: the playlist with its resolved videos and owner.
pub async fn get_playlist(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<String>,
) -> ApiResult<Document> {
    let id = parse_id(&id, "playlistId")?;
    let playlist = state
        .composer
        .compose_one(&catalog::playlist_detail(id, caller.id()), Some(caller.id()))
        .await?
        .ok_or_else(|| AppError::not_found("playlist not found"))?;
    Ok(Json(ApiResponse::ok(playlist, "Playlist fetched")))
}

pub async fn update_playlist(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<PlaylistUpdate>,
) -> ApiResult<Playlist> {
    let id = parse_id(&id, "playlistId")?;
    let playlist = state
        .content
        .update_playlist(caller.id(), id, update)
        .await?;
    Ok(Json(ApiResponse::ok(playlist, "Playlist updated")))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id, "playlistId")?;
    state.content.delete_playlist(caller.id(), id).await?;
    Ok(Json(ApiResponse::empty(200, "Playlist deleted")))
}

pub async fn add_video(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path((playlist, video)): Path<(String, String)>,
) -> ApiResult<Playlist> {
    let playlist = parse_id(&playlist, "playlistId")?;
    let video = parse_id(&video, "videoId")?;
    let playlist = state
        .content
        .add_to_playlist(caller.id(), playlist, video)
        .await?;
    Ok(Json(ApiResponse::ok(playlist, "Video added to playlist")))
}

pub async fn remove_video(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path((playlist, video)): Path<(String, String)>,
) -> ApiResult<Playlist> {
    let playlist = parse_id(&playlist, "playlistId")?;
    let video = parse_id(&video, "videoId")?;
    let playlist = state
        .content
        .remove_from_playlist(caller.id(), playlist, video)
        .await?;
    Ok(Json(ApiResponse::ok(playlist, "Video removed from playlist")))
}
