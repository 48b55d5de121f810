use axum::{
    Json,
    extract::{Query, State},
};
use clipcast_core::{
    api_types::{ApiResponse, ListQuery, Listing},
    catalog,
    content::ChannelStats,
};

use super::{ApiResult, list};
use crate::auth::CurrentAccount;
use crate::infra::app_state::AppState;

pub async fn stats(State(state): State<AppState>, caller: CurrentAccount) -> ApiResult<ChannelStats> {
    let stats = state.content.channel_stats(caller.id()).await?;
    Ok(Json(ApiResponse::ok(stats, "Channel stats fetched")))
}

/// `GET /dashboard/videos`: every video of the caller, unpublished included.
pub async fn videos(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Query(query): Query<ListQuery>,
) -> ApiResult<Listing> {
    let spec = catalog::channel_videos(caller.id());
    list(&state, &spec, &query, caller.id(), "videos", "Channel videos fetched").await
}
