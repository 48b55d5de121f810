use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use clipcast_core::{
    api_types::{ApiResponse, ContentRequest, ListQuery, Listing},
    catalog,
    content::Tweet,
};

use super::{ApiResult, list, parse_id, query_id};
use crate::auth::CurrentAccount;
use crate::infra::{
    app_state::AppState,
    errors::{ApiJson, AppResult},
};

/// `GET /tweets?userId=`: defaults to the caller's own tweets.
pub async fn list_tweets(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Query(query): Query<ListQuery>,
) -> ApiResult<Listing> {
    let owner = query_id(query.user_id.as_deref(), "userId")?.unwrap_or(caller.id());
    let spec = catalog::tweets_by_owner(owner);
    list(&state, &spec, &query, caller.id(), "tweets", "Tweets fetched").await
}

pub async fn create_tweet(
    State(state): State<AppState>,
    caller: CurrentAccount,
    ApiJson(request): ApiJson<ContentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Tweet>>)> {
    let tweet = state
        .content
        .create_tweet(caller.id(), &request.content)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(tweet, "Tweet created")),
    ))
}

pub async fn update_tweet(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ContentRequest>,
) -> ApiResult<Tweet> {
    let id = parse_id(&id, "tweetId")?;
    let tweet = state
        .content
        .update_tweet(caller.id(), id, &request.content)
        .await?;
    Ok(Json(ApiResponse::ok(tweet, "Tweet updated")))
}

pub async fn delete_tweet(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id, "tweetId")?;
    state.content.delete_tweet(caller.id(), id).await?;
    Ok(Json(ApiResponse::empty(200, "Tweet deleted")))
}
