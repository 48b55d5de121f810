use axum::{
    Json,
    extract::{Path, Query, State},
};
use clipcast_core::{
    api_types::{ApiResponse, ListQuery, Listing},
    catalog,
    content::SubscriptionToggle,
};

use super::{ApiResult, list, parse_id, query_id};
use crate::auth::CurrentAccount;
use crate::infra::app_state::AppState;

/// `POST /subscriptions/{channelId}`: subscribe, or unsubscribe when already
/// subscribed.
pub async fn toggle_subscription(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(channel): Path<String>,
) -> ApiResult<SubscriptionToggle> {
    let channel = parse_id(&channel, "channelId")?;
    let toggle = state
        .content
        .toggle_subscription(caller.id(), channel)
        .await?;
    let message = if toggle.subscribed {
        "Subscribed"
    } else {
        "Unsubscribed"
    };
    Ok(Json(ApiResponse::ok(toggle, message)))
}

pub async fn channel_subscribers(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Query(query): Query<ListQuery>,
) -> ApiResult<Listing> {
    let channel = query_id(query.channel_id.as_deref(), "channelId")?.unwrap_or(caller.id());
    let spec = catalog::channel_subscribers(channel);
    list(
        &state,
        &spec,
        &query,
        caller.id(),
        "subscribers",
        "Subscribers fetched",
    )
    .await
}

pub async fn subscribed_channels(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Query(query): Query<ListQuery>,
) -> ApiResult<Listing> {
    let subscriber =
        query_id(query.subscriber_id.as_deref(), "subscriberId")?.unwrap_or(caller.id());
    let spec = catalog::subscribed_channels(subscriber);
    list(
        &state,
        &spec,
        &query,
        caller.id(),
        "channels",
        "Subscribed channels fetched",
    )
    .await
}
