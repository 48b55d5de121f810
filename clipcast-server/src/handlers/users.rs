use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use clipcast_core::{
    accounts::{AccountImage, NewAccount, ProfileUpdate, PublicAccount, validate_email},
    api_types::{ApiResponse, ImageRequest, PasswordChangeRequest, ProfileRequest},
    catalog,
    store::Document,
};
use serde_json::Value;

use super::ApiResult;
use crate::auth::CurrentAccount;
use crate::infra::{
    app_state::AppState,
    errors::{ApiJson, AppError, AppResult},
};

/// `POST /users`: register a new account.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<NewAccount>,
) -> AppResult<(StatusCode, Json<ApiResponse<PublicAccount>>)> {
    let account = state.sessions.register(&registration).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(account, "User registered successfully")),
    ))
}

pub async fn me(caller: CurrentAccount) -> ApiResult<PublicAccount> {
    Ok(Json(ApiResponse::ok(caller.0, "Current user fetched")))
}

/// `PATCH /users/me`: change display name and/or email.
pub async fn update_profile(
    State(state): State<AppState>,
    caller: CurrentAccount,
    ApiJson(request): ApiJson<ProfileRequest>,
) -> ApiResult<PublicAccount> {
    let update = ProfileUpdate::from(request);
    if update.is_empty() {
        return Err(AppError::bad_request("displayName or email is required"));
    }
    if update
        .display_name
        .as_deref()
        .is_some_and(|name| name.trim().is_empty())
    {
        return Err(AppError::bad_request("displayName must not be blank"));
    }
    if let Some(email) = update.email.as_deref() {
        validate_email(email)?;
    }

    let account = state
        .identity
        .update_profile(caller.id(), update)
        .await?
        .ok_or_else(|| AppError::not_found("account not found"))?;
    Ok(Json(ApiResponse::ok(
        account.to_public(),
        "Account details updated",
    )))
}

pub async fn change_password(
    State(state): State<AppState>,
    caller: CurrentAccount,
    ApiJson(request): ApiJson<PasswordChangeRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .sessions
        .change_password(caller.id(), &request.old_password, &request.new_password)
        .await?;
    Ok(Json(ApiResponse::empty(200, "Password changed")))
}

pub async fn update_avatar(
    state: State<AppState>,
    caller: CurrentAccount,
    request: ApiJson<ImageRequest>,
) -> ApiResult<PublicAccount> {
    update_image(state, caller, request, AccountImage::Avatar).await
}

pub async fn update_cover(
    state: State<AppState>,
    caller: CurrentAccount,
    request: ApiJson<ImageRequest>,
) -> ApiResult<PublicAccount> {
    update_image(state, caller, request, AccountImage::Cover).await
}

async fn update_image(
    State(state): State<AppState>,
    caller: CurrentAccount,
    ApiJson(request): ApiJson<ImageRequest>,
    image: AccountImage,
) -> ApiResult<PublicAccount> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(AppError::bad_request("url is required"));
    }

    let account = state
        .identity
        .update_image(caller.id(), image, url.to_string())
        .await?
        .ok_or_else(|| AppError::not_found("account not found"))?;
    let message = match image {
        AccountImage::Avatar => "Avatar updated",
        AccountImage::Cover => "Cover image updated",
    };
    Ok(Json(ApiResponse::ok(account.to_public(), message)))
}

/// `GET /users/me/history`: watched videos with their owners, in the order
/// they were first watched.
pub async fn watch_history(
    State(state): State<AppState>,
    caller: CurrentAccount,
) -> ApiResult<Value> {
    let history = state
        .composer
        .compose_one(&catalog::watch_history(caller.id()), Some(caller.id()))
        .await?
        .and_then(|mut doc| doc.remove("watchHistory"))
        .unwrap_or_else(|| Value::Array(Vec::new()));
    Ok(Json(ApiResponse::ok(history, "Watch history fetched")))
}

/// `GET /users/channel/{handle}`: public channel profile with subscription
/// counters as seen by the caller.
pub async fn channel_profile(
    State(state): State<AppState>,
    caller: CurrentAccount,
    Path(handle): Path<String>,
) -> ApiResult<Document> {
    let channel = state
        .composer
        .compose_one(&catalog::channel_profile(&handle), Some(caller.id()))
        .await?
        .ok_or_else(|| AppError::not_found("channel does not exist"))?;
    Ok(Json(ApiResponse::ok(channel, "Channel fetched")))
}
