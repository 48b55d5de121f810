pub mod comments;
pub mod dashboard;
pub mod health;
pub mod likes;
pub mod playlists;
pub mod session;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

use axum::Json;
use clipcast_core::{
    api_types::{ApiResponse, ListQuery, Listing},
    readmodel::{ListingRequest, ListingSpec},
};
use uuid::Uuid;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

pub type ApiResult<T> = AppResult<Json<ApiResponse<T>>>;

/// Parse an id taken from the path or the query string.
pub(crate) fn parse_id(raw: &str, name: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::bad_request(format!("invalid {name}")))
}

/// Optional id query parameter. Blank counts as absent.
pub(crate) fn query_id(raw: Option<&str>, name: &str) -> AppResult<Option<Uuid>> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => parse_id(value, name).map(Some),
        None => Ok(None),
    }
}

/// Compose one page of `spec` for `caller` and wrap it under `key`.
pub(crate) async fn list(
    state: &AppState,
    spec: &ListingSpec,
    query: &ListQuery,
    caller: Uuid,
    key: &'static str,
    message: &str,
) -> ApiResult<Listing> {
    let request = ListingRequest::new(query.page_request())
        .for_caller(Some(caller))
        .with_sort(query.sort());
    let page = state.composer.compose(spec, &request).await?;
    Ok(Json(ApiResponse::ok(Listing::new(key, page), message)))
}
