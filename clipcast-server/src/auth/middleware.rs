use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use clipcast_core::auth::TokenCarrier;

use super::cookies::ACCESS_COOKIE;
use crate::infra::{app_state::AppState, errors::AppError};

/// Access gate for protected routes.
///
/// Resolves the caller from the `accessToken` cookie or the bearer header and
/// stores the public account in the request extensions, where
/// [`CurrentAccount`](super::CurrentAccount) picks it up.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let carrier = token_carrier(request.headers());
    let account = state.gate.authenticate(&carrier).await?;

    request.extensions_mut().insert(account);
    Ok(next.run(request).await)
}

pub(crate) fn token_carrier(headers: &HeaderMap) -> TokenCarrier {
    let cookie = CookieJar::from_headers(headers)
        .get(ACCESS_COOKIE)
        .map(|cookie| cookie.value().to_string());
    TokenCarrier {
        cookie,
        bearer: bearer_token(headers),
    }
}

/// Auth scheme names are case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim_start().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim().to_string())
}
