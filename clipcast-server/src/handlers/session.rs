use axum::{Json, body::Bytes, extract::State};
use axum_extra::extract::cookie::CookieJar;
use clipcast_core::api_types::{
    ApiResponse, LoginRequest, RefreshRequest, SessionResponse, TokenResponse,
};
use tracing::debug;

use crate::auth::{CurrentAccount, REFRESH_COOKIE, TokenCookies};
use crate::infra::{
    app_state::AppState,
    errors::{ApiJson, AppError, AppResult},
};

/// `POST /session/login`: sign in with email or handle.
///
/// Returns the public account and both tokens, and sets them as cookies.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<SessionResponse>>)> {
    let outcome = state
        .sessions
        .login(&request.credential, &request.password)
        .await?;

    let jar = TokenCookies::new(&state.config.cookies).set(jar, &outcome.tokens);
    let body = SessionResponse::new(outcome.account, &outcome.tokens);
    Ok((jar, Json(ApiResponse::ok(body, "User logged in successfully"))))
}

/// `POST /session/refresh`: rotate the session.
///
/// The refresh token comes from the cookie, or from a JSON body
/// `{"refreshToken": ...}` when no cookie is sent.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, Json<ApiResponse<TokenResponse>>)> {
    let from_cookie = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let presented = match from_cookie {
        Some(token) => Some(token),
        None => body_token(&body)?,
    };

    let tokens = state.sessions.refresh(presented.as_deref()).await?;
    let jar = TokenCookies::new(&state.config.cookies).set(jar, &tokens);
    Ok((
        jar,
        Json(ApiResponse::ok(
            TokenResponse::from(&tokens),
            "Access token refreshed",
        )),
    ))
}

fn body_token(body: &[u8]) -> AppResult<Option<String>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let request: RefreshRequest = serde_json::from_slice(body).map_err(|err| {
        debug!(error = %err, "unreadable refresh body");
        AppError::bad_request("request body must be JSON")
    })?;
    Ok(request.refresh_token)
}

/// `POST /session/logout`: revoke the refresh token and clear the cookies.
///
/// Access tokens already issued stay valid until they expire.
pub async fn logout(
    State(state): State<AppState>,
    caller: CurrentAccount,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<ApiResponse<()>>)> {
    state.sessions.logout(caller.id()).await?;
    let jar = TokenCookies::new(&state.config.cookies).clear(jar);
    Ok((jar, Json(ApiResponse::empty(200, "User logged out"))))
}
