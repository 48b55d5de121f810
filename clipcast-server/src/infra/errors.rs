use std::fmt;

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clipcast_core::{
    ErrorKind,
    accounts::AccountError,
    api_types::ApiResponse,
    auth::{GateError, SessionError},
    content::ContentError,
    readmodel::ComposeError,
    store::StoreError,
};
use serde::de::DeserializeOwned;

pub type AppResult<T> = Result<T, AppError>;

/// Error returned by handlers, rendered as the standard envelope.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Map a classified core error. Internal details are logged and replaced
    /// by a generic message.
    pub fn from_kind(kind: ErrorKind, err: &dyn std::error::Error) -> Self {
        match kind {
            ErrorKind::Validation => Self::bad_request(err.to_string()),
            ErrorKind::Authentication => Self::unauthorized(err.to_string()),
            ErrorKind::Forbidden => Self::forbidden(err.to_string()),
            ErrorKind::NotFound => Self::not_found(err.to_string()),
            ErrorKind::Conflict => Self::conflict(err.to_string()),
            ErrorKind::Internal => {
                tracing::error!(error = %err, "request failed");
                Self::internal("Internal server error")
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::error(self.status.as_u16(), self.message));
        (self.status, body).into_response()
    }
}

macro_rules! classified_error {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for AppError {
                fn from(err: $error) -> Self {
                    Self::from_kind(err.kind(), &err)
                }
            }
        )*
    };
}

classified_error!(
    SessionError,
    GateError,
    ContentError,
    ComposeError,
    StoreError,
    AccountError,
);

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = ?err, "request failed");
        Self::internal("Internal server error")
    }
}

/// `Json` extractor whose rejections use the standard envelope with 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    AppError::bad_request(rejection.body_text())
}
