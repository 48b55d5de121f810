use axum::{extract::FromRequestParts, http::request::Parts};
use clipcast_core::accounts::PublicAccount;
use uuid::Uuid;

use crate::infra::errors::AppError;

/// The account resolved by [`require_auth`](super::require_auth).
///
/// Rejects with 401 when used on a route the gate does not cover.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub PublicAccount);

impl CurrentAccount {
    pub fn id(&self) -> Uuid {
        self.0.id
    }
}

impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PublicAccount>()
            .cloned()
            .map(CurrentAccount)
            .ok_or_else(|| AppError::unauthorized("unauthorized request"))
    }
}
