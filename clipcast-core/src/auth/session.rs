use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::codec::{CodecError, CredentialCodec, IssuedToken, TokenKind};
use super::crypto::{AuthCrypto, AuthCryptoError};
use crate::accounts::{Account, AccountError, IdentityStore, NewAccount, PublicAccount};
use crate::error::ErrorKind;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Invalid(String),
    #[error("account does not exist")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("refresh token is expired or invalid")]
    ExpiredOrInvalid,
    #[error("refresh token is expired or has been used")]
    Unauthorized,
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Crypto(#[from] AuthCryptoError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Invalid(_) => ErrorKind::Validation,
            SessionError::NotFound => ErrorKind::NotFound,
            SessionError::InvalidCredentials
            | SessionError::ExpiredOrInvalid
            | SessionError::Unauthorized => ErrorKind::Authentication,
            SessionError::Codec(err) => err.kind(),
            SessionError::Crypto(_) => ErrorKind::Internal,
            SessionError::Store(err) => err.kind(),
        }
    }
}

impl From<AccountError> for SessionError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Invalid(message) => SessionError::Invalid(message),
            AccountError::NotFound => SessionError::NotFound,
            AccountError::Store(err) => SessionError::Store(err),
        }
    }
}

/// Email or handle used to sign in. At least one must be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginCredential {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
}

impl LoginCredential {
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            handle: None,
        }
    }

    pub fn handle(handle: impl Into<String>) -> Self {
        Self {
            email: None,
            handle: Some(handle.into()),
        }
    }

    fn is_empty(&self) -> bool {
        let blank = |value: &Option<String>| value.as_deref().is_none_or(|v| v.trim().is_empty());
        blank(&self.email) && blank(&self.handle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub account: PublicAccount,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoSession,
    Active,
}

/// Owns the single-live-refresh-token invariant.
///
/// Every successful login or refresh overwrites the stored digest, which is
/// what revokes every refresh token issued before it. Tokens are only handed
/// back once the digest has been persisted.
#[derive(Clone)]
pub struct SessionAuthority {
    identity: Arc<dyn IdentityStore>,
    codec: Arc<CredentialCodec>,
    crypto: Arc<AuthCrypto>,
}

impl fmt::Debug for SessionAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionAuthority")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl SessionAuthority {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        codec: Arc<CredentialCodec>,
        crypto: Arc<AuthCrypto>,
    ) -> Self {
        Self {
            identity,
            codec,
            crypto,
        }
    }

    pub fn codec(&self) -> &CredentialCodec {
        &self.codec
    }

    pub async fn login(
        &self,
        credential: &LoginCredential,
        password: &str,
    ) -> Result<LoginOutcome, SessionError> {
        if credential.is_empty() {
            return Err(SessionError::Invalid("email or handle is required".into()));
        }
        if password.is_empty() {
            return Err(SessionError::Invalid("password is required".into()));
        }

        let account = self
            .identity
            .find_by_email_or_handle(credential.email.as_deref(), credential.handle.as_deref())
            .await?
            .ok_or(SessionError::NotFound)?;

        if !self.crypto.verify_password(password, &account.password_hash)? {
            warn!(account_id = %account.id, "login rejected: password mismatch");
            return Err(SessionError::InvalidCredentials);
        }

        let tokens = self.issue_and_persist(account.id).await?;
        info!(account_id = %account.id, "login succeeded");
        Ok(LoginOutcome {
            account: account.to_public(),
            tokens,
        })
    }

    pub async fn refresh(&self, presented: Option<&str>) -> Result<TokenPair, SessionError> {
        let presented = presented
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::Unauthorized)?;

        let account_id = self
            .codec
            .verify(presented, TokenKind::Refresh)
            .map_err(|_| SessionError::ExpiredOrInvalid)?;

        let account = self
            .identity
            .find_by_id(account_id)
            .await?
            .ok_or(SessionError::Unauthorized)?;

        let current = account.refresh_token.as_deref().unwrap_or_default();
        if !account.has_session() || !self.crypto.token_matches(presented, current) {
            warn!(account_id = %account.id, "refresh rejected: token superseded or revoked");
            return Err(SessionError::Unauthorized);
        }

        let tokens = self.issue_and_persist(account.id).await?;
        info!(account_id = %account.id, "refresh token rotated");
        Ok(tokens)
    }

    /// Clear the stored refresh value. Calling it on an account without a
    /// session, or one that no longer exists, is not an error.
    pub async fn logout(&self, account_id: Uuid) -> Result<(), SessionError> {
        self.identity.update_refresh_field(account_id, None).await?;
        info!(account_id = %account_id, "logged out");
        Ok(())
    }

    pub async fn session_state(&self, account_id: Uuid) -> Result<SessionState, SessionError> {
        let account = self
            .identity
            .find_by_id(account_id)
            .await?
            .ok_or(SessionError::NotFound)?;
        Ok(if account.has_session() {
            SessionState::Active
        } else {
            SessionState::NoSession
        })
    }

    pub async fn register(&self, registration: &NewAccount) -> Result<PublicAccount, SessionError> {
        registration.validate()?;
        let password_hash = self.crypto.hash_password(&registration.password)?;
        let account = self
            .identity
            .create(Account::new(registration, password_hash))
            .await?;
        info!(account_id = %account.id, handle = %account.handle, "account registered");
        Ok(account.to_public())
    }

    /// Replace the password after checking the current one. The live session,
    /// if any, is left as is.
    pub async fn change_password(
        &self,
        account_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), SessionError> {
        if old_password.is_empty() || new_password.trim().is_empty() {
            return Err(SessionError::Invalid(
                "oldPassword and newPassword are required".into(),
            ));
        }

        let account = self
            .identity
            .find_by_id(account_id)
            .await?
            .ok_or(SessionError::NotFound)?;
        if !self.crypto.verify_password(old_password, &account.password_hash)? {
            return Err(SessionError::Invalid("old password is incorrect".into()));
        }

        let password_hash = self.crypto.hash_password(new_password)?;
        if !self
            .identity
            .update_password_hash(account_id, password_hash)
            .await?
        {
            return Err(SessionError::NotFound);
        }
        info!(account_id = %account_id, "password changed");
        Ok(())
    }

    async fn issue_and_persist(&self, account_id: Uuid) -> Result<TokenPair, SessionError> {
        let access = self.codec.issue_access(account_id)?;
        let refresh = self.codec.issue_refresh(account_id)?;

        let digest = self.crypto.hash_token(&refresh.token);
        if !self
            .identity
            .update_refresh_field(account_id, Some(digest))
            .await?
        {
            return Err(SessionError::NotFound);
        }

        Ok(TokenPair { access, refresh })
    }
}
