//! Accounts and the identity store
//!
//! An account is the owner of every piece of content on the platform and the
//! subject of every issued credential.
//!
//! ## Identity
//!
//! 1. **Registration**: email and handle are normalised to lowercase and must
//!    be unique across all accounts
//! 2. **Login**: either identifier resolves the account
//! 3. **Session**: the digest of the single live refresh token is mirrored on
//!    the account in `refreshToken`
//!
//! ## Security
//!
//! - Password hashes and the refresh digest never leave the core: every
//!   outward-facing view goes through [`PublicAccount`]
//! - Composer joins against the `users` collection retain only
//!   [`PROFILE_FIELDS`]

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ErrorKind;
use crate::store::{StoreError, document::timestamp};

mod store;

pub use store::{AccountImage, DocumentIdentityStore, IdentityStore, ProfileUpdate};

/// Fields of another account that listings may expose.
pub const PROFILE_FIELDS: &[&str] = &["_id", "handle", "displayName", "avatar"];

/// Stored account record.
///
/// `password_hash` and `refresh_token` are secrets; use [`Account::to_public`]
/// for anything that leaves the process.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique account identifier
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Lowercase email address, unique
    pub email: String,
    /// Lowercase channel handle, unique
    pub handle: String,
    /// Name shown next to content
    pub display_name: String,
    /// Argon2id PHC string
    pub password_hash: String,
    /// Avatar image URL
    pub avatar: String,
    /// Optional channel cover image URL
    #[serde(default)]
    pub cover: Option<String>,
    /// Digest of the live refresh token, absent when signed out
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Watched video ids, oldest first
    #[serde(default)]
    pub watch_history: Vec<Uuid>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("handle", &self.handle)
            .field("display_name", &self.display_name)
            .field("password_hash", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("watch_history", &self.watch_history.len())
            .finish()
    }
}

impl Account {
    /// Build a fresh account from a validated registration.
    pub fn new(registration: &NewAccount, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            email: normalize_identifier(&registration.email),
            handle: normalize_identifier(&registration.handle),
            display_name: registration.display_name.trim().to_string(),
            password_hash,
            avatar: registration.avatar.trim().to_string(),
            cover: registration
                .cover
                .as_deref()
                .map(str::trim)
                .filter(|cover| !cover.is_empty())
                .map(str::to_string),
            refresh_token: None,
            watch_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// A blank stored value counts as no session.
    pub fn has_session(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
    }

    pub fn to_public(&self) -> PublicAccount {
        PublicAccount {
            id: self.id,
            email: self.email.clone(),
            handle: self.handle.clone(),
            display_name: self.display_name.clone(),
            avatar: self.avatar.clone(),
            cover: self.cover.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Account view without secret fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub handle: String,
    pub display_name: String,
    pub avatar: String,
    pub cover: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for PublicAccount {
    fn from(account: &Account) -> Self {
        account.to_public()
    }
}

/// Registration payload.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub display_name: String,
    pub email: String,
    pub handle: String,
    pub password: String,
    pub avatar: String,
    #[serde(default)]
    pub cover: Option<String>,
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl NewAccount {
    pub fn validate(&self) -> Result<(), AccountError> {
        let required = [
            ("displayName", &self.display_name),
            ("email", &self.email),
            ("handle", &self.handle),
            ("password", &self.password),
            ("avatar", &self.avatar),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AccountError::Invalid(format!("{field} is required")));
        }
        validate_email(&self.email)?;
        validate_handle(&self.handle)
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Invalid(String),
    #[error("account not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::Invalid(_) => ErrorKind::Validation,
            AccountError::NotFound => ErrorKind::NotFound,
            AccountError::Store(err) => err.kind(),
        }
    }
}

pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), AccountError> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid && !email.contains(char::is_whitespace) {
        Ok(())
    } else {
        Err(AccountError::Invalid("email address is invalid".to_string()))
    }
}

/// Handles appear in channel URLs: ASCII letters, digits, `_`, `-` and `.`.
pub fn validate_handle(handle: &str) -> Result<(), AccountError> {
    let handle = handle.trim();
    let valid = (3..=30).contains(&handle.len())
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(AccountError::Invalid(
            "handle must be 3-30 characters of letters, digits, '_', '-' or '.'".to_string(),
        ))
    }
}
