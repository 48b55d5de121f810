use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ErrorKind;

pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(10 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    /// Random per token, so two tokens issued in the same second differ
    pub jti: String,
    pub typ: TokenKind,
}

#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub kind: TokenKind,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("kind", &self.kind)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("token signing failed: {0}")]
    SigningFailure(String),
    #[error("token has expired")]
    ExpiredToken,
    #[error("token is malformed or has an invalid signature")]
    MalformedToken,
    #[error("invalid token secrets: {0}")]
    InvalidSecrets(&'static str),
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::ExpiredToken | CodecError::MalformedToken => ErrorKind::Authentication,
            CodecError::SigningFailure(_) | CodecError::InvalidSecrets(_) => ErrorKind::Internal,
        }
    }
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Signs and verifies HS256 access and refresh tokens.
///
/// Pure: no I/O, no shared mutable state. Whether a refresh token is still
/// the live one for its account is decided by the session authority.
pub struct CredentialCodec {
    access: KeyPair,
    refresh: KeyPair,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for CredentialCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl CredentialCodec {
    pub fn new(
        access_secret: impl AsRef<[u8]>,
        refresh_secret: impl AsRef<[u8]>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, CodecError> {
        let access_secret = access_secret.as_ref();
        let refresh_secret = refresh_secret.as_ref();
        if access_secret.is_empty() || refresh_secret.is_empty() {
            return Err(CodecError::InvalidSecrets("secrets must not be empty"));
        }
        if access_secret == refresh_secret {
            return Err(CodecError::InvalidSecrets(
                "access and refresh secrets must differ",
            ));
        }
        if access_ttl.is_zero() || refresh_ttl.is_zero() {
            return Err(CodecError::InvalidSecrets("token lifetimes must be positive"));
        }

        Ok(Self {
            access: KeyPair::from_secret(access_secret),
            refresh: KeyPair::from_secret(refresh_secret),
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue_access(&self, account_id: Uuid) -> Result<IssuedToken, CodecError> {
        self.issue_at(account_id, TokenKind::Access, Utc::now())
    }

    pub fn issue_refresh(&self, account_id: Uuid) -> Result<IssuedToken, CodecError> {
        self.issue_at(account_id, TokenKind::Refresh, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        account_id: Uuid,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, CodecError> {
        let ttl = chrono::Duration::from_std(self.ttl(kind))
            .map_err(|err| CodecError::SigningFailure(err.to_string()))?;
        let expires_at = now + ttl;

        let claims = Claims {
            sub: account_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            typ: kind,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys(kind).encoding,
        )
        .map_err(|err| CodecError::SigningFailure(err.to_string()))?;

        Ok(IssuedToken {
            token,
            kind,
            expires_at,
        })
    }

    /// Verify a token of the given kind and return the account id it names.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Uuid, CodecError> {
        self.decode_claims(token, kind).map(|claims| claims.sub)
    }

    pub fn decode_claims(&self, token: &str, kind: TokenKind) -> Result<Claims, CodecError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        let data = decode::<Claims>(token, &self.keys(kind).decoding, &validation).map_err(
            |err| match err.kind() {
                JwtErrorKind::ExpiredSignature => CodecError::ExpiredToken,
                _ => CodecError::MalformedToken,
            },
        )?;

        if data.claims.typ != kind {
            return Err(CodecError::MalformedToken);
        }
        Ok(data.claims)
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }
}
