use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::codec::{CredentialCodec, TokenKind};
use crate::accounts::{IdentityStore, PublicAccount};
use crate::error::ErrorKind;
use crate::store::StoreError;

/// Places an access token can arrive in.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenCarrier {
    pub cookie: Option<String>,
    pub bearer: Option<String>,
}

impl fmt::Debug for TokenCarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCarrier")
            .field("cookie", &self.cookie.is_some())
            .field("bearer", &self.bearer.is_some())
            .finish()
    }
}

impl TokenCarrier {
    /// The cookie wins when both are present. Blank values count as absent.
    pub fn token(&self) -> Option<&str> {
        fn present(value: &Option<String>) -> Option<&str> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|token| !token.is_empty())
        }
        present(&self.cookie).or_else(|| present(&self.bearer))
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("unauthorized request")]
    Unauthenticated,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GateError::Unauthenticated => ErrorKind::Authentication,
            GateError::Store(err) => err.kind(),
        }
    }
}

/// Resolves the caller of a protected request from its access token.
#[derive(Clone)]
pub struct RequestGate {
    identity: Arc<dyn IdentityStore>,
    codec: Arc<CredentialCodec>,
}

impl fmt::Debug for RequestGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestGate").finish_non_exhaustive()
    }
}

impl RequestGate {
    pub fn new(identity: Arc<dyn IdentityStore>, codec: Arc<CredentialCodec>) -> Self {
        Self { identity, codec }
    }

    pub async fn authenticate(&self, carrier: &TokenCarrier) -> Result<PublicAccount, GateError> {
        let Some(token) = carrier.token() else {
            debug!("gate rejected request: no access token");
            return Err(GateError::Unauthenticated);
        };

        let account_id = self
            .codec
            .verify(token, TokenKind::Access)
            .map_err(|err| {
                debug!(error = %err, "gate rejected request: token verification failed");
                GateError::Unauthenticated
            })?;

        match self.identity.find_by_id(account_id).await? {
            Some(account) => Ok(account.to_public()),
            None => {
                debug!(account_id = %account_id, "gate rejected request: account no longer exists");
                Err(GateError::Unauthenticated)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{Account, DocumentIdentityStore, NewAccount};
    use crate::auth::codec::{DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL};
    use crate::store::MemoryStore;
    use uuid::Uuid;

    async fn setup() -> (RequestGate, Arc<CredentialCodec>, Account) {
        let identity = Arc::new(DocumentIdentityStore::new(Arc::new(MemoryStore::new())));
        let codec = Arc::new(
            CredentialCodec::new("access", "refresh", DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL)
                .unwrap(),
        );
        let account = identity
            .create(Account::new(
                &NewAccount {
                    display_name: "A".into(),
                    email: "a@x.com".into(),
                    handle: "alpha".into(),
                    password: "p1".into(),
                    avatar: "https://img.example/a.png".into(),
                    cover: None,
                },
                "hash".into(),
            ))
            .await
            .unwrap();
        (RequestGate::new(identity, codec.clone()), codec, account)
    }

    #[test]
    fn cookie_takes_precedence_over_bearer() {
        let carrier = TokenCarrier {
            cookie: Some("from-cookie".into()),
            bearer: Some("from-header".into()),
        };
        assert_eq!(carrier.token(), Some("from-cookie"));

        let blank_cookie = TokenCarrier {
            cookie: Some("  ".into()),
            bearer: Some("from-header".into()),
        };
        assert_eq!(blank_cookie.token(), Some("from-header"));
        assert_eq!(TokenCarrier::default().token(), None);
    }

    #[tokio::test]
    async fn resolves_public_account_from_access_token() {
        let (gate, codec, account) = setup().await;
        let access = codec.issue_access(account.id).unwrap();

        let resolved = gate
            .authenticate(&TokenCarrier {
                cookie: None,
                bearer: Some(access.token),
            })
            .await
            .unwrap();
        assert_eq!(resolved, account.to_public());
    }

    #[tokio::test]
    async fn rejects_missing_refresh_and_orphaned_tokens() {
        let (gate, codec, account) = setup().await;

        let missing = gate.authenticate(&TokenCarrier::default()).await;
        let refresh = codec.issue_refresh(account.id).unwrap();
        let wrong_kind = gate
            .authenticate(&TokenCarrier {
                cookie: Some(refresh.token),
                bearer: None,
            })
            .await;
        let orphan = codec.issue_access(Uuid::now_v7()).unwrap();
        let orphaned = gate
            .authenticate(&TokenCarrier {
                cookie: Some(orphan.token),
                bearer: None,
            })
            .await;

        for result in [missing, wrong_kind, orphaned] {
            assert!(matches!(result, Err(GateError::Unauthenticated)));
        }
    }

    #[tokio::test]
    async fn invalid_cookie_is_not_rescued_by_valid_bearer() {
        let (gate, codec, account) = setup().await;
        let access = codec.issue_access(account.id).unwrap();

        let result = gate
            .authenticate(&TokenCarrier {
                cookie: Some("stale".into()),
                bearer: Some(access.token),
            })
            .await;
        assert!(matches!(result, Err(GateError::Unauthenticated)));
    }
}
