//! Session lifecycle properties exercised through the public API only.

use std::sync::Arc;

use anyhow::Result;
use clipcast_core::{
    ErrorKind,
    accounts::{DocumentIdentityStore, IdentityStore, NewAccount, PublicAccount},
    auth::{
        AuthCrypto, CredentialCodec, LoginCredential, RequestGate, SessionAuthority,
        SessionError, SessionState, TokenCarrier,
        codec::{DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL},
    },
    store::MemoryStore,
};

const PASSWORD: &str = "CorrectHorseBattery1!";

struct Harness {
    authority: SessionAuthority,
    gate: RequestGate,
    identity: Arc<DocumentIdentityStore>,
    crypto: Arc<AuthCrypto>,
    account: PublicAccount,
}

async fn harness() -> Result<Harness> {
    let identity = Arc::new(DocumentIdentityStore::new(Arc::new(MemoryStore::new())));
    let crypto = Arc::new(AuthCrypto::insecure_fast("test-pepper", "test-token-key")?);
    let codec = Arc::new(CredentialCodec::new(
        "access-secret",
        "refresh-secret",
        DEFAULT_ACCESS_TTL,
        DEFAULT_REFRESH_TTL,
    )?);
    let authority = SessionAuthority::new(identity.clone(), codec.clone(), crypto.clone());
    let gate = RequestGate::new(identity.clone(), codec);
    let account = authority
        .register(&NewAccount {
            display_name: "Viewer".into(),
            email: "Viewer@Example.com".into(),
            handle: "viewer".into(),
            password: PASSWORD.into(),
            avatar: "https://cdn.example/v.png".into(),
            cover: None,
        })
        .await?;
    Ok(Harness {
        authority,
        gate,
        identity,
        crypto,
        account,
    })
}

fn bearer(token: &str) -> TokenCarrier {
    TokenCarrier {
        cookie: None,
        bearer: Some(token.to_string()),
    }
}

#[tokio::test]
async fn only_the_latest_refresh_token_in_a_rotation_chain_works() -> Result<()> {
    let h = harness().await?;
    let login = h
        .authority
        .login(&LoginCredential::email("viewer@example.com"), PASSWORD)
        .await?;

    let mut retired = vec![login.tokens.refresh.token.clone()];
    let mut current = login.tokens.refresh.token;
    for _ in 0..3 {
        let rotated = h.authority.refresh(Some(&current)).await?;
        retired.push(std::mem::replace(&mut current, rotated.refresh.token));
    }

    for old in &retired {
        let err = h.authority.refresh(Some(old)).await.unwrap_err();
        assert!(matches!(err, SessionError::Unauthorized));
    }

    let stored = h.identity.find_by_id(h.account.id).await?.expect("account");
    let digest = stored.refresh_token.expect("live session");
    assert!(h.crypto.token_matches(&current, &digest));
    assert_ne!(digest, current, "raw token must not be stored");
    Ok(())
}

#[tokio::test]
async fn a_new_login_supersedes_the_previous_session() -> Result<()> {
    let h = harness().await?;
    let first = h
        .authority
        .login(&LoginCredential::handle("viewer"), PASSWORD)
        .await?;
    let second = h
        .authority
        .login(&LoginCredential::handle("VIEWER"), PASSWORD)
        .await?;

    assert!(h.authority.refresh(Some(&first.tokens.refresh.token)).await.is_err());
    h.authority
        .refresh(Some(&second.tokens.refresh.token))
        .await?;
    Ok(())
}

#[tokio::test]
async fn logout_ends_refresh_but_not_issued_access_tokens() -> Result<()> {
    let h = harness().await?;
    let login = h
        .authority
        .login(&LoginCredential::email("viewer@example.com"), PASSWORD)
        .await?;

    h.authority.logout(h.account.id).await?;
    h.authority.logout(h.account.id).await?;
    assert_eq!(
        h.authority.session_state(h.account.id).await?,
        SessionState::NoSession
    );

    let err = h
        .authority
        .refresh(Some(&login.tokens.refresh.token))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);

    // The access token lives until its own expiry.
    let account = h.gate.authenticate(&bearer(&login.tokens.access.token)).await?;
    assert_eq!(account.id, h.account.id);
    Ok(())
}

#[tokio::test]
async fn token_kinds_are_not_interchangeable() -> Result<()> {
    let h = harness().await?;
    let login = h
        .authority
        .login(&LoginCredential::handle("viewer"), PASSWORD)
        .await?;

    assert!(h.gate.authenticate(&bearer(&login.tokens.refresh.token)).await.is_err());
    let err = h
        .authority
        .refresh(Some(&login.tokens.access.token))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::ExpiredOrInvalid));
    Ok(())
}

#[tokio::test]
async fn failed_logins_leave_the_session_untouched() -> Result<()> {
    let h = harness().await?;
    let login = h
        .authority
        .login(&LoginCredential::handle("viewer"), PASSWORD)
        .await?;

    let wrong = h
        .authority
        .login(&LoginCredential::handle("viewer"), "nope")
        .await
        .unwrap_err();
    assert_eq!(wrong.kind(), ErrorKind::Authentication);
    let unknown = h
        .authority
        .login(&LoginCredential::handle("stranger"), PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(unknown.kind(), ErrorKind::NotFound);

    h.authority.refresh(Some(&login.tokens.refresh.token)).await?;
    Ok(())
}
