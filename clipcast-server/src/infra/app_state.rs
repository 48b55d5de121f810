use std::{fmt, sync::Arc};

use anyhow::Context;
use clipcast_core::{
    accounts::{DocumentIdentityStore, IdentityStore},
    auth::{AuthCrypto, CredentialCodec, RequestGate, SessionAuthority},
    content::ContentService,
    readmodel::ReadModelComposer,
    store::DocumentStore,
};

use crate::infra::config::Config;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityStore>,
    pub sessions: Arc<SessionAuthority>,
    pub gate: Arc<RequestGate>,
    pub composer: Arc<ReadModelComposer>,
    pub content: Arc<ContentService>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire the core services over `store` with production Argon2 settings.
    pub fn new(config: Arc<Config>, store: Arc<dyn DocumentStore>) -> anyhow::Result<Self> {
        let crypto = AuthCrypto::new(&config.auth.password_pepper, &config.auth.token_key)
            .context("failed to initialise password hashing")?;
        Self::with_crypto(config, store, Arc::new(crypto))
    }

    pub fn with_crypto(
        config: Arc<Config>,
        store: Arc<dyn DocumentStore>,
        crypto: Arc<AuthCrypto>,
    ) -> anyhow::Result<Self> {
        let codec = Arc::new(
            CredentialCodec::new(
                &config.auth.access_secret,
                &config.auth.refresh_secret,
                config.auth.access_ttl,
                config.auth.refresh_ttl,
            )
            .context("invalid token configuration")?,
        );
        let identity: Arc<dyn IdentityStore> =
            Arc::new(DocumentIdentityStore::new(store.clone()));

        Ok(Self {
            sessions: Arc::new(SessionAuthority::new(
                identity.clone(),
                codec.clone(),
                crypto,
            )),
            gate: Arc::new(RequestGate::new(identity.clone(), codec)),
            composer: Arc::new(ReadModelComposer::new(store.clone())),
            content: Arc::new(ContentService::new(store.clone())),
            identity,
            store,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
