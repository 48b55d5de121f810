use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{Account, normalize_identifier};
use crate::store::{
    DocumentStore, Filter, StoreError, StoreResult, UpdateOp, collections,
    document::{from_document, id_value, to_document},
};

/// Profile fields an account may change about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.email.is_none()
    }
}

/// Persistent account lookup and mutation used by the session authority,
/// the request gate and the account endpoints.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;

    /// Resolve an account by email or handle. Either may be absent; when both
    /// are present an account matching either one is returned.
    async fn find_by_email_or_handle(
        &self,
        email: Option<&str>,
        handle: Option<&str>,
    ) -> StoreResult<Option<Account>>;

    /// Overwrite the stored refresh value unconditionally. Returns `false`
    /// when the account does not exist.
    async fn update_refresh_field(&self, id: Uuid, value: Option<String>) -> StoreResult<bool>;

    /// Insert a new account. Fails with [`StoreError::Conflict`] when the
    /// email or handle is taken.
    async fn create(&self, account: Account) -> StoreResult<Account>;

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate)
    -> StoreResult<Option<Account>>;

    async fn update_password_hash(&self, id: Uuid, password_hash: String) -> StoreResult<bool>;

    /// Replace the avatar or cover URL.
    async fn update_image(
        &self,
        id: Uuid,
        image: AccountImage,
        url: String,
    ) -> StoreResult<Option<Account>>;

    /// Record a watched video; repeated views keep a single entry.
    async fn push_watch_history(&self, id: Uuid, video_id: Uuid) -> StoreResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountImage {
    Avatar,
    Cover,
}

impl AccountImage {
    fn field(self) -> &'static str {
        match self {
            AccountImage::Avatar => "avatar",
            AccountImage::Cover => "cover",
        }
    }
}

/// [`IdentityStore`] over the `users` collection of any [`DocumentStore`].
#[derive(Clone)]
pub struct DocumentIdentityStore {
    store: Arc<dyn DocumentStore>,
}

impl fmt::Debug for DocumentIdentityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentIdentityStore").finish_non_exhaustive()
    }
}

impl DocumentIdentityStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn update(&self, id: Uuid, mut ops: Vec<UpdateOp>) -> StoreResult<Option<Account>> {
        ops.push(UpdateOp::Touch);
        self.store
            .update_one(collections::USERS, &Filter::by_id(id), &ops)
            .await?
            .map(from_document)
            .transpose()
    }
}

#[async_trait]
impl IdentityStore for DocumentIdentityStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        self.store
            .find_one(collections::USERS, &Filter::by_id(id))
            .await?
            .map(from_document)
            .transpose()
    }

    async fn find_by_email_or_handle(
        &self,
        email: Option<&str>,
        handle: Option<&str>,
    ) -> StoreResult<Option<Account>> {
        let mut candidates = Vec::new();
        if let Some(email) = email.map(normalize_identifier).filter(|e| !e.is_empty()) {
            candidates.push(Filter::eq("email", email));
        }
        if let Some(handle) = handle.map(normalize_identifier).filter(|h| !h.is_empty()) {
            candidates.push(Filter::eq("handle", handle));
        }
        if candidates.is_empty() {
            return Ok(None);
        }

        self.store
            .find_one(collections::USERS, &Filter::Or(candidates))
            .await?
            .map(from_document)
            .transpose()
    }

    async fn update_refresh_field(&self, id: Uuid, value: Option<String>) -> StoreResult<bool> {
        let value = value.map(Value::String).unwrap_or(Value::Null);
        let updated = self
            .update(id, vec![UpdateOp::Set("refreshToken".into(), value)])
            .await?;
        Ok(updated.is_some())
    }

    async fn create(&self, account: Account) -> StoreResult<Account> {
        let guard = Filter::Or(vec![
            Filter::eq("email", account.email.clone()),
            Filter::eq("handle", account.handle.clone()),
        ]);
        let doc = to_document(&account)?;
        match self
            .store
            .insert_if_absent(collections::USERS, &guard, doc)
            .await?
        {
            Some(stored) => from_document(stored),
            None => Err(StoreError::Conflict(
                "an account with this email or handle already exists".to_string(),
            )),
        }
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> StoreResult<Option<Account>> {
        let mut ops = Vec::new();
        if let Some(display_name) = update.display_name {
            ops.push(UpdateOp::set("displayName", display_name.trim()));
        }
        if let Some(email) = update.email {
            let email = normalize_identifier(&email);
            let taken = self
                .store
                .find_one(collections::USERS, &Filter::eq("email", email.clone()))
                .await?
                .is_some_and(|existing| existing.get("_id") != Some(&id_value(id)));
            if taken {
                return Err(StoreError::Conflict(
                    "an account with this email already exists".to_string(),
                ));
            }
            ops.push(UpdateOp::set("email", email));
        }
        self.update(id, ops).await
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: String) -> StoreResult<bool> {
        let updated = self
            .update(id, vec![UpdateOp::set("passwordHash", password_hash)])
            .await?;
        Ok(updated.is_some())
    }

    async fn update_image(
        &self,
        id: Uuid,
        image: AccountImage,
        url: String,
    ) -> StoreResult<Option<Account>> {
        self.update(id, vec![UpdateOp::set(image.field(), url)]).await
    }

    async fn push_watch_history(&self, id: Uuid, video_id: Uuid) -> StoreResult<()> {
        self.store
            .update_one(
                collections::USERS,
                &Filter::by_id(id),
                &[UpdateOp::AddToSet("watchHistory".into(), id_value(video_id))],
            )
            .await?;
        Ok(())
    }
}
