//! Abstract document store.
//!
//! Every collection is a bag of JSON documents keyed by `_id`. The trait is
//! deliberately small: the composer only needs filtered reads, batched key
//! lookups and counts, while the write side needs atomic single-document
//! updates and an insert-if-absent primitive for uniqueness.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::error::ErrorKind;

pub mod document;
pub mod memory;
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres;
pub mod query;

pub use document::Document;
pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresDocumentStore;
pub use query::{Filter, SortDirection, SortSpec, UpdateOp, Window};

/// Collection names used across the platform.
pub mod collections {
    pub const USERS: &str = "users";
    pub const VIDEOS: &str = "videos";
    pub const TWEETS: &str = "tweets";
    pub const COMMENTS: &str = "comments";
    pub const LIKES: &str = "likes";
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    pub const PLAYLISTS: &str = "playlists";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate document: {0}")]
    Conflict(String),
    #[error("document has unexpected shape: {0}")]
    Shape(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Conflict(_) => ErrorKind::Conflict,
            _ => ErrorKind::Internal,
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return StoreError::Conflict(db_err.message().to_string());
        }
        StoreError::Backend(anyhow::Error::new(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document. Assigns `_id`/`createdAt` when missing and returns
    /// the stored document.
    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<Document>;

    /// Insert only when no document matches `guard`, atomically with respect
    /// to other writers. Returns `None` when a matching document exists.
    async fn insert_if_absent(
        &self,
        collection: &str,
        guard: &Filter,
        doc: Document,
    ) -> StoreResult<Option<Document>>;

    /// Every matching document in insertion order.
    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>>;

    /// Matching documents sorted, optionally restricted to a window.
    async fn find_sorted(
        &self,
        collection: &str,
        filter: &Filter,
        sort: &SortSpec,
        window: Option<Window>,
    ) -> StoreResult<Vec<Document>>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>>;

    /// Documents whose `field` equals any of `keys` and that match `filter`.
    /// Used for batched joins.
    async fn find_by_keys(
        &self,
        collection: &str,
        field: &str,
        keys: &[Value],
        filter: &Filter,
    ) -> StoreResult<Vec<Document>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let filter = Filter::any_of(field, keys.to_vec()).and(filter.clone());
        self.find(collection, &filter).await
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Apply `ops` to the first matching document atomically and return the
    /// updated document.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        ops: &[UpdateOp],
    ) -> StoreResult<Option<Document>>;

    /// Delete the first matching document and return it.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>>;

    /// Delete every matching document and return how many were removed.
    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;
}

/// Fill in `_id` and `createdAt` for a document about to be inserted.
pub(crate) fn prepare_insert(mut doc: Document) -> Document {
    doc.entry(document::ID_FIELD.to_string())
        .or_insert_with(|| document::id_value(uuid::Uuid::now_v7()));
    doc.entry(document::CREATED_AT_FIELD.to_string())
        .or_insert_with(document::now_value);
    doc
}
