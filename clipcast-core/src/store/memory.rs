use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{
    Document, DocumentStore, Filter, SortSpec, StoreError, StoreResult, UpdateOp, Window,
    document::ID_FIELD, prepare_insert,
};

/// Process-local document store.
///
/// Every operation runs under a single lock, which makes single-document
/// updates and insert-if-absent atomic. Data does not survive a restart; the
/// server only falls back to this store when no database URL is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_locked(
        collections: &mut HashMap<String, Vec<Document>>,
        collection: &str,
        doc: Document,
    ) -> StoreResult<Document> {
        let doc = prepare_insert(doc);
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|existing| existing.get(ID_FIELD) == doc.get(ID_FIELD)) {
            return Err(StoreError::Conflict(format!(
                "{collection}: {} already exists",
                doc.get(ID_FIELD).map(ToString::to_string).unwrap_or_default()
            )));
        }
        docs.push(doc.clone());
        Ok(doc)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<Document> {
        let mut collections = self.collections.write();
        Self::insert_locked(&mut collections, collection, doc)
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        guard: &Filter,
        doc: Document,
    ) -> StoreResult<Option<Document>> {
        let mut collections = self.collections.write();
        let exists = collections
            .get(collection)
            .is_some_and(|docs| docs.iter().any(|existing| guard.matches(existing)));
        if exists {
            return Ok(None);
        }
        Self::insert_locked(&mut collections, collection, doc).map(Some)
    }

    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_sorted(
        &self,
        collection: &str,
        filter: &Filter,
        sort: &SortSpec,
        window: Option<Window>,
    ) -> StoreResult<Vec<Document>> {
        let mut docs = self.find(collection, filter).await?;
        docs.sort_by(|a, b| sort.compare(a, b));
        Ok(match window {
            Some(Window { skip, limit }) => docs
                .into_iter()
                .skip(usize::try_from(skip).unwrap_or(usize::MAX))
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
            None => docs,
        })
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)).cloned()))
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).count() as u64)
            .unwrap_or(0))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        ops: &[UpdateOp],
    ) -> StoreResult<Option<Document>> {
        let mut collections = self.collections.write();
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| filter.matches(doc)))
        else {
            return Ok(None);
        };
        UpdateOp::apply_all(ops, doc);
        Ok(Some(doc.clone()))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let mut collections = self.collections.write();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        Ok(docs
            .iter()
            .position(|doc| filter.matches(doc))
            .map(|index| docs.remove(index)))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let mut collections = self.collections.write();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| !filter.matches(doc));
        Ok((before - docs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SortDirection, document::CREATED_AT_FIELD};
    use serde_json::{Value, json};

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamp() {
        let store = MemoryStore::new();
        let stored = store.insert("notes", doc(json!({ "body": "hi" }))).await.unwrap();
        assert!(stored.contains_key(ID_FIELD));
        assert!(stored.contains_key(CREATED_AT_FIELD));
        assert_eq!(store.count("notes", &Filter::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn insert_if_absent_respects_guard() {
        let store = MemoryStore::new();
        let guard = Filter::eq("key", "a");
        let first = store
            .insert_if_absent("k", &guard, doc(json!({ "key": "a" })))
            .await
            .unwrap();
        let second = store
            .insert_if_absent("k", &guard, doc(json!({ "key": "a" })))
            .await
            .unwrap();
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(store.count("k", &Filter::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_ids_conflict() {
        let store = MemoryStore::new();
        store.insert("k", doc(json!({ "_id": "x" }))).await.unwrap();
        let err = store.insert("k", doc(json!({ "_id": "x" }))).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn sorted_window_slices_after_sorting() {
        let store = MemoryStore::new();
        for (id, rank) in [("a", 2), ("b", 3), ("c", 1)] {
            store.insert("r", doc(json!({ "_id": id, "rank": rank }))).await.unwrap();
        }
        let page = store
            .find_sorted(
                "r",
                &Filter::All,
                &SortSpec::new("rank", SortDirection::Ascending),
                Some(Window { skip: 1, limit: 1 }),
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["_id"], json!("a"));
    }

    #[tokio::test]
    async fn update_and_delete_touch_only_first_match() {
        let store = MemoryStore::new();
        store.insert("t", doc(json!({ "_id": "1", "tag": "x" }))).await.unwrap();
        store.insert("t", doc(json!({ "_id": "2", "tag": "x" }))).await.unwrap();

        let updated = store
            .update_one("t", &Filter::eq("tag", "x"), &[UpdateOp::set("seen", true)])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["_id"], json!("1"));

        let removed = store.delete_many("t", &Filter::eq("tag", "x")).await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.delete_one("t", &Filter::All).await.unwrap().is_none());
    }
}
