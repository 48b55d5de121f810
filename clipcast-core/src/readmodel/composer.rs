use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::pagination::{Page, PageRequest};
use super::spec::{Cardinality, DerivedField, JoinSpec, ListingRequest, ListingSpec, Projection};
use crate::error::ErrorKind;
use crate::store::{Document, DocumentStore, StoreError, document::id_value};

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("join on {collection}.{field} matched more than one document for key {key}")]
    AmbiguousJoin {
        collection: String,
        field: String,
        key: String,
    },
    #[error("projection root `{0}` is not a document")]
    InvalidRoot(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ComposeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ComposeError::Store(err) => err.kind(),
            _ => ErrorKind::Internal,
        }
    }
}

type ComposeResult<T> = Result<T, ComposeError>;
type JoinFuture<'a> = Pin<Box<dyn Future<Output = ComposeResult<Vec<Document>>> + Send + 'a>>;

/// Evaluates [`ListingSpec`]s against a document store. Read-only.
#[derive(Clone)]
pub struct ReadModelComposer {
    store: Arc<dyn DocumentStore>,
}

impl fmt::Debug for ReadModelComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadModelComposer").finish_non_exhaustive()
    }
}

impl ReadModelComposer {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Compose one page of a listing.
    ///
    /// When the sort field is a stored field of the base collection and no
    /// join can drop records, sorting and slicing run in the store and only
    /// the page itself is joined.
    pub async fn compose(
        &self,
        spec: &ListingSpec,
        request: &ListingRequest,
    ) -> ComposeResult<Page> {
        let sort = spec.resolve_sort(request.sort.as_ref());
        let caller = request.caller;
        let page = request.page;

        if !spec.prunes() && !spec.is_computed(&sort.field) {
            let total = self.store.count(&spec.collection, &spec.filter).await?;
            let records = self
                .store
                .find_sorted(&spec.collection, &spec.filter, &sort, Some(page.window()))
                .await?;
            debug!(
                collection = %spec.collection,
                total,
                fetched = records.len(),
                "composing pushed-down page"
            );

            let records = self.shape(spec, records, caller).await?;
            let items = project_all(records, &spec.projection)?;
            return Ok(page_of(items, total, page));
        }

        let records = self
            .store
            .find_sorted(&spec.collection, &spec.filter, &sort, None)
            .await?;
        let mut records = self.shape(spec, records, caller).await?;
        records.sort_by(|a, b| sort.compare(a, b));

        let total = records.len() as u64;
        debug!(collection = %spec.collection, total, "composing in-memory page");

        let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let window = records.into_iter().skip(skip).take(limit).collect();
        let items = project_all(window, &spec.projection)?;
        Ok(page_of(items, total, page))
    }

    /// First record of a listing, for single-record views.
    pub async fn compose_one(
        &self,
        spec: &ListingSpec,
        caller: Option<Uuid>,
    ) -> ComposeResult<Option<Document>> {
        let request = ListingRequest::new(PageRequest::single()).for_caller(caller);
        Ok(self.compose(spec, &request).await?.items.into_iter().next())
    }

    /// Joins then derived fields.
    async fn shape(
        &self,
        spec: &ListingSpec,
        records: Vec<Document>,
        caller: Option<Uuid>,
    ) -> ComposeResult<Vec<Document>> {
        let mut records = self.apply_joins(&spec.joins, records).await?;
        let caller = caller.map(id_value);
        for record in &mut records {
            for derived in &spec.derived {
                apply_derived(derived, record, caller.as_ref());
            }
        }
        Ok(records)
    }

    fn apply_joins<'a>(&'a self, joins: &'a [JoinSpec], records: Vec<Document>) -> JoinFuture<'a> {
        Box::pin(async move {
            let mut records = records;
            for join in joins {
                records = self.apply_join(join, records).await?;
            }
            Ok(records)
        })
    }

    async fn apply_join(&self, join: &JoinSpec, records: Vec<Document>) -> ComposeResult<Vec<Document>> {
        if records.is_empty() {
            return Ok(records);
        }

        let mut seen = HashSet::new();
        let keys: Vec<Value> = records
            .iter()
            .flat_map(|record| local_keys(record.get(&join.local_field)))
            .filter(|key| seen.insert(key.to_string()))
            .cloned()
            .collect();

        let mut joined = self
            .store
            .find_by_keys(&join.from, &join.foreign_field, &keys, &join.filter)
            .await?;
        if !join.joins.is_empty() {
            joined = self.apply_joins(&join.joins, joined).await?;
        }

        let mut groups: HashMap<String, Vec<Document>> = HashMap::new();
        for mut doc in joined {
            let Some(key) = doc.get(&join.foreign_field).map(Value::to_string) else {
                continue;
            };
            if let Some(retain) = &join.retain {
                doc.retain(|field, _| {
                    retain.contains(field) || join.joins.iter().any(|nested| &nested.target == field)
                });
            }
            groups.entry(key).or_default().push(doc);
        }

        let mut shaped = Vec::with_capacity(records.len());
        for mut record in records {
            let keys: Vec<String> = local_keys(record.get(&join.local_field))
                .map(Value::to_string)
                .collect();
            let mut matches = keys
                .iter()
                .filter_map(|key| groups.get(key))
                .flatten();

            let value = if join.cardinality.is_to_one() {
                let first = matches.next();
                if matches.next().is_some() {
                    return Err(ComposeError::AmbiguousJoin {
                        collection: join.from.clone(),
                        field: join.foreign_field.clone(),
                        key: keys.join(","),
                    });
                }
                match (first, join.cardinality) {
                    (Some(doc), _) => Value::Object(doc.clone()),
                    (None, Cardinality::ExactlyOne) => continue,
                    (None, _) => Value::Null,
                }
            } else {
                Value::Array(matches.cloned().map(Value::Object).collect())
            };

            record.insert(join.target.clone(), value);
            shaped.push(record);
        }
        Ok(shaped)
    }
}

/// Lookup keys held by a local field: every element of an array, the value
/// itself otherwise. `null` and missing yield nothing.
fn local_keys(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    let values: &[Value] = match value {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => &[],
        Some(single) => std::slice::from_ref(single),
    };
    values.iter().filter(|value| !value.is_null())
}

fn apply_derived(derived: &DerivedField, record: &mut Document, caller: Option<&Value>) {
    match derived {
        DerivedField::Count { field, source } => {
            let count = record
                .get(source)
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            record.insert(field.clone(), Value::from(count as u64));
        }
        DerivedField::ContainsCaller {
            field,
            source,
            member_field,
        } => {
            let contains = caller.is_some_and(|caller| {
                record
                    .get(source)
                    .and_then(Value::as_array)
                    .is_some_and(|items| {
                        items.iter().any(|item| match member_field {
                            Some(member) => item.get(member) == Some(caller),
                            None => item == caller,
                        })
                    })
            });
            record.insert(field.clone(), Value::Bool(contains));
        }
    }
}

fn project(mut record: Document, projection: &Projection) -> ComposeResult<Document> {
    if let Some(root) = &projection.root {
        record = match record.remove(root) {
            Some(Value::Object(doc)) => doc,
            _ => return Err(ComposeError::InvalidRoot(root.clone())),
        };
    }
    if let Some(fields) = &projection.fields {
        record.retain(|field, _| fields.contains(field));
    }
    Ok(record)
}

fn project_all(records: Vec<Document>, projection: &Projection) -> ComposeResult<Vec<Document>> {
    records
        .into_iter()
        .map(|record| project(record, projection))
        .collect()
}

fn page_of(items: Vec<Document>, total: u64, request: PageRequest) -> Page {
    Page {
        items,
        total,
        page: request.page(),
        limit: request.limit(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Filter, MemoryStore, SortDirection, SortSpec};
    use serde_json::json;

    async fn seeded() -> (ReadModelComposer, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let docs = [
            ("users", json!({ "_id": "u1", "handle": "ann", "passwordHash": "x" })),
            ("users", json!({ "_id": "u2", "handle": "bob", "passwordHash": "y" })),
            ("posts", json!({ "_id": "p1", "owner": "u1", "createdAt": "2024-01-01T00:00:00.000000Z", "rank": 3 })),
            ("posts", json!({ "_id": "p2", "owner": "u2", "createdAt": "2024-01-02T00:00:00.000000Z", "rank": 1 })),
            ("posts", json!({ "_id": "p3", "owner": "gone", "createdAt": "2024-01-03T00:00:00.000000Z", "rank": 2 })),
            ("likes", json!({ "_id": "l1", "post": "p1", "likedBy": "u2" })),
            ("likes", json!({ "_id": "l2", "post": "p1", "likedBy": "u1" })),
            ("likes", json!({ "_id": "l3", "post": "p2", "likedBy": "u1" })),
        ];
        for (collection, doc) in docs {
            store
                .insert(collection, doc.as_object().cloned().unwrap())
                .await
                .unwrap();
        }
        (ReadModelComposer::new(store.clone()), store)
    }

    fn posts_with_owner() -> ListingSpec {
        ListingSpec::new("posts")
            .join(JoinSpec::to_one("users", "owner", "_id", "owner").retain(&["_id", "handle"]))
            .join(JoinSpec::many("likes", "_id", "post", "likes").retain(&["likedBy"]))
            .derive(DerivedField::contains_caller("isLiked", "likes", Some("likedBy")))
            .derive(DerivedField::count("likes", "likes"))
            .sortable(&["rank", "likes"])
    }

    #[tokio::test]
    async fn to_one_without_match_is_null_and_secrets_are_dropped() {
        let (composer, _) = seeded().await;
        let page = composer
            .compose(&posts_with_owner(), &ListingRequest::default())
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        let ids: Vec<_> = page.items.iter().map(|p| p["_id"].clone()).collect();
        assert_eq!(ids, vec![json!("p3"), json!("p2"), json!("p1")]);

        assert!(page.items[0].contains_key("owner"));
        assert_eq!(page.items[0]["owner"], Value::Null);
        assert_eq!(page.items[2]["owner"], json!({ "_id": "u1", "handle": "ann" }));
        assert_eq!(page.items[2]["likes"], json!(2));
    }

    #[tokio::test]
    async fn membership_follows_caller() {
        let (composer, store) = seeded().await;
        let viewer = Uuid::now_v7();
        store
            .insert(
                "likes",
                json!({ "post": "p2", "likedBy": viewer.to_string() }).as_object().cloned().unwrap(),
            )
            .await
            .unwrap();

        let as_viewer = composer
            .compose(
                &posts_with_owner(),
                &ListingRequest::default().for_caller(Some(viewer)),
            )
            .await
            .unwrap();
        let liked: Vec<_> = as_viewer.items.iter().map(|p| p["isLiked"].clone()).collect();
        assert_eq!(liked, vec![json!(false), json!(true), json!(false)]);

        let anonymous = composer
            .compose(&posts_with_owner(), &ListingRequest::default())
            .await
            .unwrap();
        assert!(anonymous.items.iter().all(|p| p["isLiked"] == json!(false)));
    }

    #[tokio::test]
    async fn sorting_by_derived_count_runs_after_joins() {
        let (composer, _) = seeded().await;
        let request = ListingRequest::default()
            .with_sort(Some(SortSpec::new("likes", SortDirection::Descending)));
        let page = composer.compose(&posts_with_owner(), &request).await.unwrap();

        let counts: Vec<_> = page.items.iter().map(|p| p["likes"].clone()).collect();
        assert_eq!(counts, vec![json!(2), json!(1), json!(0)]);
    }

    #[tokio::test]
    async fn required_join_prunes_before_counting() {
        let (composer, _) = seeded().await;
        let spec = ListingSpec::new("posts")
            .join(JoinSpec::to_one("users", "owner", "_id", "owner").required())
            .project(Projection::fields(&["_id"]));

        let page = composer
            .compose(&spec, &ListingRequest::new(PageRequest::new(1, 1)))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items, vec![json!({ "_id": "p2" }).as_object().cloned().unwrap()]);
    }

    #[tokio::test]
    async fn root_projection_replaces_record() {
        let (composer, _) = seeded().await;
        let spec = ListingSpec::new("likes")
            .matching(Filter::eq("post", "p1"))
            .join(
                JoinSpec::to_one("users", "likedBy", "_id", "user")
                    .required()
                    .retain(&["_id", "handle"]),
            )
            .project(Projection::all().with_root("user"));

        let page = composer.compose(&spec, &ListingRequest::default()).await.unwrap();
        let handles: Vec<_> = page.items.iter().map(|u| u["handle"].clone()).collect();
        assert_eq!(page.total, 2);
        assert!(handles.contains(&json!("ann")) && handles.contains(&json!("bob")));
        assert!(page.items.iter().all(|u| !u.contains_key("passwordHash")));
    }

    #[tokio::test]
    async fn duplicate_to_one_match_is_ambiguous() {
        let (composer, store) = seeded().await;
        store
            .insert(
                "users",
                json!({ "_id": "u1-copy", "key": "u1" }).as_object().cloned().unwrap(),
            )
            .await
            .unwrap();
        store
            .update_one("users", &Filter::eq("_id", "u1"), &[crate::store::UpdateOp::set("key", "u1")])
            .await
            .unwrap();

        let spec = ListingSpec::new("posts").join(JoinSpec::to_one("users", "owner", "key", "owner"));
        let err = composer
            .compose(&spec, &ListingRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ComposeError::AmbiguousJoin { .. }));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn nested_join_targets_survive_retain() {
        let (composer, _) = seeded().await;
        let spec = ListingSpec::new("likes")
            .matching(Filter::eq("likedBy", "u1"))
            .join(
                JoinSpec::to_one("posts", "post", "_id", "post")
                    .retain(&["_id"])
                    .join(JoinSpec::to_one("users", "owner", "_id", "owner").retain(&["handle"])),
            );

        let page = composer.compose(&spec, &ListingRequest::default()).await.unwrap();
        let owners: Vec<_> = page
            .items
            .iter()
            .map(|like| like["post"]["owner"]["handle"].clone())
            .collect();
        assert_eq!(owners.len(), 2);
        assert!(owners.contains(&json!("ann")) && owners.contains(&json!("bob")));
    }

    #[tokio::test]
    async fn array_local_keys_keep_local_order() {
        let (composer, store) = seeded().await;
        store
            .insert(
                "lists",
                json!({ "_id": "pl", "items": ["p3", "p1", "missing"] }).as_object().cloned().unwrap(),
            )
            .await
            .unwrap();
        let spec = ListingSpec::new("lists")
            .join(JoinSpec::many("posts", "items", "_id", "items").retain(&["_id"]))
            .derive(DerivedField::count("itemCount", "items"));

        let record = composer.compose_one(&spec, None).await.unwrap().unwrap();
        assert_eq!(record["items"], json!([{ "_id": "p3" }, { "_id": "p1" }]));
        assert_eq!(record["itemCount"], json!(2));
    }

    #[tokio::test]
    async fn total_ignores_page_and_limit() {
        let (composer, _) = seeded().await;
        let spec = posts_with_owner();
        for (page, limit) in [(1, 1), (2, 2), (9, 10)] {
            let result = composer
                .compose(&spec, &ListingRequest::new(PageRequest::new(page, limit)))
                .await
                .unwrap();
            assert_eq!(result.total, 3);
        }
    }
}
