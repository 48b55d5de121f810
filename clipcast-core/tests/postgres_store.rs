//! PostgreSQL document store behaviour. Requires `DATABASE_URL` and the
//! `postgres-tests` feature.
#![cfg(feature = "postgres-tests")]

use std::sync::Arc;

use anyhow::Result;
use clipcast_core::{
    accounts::{Account, DocumentIdentityStore, IdentityStore, NewAccount},
    catalog,
    readmodel::{ListingRequest, PageRequest, ReadModelComposer},
    store::{
        Document, DocumentStore, Filter, PostgresDocumentStore, SortSpec, StoreError, UpdateOp,
        Window, collections,
    },
};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn registration(handle: &str) -> NewAccount {
    NewAccount {
        display_name: handle.to_uppercase(),
        email: format!("{handle}@example.com"),
        handle: handle.into(),
        password: "unused".into(),
        avatar: "https://cdn.example/a.png".into(),
        cover: None,
    }
}

#[sqlx::test(migrator = "clipcast_core::MIGRATOR")]
async fn filters_match_the_memory_semantics(pool: PgPool) -> Result<()> {
    let store = PostgresDocumentStore::from_pool(pool);
    store
        .insert("posts", doc(json!({ "tag": "a", "rank": 1, "parent": null })))
        .await?;
    store
        .insert("posts", doc(json!({ "tag": "b", "rank": 2 })))
        .await?;
    store
        .insert("posts", doc(json!({ "tag": "c", "rank": 3, "parent": "x" })))
        .await?;

    assert_eq!(store.count("posts", &Filter::eq("parent", Value::Null)).await?, 2);
    assert_eq!(store.count("posts", &Filter::exists("parent")).await?, 1);
    assert_eq!(
        store
            .count("posts", &Filter::any_of("tag", vec![json!("a"), json!("c")]))
            .await?,
        2
    );
    assert_eq!(store.count("posts", &Filter::any_of("tag", Vec::new())).await?, 0);
    assert_eq!(store.count("other", &Filter::All).await?, 0);
    Ok(())
}

#[sqlx::test(migrator = "clipcast_core::MIGRATOR")]
async fn sorted_windows_page_in_the_database(pool: PgPool) -> Result<()> {
    let store = PostgresDocumentStore::from_pool(pool);
    for minute in 1..=5 {
        store
            .insert(
                "posts",
                doc(json!({ "createdAt": format!("2024-01-01T00:0{minute}:00.000000Z") })),
            )
            .await?;
    }

    let page = store
        .find_sorted(
            "posts",
            &Filter::All,
            &SortSpec::newest_first(),
            Some(Window { skip: 1, limit: 2 }),
        )
        .await?;
    let stamps: Vec<&str> = page
        .iter()
        .filter_map(|d| d.get("createdAt").and_then(Value::as_str))
        .collect();
    assert_eq!(
        stamps,
        ["2024-01-01T00:04:00.000000Z", "2024-01-01T00:03:00.000000Z"]
    );
    Ok(())
}

#[sqlx::test(migrator = "clipcast_core::MIGRATOR")]
async fn updates_apply_atomically(pool: PgPool) -> Result<()> {
    let store = PostgresDocumentStore::from_pool(pool);
    let id = Uuid::now_v7();
    store
        .insert(
            "posts",
            doc(json!({ "_id": id.to_string(), "views": 0, "tags": [] })),
        )
        .await?;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = PostgresDocumentStore::from_pool(store.pool().clone());
            tokio::spawn(async move {
                store
                    .update_one(
                        "posts",
                        &Filter::by_id(id),
                        &[UpdateOp::Increment("views".into(), 1)],
                    )
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await??;
    }

    let updated = store
        .update_one(
            "posts",
            &Filter::by_id(id),
            &[UpdateOp::AddToSet("tags".into(), json!("x"))],
        )
        .await?
        .expect("document");
    assert_eq!(updated["views"], json!(8));
    assert_eq!(updated["tags"], json!(["x"]));
    Ok(())
}

#[sqlx::test(migrator = "clipcast_core::MIGRATOR")]
async fn duplicate_account_identifiers_conflict(pool: PgPool) -> Result<()> {
    let identity = DocumentIdentityStore::new(Arc::new(PostgresDocumentStore::from_pool(pool)));
    identity
        .create(Account::new(&registration("ann"), "hash".into()))
        .await?;

    let err = identity
        .create(Account::new(&registration("ann"), "hash".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    Ok(())
}

#[sqlx::test(migrator = "clipcast_core::MIGRATOR")]
async fn composed_listing_matches_memory_listing(pool: PgPool) -> Result<()> {
    let store = Arc::new(PostgresDocumentStore::from_pool(pool));
    let identity = DocumentIdentityStore::new(store.clone());
    let author = identity
        .create(Account::new(&registration("maker"), "hash".into()))
        .await?;
    let video = Uuid::now_v7();
    store
        .insert(
            collections::VIDEOS,
            doc(json!({ "_id": video.to_string(), "owner": author.id.to_string() })),
        )
        .await?;
    for minute in 1..=3 {
        store
            .insert(
                collections::COMMENTS,
                doc(json!({
                    "video": video.to_string(),
                    "owner": author.id.to_string(),
                    "content": format!("comment {minute}"),
                    "createdAt": format!("2024-01-03T00:0{minute}:00.000000Z")
                })),
            )
            .await?;
    }

    let composer = ReadModelComposer::new(store);
    let page = composer
        .compose(
            &catalog::video_comments(video),
            &ListingRequest::new(PageRequest::new(2, 1)),
        )
        .await?;
    assert_eq!(page.total, 3);
    assert_eq!(page.items[0]["content"], json!("comment 2"));
    assert_eq!(page.items[0]["owner"]["handle"], json!("maker"));
    assert!(page.items[0]["owner"].get("passwordHash").is_none());
    Ok(())
}
