use std::fmt;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    PgPool, Postgres, QueryBuilder, Row,
    postgres::{PgPoolOptions, PgRow},
    types::Json,
};
use tracing::info;

use super::{
    Document, DocumentStore, Filter, SortDirection, SortSpec, StoreError, StoreResult, UpdateOp,
    Window,
    document::{ID_FIELD, type_name},
    prepare_insert,
};

/// Document store backed by a single PostgreSQL JSONB table.
///
/// Filters, sorting and windows are translated to SQL. Read-modify-write
/// updates lock the target row, insert-if-absent serialises writers of the
/// same collection through a transaction-scoped advisory lock.
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl fmt::Debug for PostgresDocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDocumentStore")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

impl PostgresDocumentStore {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .max_lifetime(Duration::from_secs(1800))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(url)
            .await
            .context("database connection failed")?;

        info!(max_connections, "database pool initialized");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded migrations.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        crate::MIGRATOR
            .run(&self.pool)
            .await
            .context("migration failed")?;
        Ok(())
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    match filter {
        Filter::All => {
            qb.push("TRUE");
        }
        Filter::Eq(field, Value::Null) => {
            qb.push("COALESCE(body -> ");
            qb.push_bind(field.clone());
            qb.push("::text, 'null'::jsonb) = 'null'::jsonb");
        }
        Filter::Eq(field, value) => {
            qb.push("body -> ");
            qb.push_bind(field.clone());
            qb.push("::text = ");
            qb.push_bind(Json(value.clone()));
        }
        Filter::Exists(field) => {
            qb.push("COALESCE(jsonb_typeof(body -> ");
            qb.push_bind(field.clone());
            qb.push("::text), 'null') <> 'null'");
        }
        Filter::In(_, values) if values.is_empty() => {
            qb.push("FALSE");
        }
        Filter::In(field, values) => {
            let values: Vec<Json<Value>> = values.iter().cloned().map(Json).collect();
            qb.push("body -> ");
            qb.push_bind(field.clone());
            qb.push("::text = ANY(");
            qb.push_bind(values);
            qb.push("::jsonb[])");
        }
        Filter::And(filters) => push_group(qb, filters, " AND ", "TRUE"),
        Filter::Or(filters) => push_group(qb, filters, " OR ", "FALSE"),
    }
}

fn push_group(
    qb: &mut QueryBuilder<'_, Postgres>,
    filters: &[Filter],
    separator: &str,
    empty: &str,
) {
    if filters.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (index, filter) in filters.iter().enumerate() {
        if index > 0 {
            qb.push(separator);
        }
        push_filter(qb, filter);
    }
    qb.push(")");
}

/// `<prefix> WHERE collection = $n AND <filter>`
fn scoped<'a>(prefix: &str, collection: &str, filter: &Filter) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(prefix);
    qb.push(" WHERE collection = ");
    qb.push_bind(collection.to_string());
    qb.push(" AND ");
    push_filter(&mut qb, filter);
    qb
}

fn push_sort(qb: &mut QueryBuilder<'_, Postgres>, sort: &SortSpec) {
    let direction = match sort.direction {
        SortDirection::Ascending => "ASC NULLS FIRST",
        SortDirection::Descending => "DESC NULLS LAST",
    };
    qb.push(" ORDER BY body -> ");
    qb.push_bind(sort.field.clone());
    qb.push("::text ");
    qb.push(direction);
    qb.push(", id ");
    qb.push(direction);
}

fn body_of(row: &PgRow) -> StoreResult<Document> {
    let Json(body): Json<Value> = row.try_get("body")?;
    match body {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::Shape(format!(
            "stored body is {}, expected an object",
            type_name(&other)
        ))),
    }
}

fn id_of(doc: &Document) -> StoreResult<String> {
    doc.get(ID_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::Shape(format!("{ID_FIELD} must be a string")))
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<Document> {
        let doc = prepare_insert(doc);
        let id = id_of(&doc)?;
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(Json(&doc))
            .execute(&self.pool)
            .await?;
        Ok(doc)
    }

    async fn insert_if_absent(
        &self,
        collection: &str,
        guard: &Filter,
        doc: Document,
    ) -> StoreResult<Option<Document>> {
        let doc = prepare_insert(doc);
        let id = id_of(&doc)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(collection)
            .execute(&mut *tx)
            .await?;

        let mut probe = scoped("SELECT 1 FROM documents", collection, guard);
        probe.push(" LIMIT 1");
        if probe.build().fetch_optional(&mut *tx).await?.is_some() {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(Json(&doc))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(doc))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let mut qb = scoped("SELECT body FROM documents", collection, filter);
        qb.push(" ORDER BY created_at, id");
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(body_of).collect()
    }

    async fn find_sorted(
        &self,
        collection: &str,
        filter: &Filter,
        sort: &SortSpec,
        window: Option<Window>,
    ) -> StoreResult<Vec<Document>> {
        let mut qb = scoped("SELECT body FROM documents", collection, filter);
        push_sort(&mut qb, sort);
        if let Some(Window { skip, limit }) = window {
            qb.push(" LIMIT ");
            qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
            qb.push(" OFFSET ");
            qb.push_bind(i64::try_from(skip).unwrap_or(i64::MAX));
        }
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(body_of).collect()
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let mut qb = scoped("SELECT body FROM documents", collection, filter);
        qb.push(" ORDER BY created_at, id LIMIT 1");
        let row = qb.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(body_of).transpose()
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let mut qb = scoped("SELECT COUNT(*) AS total FROM documents", collection, filter);
        let row = qb.build().fetch_one(&self.pool).await?;
        let total: i64 = row.try_get("total")?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        ops: &[UpdateOp],
    ) -> StoreResult<Option<Document>> {
        let mut tx = self.pool.begin().await?;

        let mut select = scoped("SELECT body FROM documents", collection, filter);
        select.push(" ORDER BY created_at, id LIMIT 1 FOR UPDATE");
        let Some(row) = select.build().fetch_optional(&mut *tx).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        let mut doc = body_of(&row)?;
        UpdateOp::apply_all(ops, &mut doc);
        let id = id_of(&doc)?;

        sqlx::query("UPDATE documents SET body = $1 WHERE collection = $2 AND id = $3")
            .bind(Json(&doc))
            .bind(collection)
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(doc))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let mut qb = QueryBuilder::new("DELETE FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());
        qb.push(" AND id = (SELECT id FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());
        qb.push(" AND ");
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at, id LIMIT 1 FOR UPDATE) RETURNING body");
        let row = qb.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(body_of).transpose()
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let mut qb = scoped("DELETE FROM documents", collection, filter);
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
