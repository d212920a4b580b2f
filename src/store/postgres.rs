use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Document, DocumentStore, Order, Query};

/// Documents stored as JSONB rows in a single `documents` table.
#[derive(Clone)]
pub struct PgDocumentStore {
    db: PgPool,
}

impl PgDocumentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    collection: String,
    data: Json<Value>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<DocumentRow> for Document {
    fn from(r: DocumentRow) -> Self {
        Self {
            id: r.id,
            collection: r.collection,
            data: r.data.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Postgres `LIMIT` is a BIGINT; larger requests saturate instead of wrapping.
fn row_limit(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Build the select for a query. Equality uses JSONB containment so strings,
/// numbers and booleans compare by value.
fn select_for(query: &Query) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT id, collection, data, created_at, updated_at FROM documents WHERE collection = ",
    );
    qb.push_bind(&query.collection);
    for (field, value) in &query.filters {
        let mut fragment = Map::new();
        fragment.insert(field.clone(), value.clone());
        qb.push(" AND data @> ");
        qb.push_bind(Json(Value::Object(fragment)));
    }
    if query.order == Some(Order::NewestFirst) {
        qb.push(" ORDER BY created_at DESC");
    }
    if let Some(n) = query.limit {
        qb.push(" LIMIT ");
        qb.push_bind(row_limit(n));
    }
    qb
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create(&self, collection: &str, data: Value) -> anyhow::Result<Document> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (id, collection, data)
            VALUES ($1, $2, $3)
            RETURNING id, collection, data, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(collection)
        .bind(Json(data))
        .fetch_one(&self.db)
        .await
        .with_context(|| format!("insert into {}", collection))?;
        Ok(row.into())
    }

    async fn get(&self, collection: &str, id: Uuid) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, collection, data, created_at, updated_at
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("get {}/{}", collection, id))?;
        Ok(row.map(Into::into))
    }

    async fn find(&self, query: Query) -> anyhow::Result<Vec<Document>> {
        let mut qb = select_for(&query);
        let rows = qb
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.db)
            .await
            .with_context(|| format!("query {}", query.collection))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, collection: &str, id: Uuid, data: Value) -> anyhow::Result<Document> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            UPDATE documents
            SET data = $3, updated_at = now()
            WHERE collection = $1 AND id = $2
            RETURNING id, collection, data, created_at, updated_at
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(data))
        .fetch_one(&self.db)
        .await
        .with_context(|| format!("update {}/{}", collection, id))?;
        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_sql_for_filtered_listing() {
        let q = Query::collection("blogs")
            .where_eq("category", "rust")
            .where_eq("featured", true)
            .newest_first()
            .limit(3);
        let qb = select_for(&q);
        assert_eq!(
            qb.sql(),
            "SELECT id, collection, data, created_at, updated_at FROM documents \
             WHERE collection = $1 AND data @> $2 AND data @> $3 ORDER BY created_at DESC LIMIT $4"
        );
    }

    #[test]
    fn select_sql_without_options() {
        let q = Query::collection("jobs");
        assert!(select_for(&q).sql().ends_with("WHERE collection = $1"));
    }

    #[test]
    fn oversized_limit_saturates() {
        assert_eq!(row_limit(25), 25);
        assert_eq!(row_limit(usize::MAX), i64::MAX);
        let q = Query::collection("jobs").limit(usize::MAX);
        assert!(select_for(&q).sql().ends_with("LIMIT $2"));
    }
}
