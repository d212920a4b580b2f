//! Document store: named collections of JSON documents.
//!
//! Queries are limited to what listing pages need: equality filters on
//! top-level fields, newest-first ordering and a row limit.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub collection: String,
    pub data: Value,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Document {
    /// Decode the body into a typed record. Missing fields fall back to the
    /// record's serde defaults.
    pub fn decode<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| anyhow::anyhow!("decode {}/{}: {}", self.collection, self.id, e))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    NewestFirst,
}

#[derive(Debug, Clone)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<(String, Value)>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(name: &str) -> Self {
        Self {
            collection: name.to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order = Some(Order::NewestFirst);
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, collection: &str, data: Value) -> anyhow::Result<Document>;
    async fn get(&self, collection: &str, id: Uuid) -> anyhow::Result<Option<Document>>;
    async fn find(&self, query: Query) -> anyhow::Result<Vec<Document>>;
    /// Replace the body of an existing document and bump `updated_at`.
    async fn update(&self, collection: &str, id: Uuid, data: Value) -> anyhow::Result<Document>;
}

/// Serialize a record into a document body.
pub fn to_body<T: Serialize>(record: &T) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(record)?)
}
