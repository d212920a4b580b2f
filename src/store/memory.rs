use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Document, DocumentStore, Order, Query};

/// Process-local store. Documents keep insertion order; `writes` counts every
/// create and update so callers can assert that nothing was written.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<Vec<Document>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }
}

fn matches(doc: &Document, query: &Query) -> bool {
    doc.collection == query.collection
        && query
            .filters
            .iter()
            .all(|(field, value)| doc.data.get(field) == Some(value))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, data: Value) -> anyhow::Result<Document> {
        anyhow::ensure!(data.is_object(), "document body must be an object");
        let now = OffsetDateTime::now_utc();
        let doc = Document {
            id: Uuid::new_v4(),
            collection: collection.to_string(),
            data,
            created_at: now,
            updated_at: now,
        };
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        self.docs.write().await.push(doc.clone());
        Ok(doc)
    }

    async fn get(&self, collection: &str, id: Uuid) -> anyhow::Result<Option<Document>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .find(|d| d.id == id && d.collection == collection)
            .cloned())
    }

    async fn find(&self, query: Query) -> anyhow::Result<Vec<Document>> {
        let docs = self.docs.read().await;
        let mut out: Vec<Document> = docs.iter().filter(|d| matches(d, &query)).cloned().collect();
        if query.order == Some(Order::NewestFirst) {
            // stable sort plus reverse keeps later inserts first on equal timestamps
            out.reverse();
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        if let Some(n) = query.limit {
            out.truncate(n);
        }
        Ok(out)
    }

    async fn update(&self, collection: &str, id: Uuid, data: Value) -> anyhow::Result<Document> {
        anyhow::ensure!(data.is_object(), "document body must be an object");
        let mut docs = self.docs.write().await;
        let doc = docs
            .iter_mut()
            .find(|d| d.id == id && d.collection == collection)
            .ok_or_else(|| anyhow::anyhow!("document {}/{} not found", collection, id))?;
        doc.data = data;
        doc.updated_at = OffsetDateTime::now_utc();
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(doc.clone())
    }
}
