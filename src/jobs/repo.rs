use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::{to_body, Document, DocumentStore, Query};

pub const JOBS: &str = "jobs";

fn default_positions() -> u32 {
    1
}

fn default_status() -> String {
    "Open".into()
}

/// Stored job body. Every field has a default so older or hand-edited
/// documents still decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobRecord {
    pub job_id: String,
    pub title: String,
    pub company_description: String,
    pub category: String,
    pub subcategory: String,
    pub level: String,
    pub job_type: String,
    pub positions: u32,
    pub post_date: String,
    pub experience: String,
    pub education_level: String,
    pub description: String,
    pub responsibilities: String,
    pub qualifications: String,
    pub skills: String,
    pub salary: f64,
    pub location: String,
    pub deadline: Option<String>,
    pub status: String,
    pub how_to_apply: String,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    pub created_by: Option<Uuid>,
}

impl Default for JobRecord {
    fn default() -> Self {
        Self {
            job_id: String::new(),
            title: String::new(),
            company_description: String::new(),
            category: String::new(),
            subcategory: String::new(),
            level: String::new(),
            job_type: String::new(),
            positions: default_positions(),
            post_date: String::new(),
            experience: String::new(),
            education_level: String::new(),
            description: String::new(),
            responsibilities: String::new(),
            qualifications: String::new(),
            skills: String::new(),
            salary: 0.0,
            location: String::new(),
            deadline: None,
            status: default_status(),
            how_to_apply: String::new(),
            tags: Vec::new(),
            keywords: Vec::new(),
            created_by: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub record: JobRecord,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Job {
    fn from_doc(doc: &Document) -> anyhow::Result<Job> {
        Ok(Job {
            id: doc.id,
            record: doc.decode()?,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }

    /// Decode a listing, dropping documents that are not job-shaped.
    fn from_docs(docs: Vec<Document>) -> Vec<Job> {
        docs.iter()
            .filter_map(|d| match Job::from_doc(d) {
                Ok(job) => Some(job),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed job");
                    None
                }
            })
            .collect()
    }

    pub async fn insert(store: &dyn DocumentStore, record: &JobRecord) -> anyhow::Result<Job> {
        let doc = store.create(JOBS, to_body(record)?).await?;
        Job::from_doc(&doc)
    }

    pub async fn get(store: &dyn DocumentStore, id: Uuid) -> anyhow::Result<Option<Job>> {
        store.get(JOBS, id).await?.as_ref().map(Job::from_doc).transpose()
    }

    pub async fn list(store: &dyn DocumentStore, query: Query) -> anyhow::Result<Vec<Job>> {
        Ok(Job::from_docs(store.find(query).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sparse_documents_decode_with_defaults() {
        let record: JobRecord = serde_json::from_value(json!({"title": "Rustacean"})).unwrap();
        assert_eq!(record.title, "Rustacean");
        assert_eq!(record.positions, 1);
        assert_eq!(record.status, "Open");
        assert!(record.tags.is_empty());
    }

    #[test]
    fn wrongly_typed_fields_are_skipped_in_listings() {
        let now = OffsetDateTime::now_utc();
        let doc = |data| Document {
            id: Uuid::new_v4(),
            collection: JOBS.into(),
            data,
            created_at: now,
            updated_at: now,
        };
        let jobs = Job::from_docs(vec![doc(json!({"title": "ok"})), doc(json!({"salary": "lots"}))]);
        assert_eq!(jobs.len(), 1);
    }
}
