use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    session::SessionUser,
    store::{to_body, Document, DocumentStore, Query},
};

pub const BLOGS: &str = "blogs";

/// Author snapshot taken at write time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Author {
    pub uid: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

impl From<&SessionUser> for Author {
    fn from(user: &SessionUser) -> Self {
        Author {
            uid: Some(user.uid),
            name: user.name_or_anonymous().to_string(),
            email: user.email.clone(),
            photo_url: user.photo_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlogRecord {
    pub title: String,
    pub slug: String,
    pub category: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_by: Option<Author>,
    pub featured: bool,
}

#[derive(Debug, Clone)]
pub struct Blog {
    pub id: Uuid,
    pub record: BlogRecord,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Blog {
    fn from_doc(doc: &Document) -> anyhow::Result<Blog> {
        Ok(Blog {
            id: doc.id,
            record: doc.decode()?,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }

    pub async fn insert(store: &dyn DocumentStore, record: &BlogRecord) -> anyhow::Result<Blog> {
        let doc = store.create(BLOGS, to_body(record)?).await?;
        Blog::from_doc(&doc)
    }

    /// Newest post carrying `slug`; slugs are unique by convention only.
    pub async fn find_by_slug(store: &dyn DocumentStore, slug: &str) -> anyhow::Result<Option<Blog>> {
        let query = Query::collection(BLOGS).where_eq("slug", slug).newest_first().limit(1);
        store.find(query).await?.first().map(Blog::from_doc).transpose()
    }

    pub async fn list(store: &dyn DocumentStore, query: Query) -> anyhow::Result<Vec<Blog>> {
        let docs = store.find(query).await?;
        Ok(docs
            .iter()
            .filter_map(|d| match Blog::from_doc(d) {
                Ok(blog) => Some(blog),
                Err(e) => {
                    tracing::warn!(error = %e, id = %d.id, "skipping malformed blog");
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn record(title: &str, slug: &str) -> BlogRecord {
        BlogRecord {
            title: title.into(),
            slug: slug.into(),
            content: "body".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn duplicate_slugs_resolve_to_newest() {
        let store = MemoryStore::new();
        Blog::insert(&store, &record("First", "same")).await.unwrap();
        let second = Blog::insert(&store, &record("Second", "same")).await.unwrap();

        let found = Blog::find_by_slug(&store, "same").await.unwrap().unwrap();
        assert_eq!(found.id, second.id);
        assert!(Blog::find_by_slug(&store, "missing").await.unwrap().is_none());
    }

    #[test]
    fn author_falls_back_to_anonymous() {
        let user = SessionUser {
            uid: Uuid::new_v4(),
            email: "a@b.c".into(),
            display_name: None,
            photo_url: None,
        };
        assert_eq!(Author::from(&user).name, "Anonymous");
    }
}
