use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{Author, BlogRecord};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateBlogRequest {
    pub title: String,
    pub slug: Option<String>,
    pub category: String,
    pub content: String,
    pub tags: Vec<String>,
    pub featured: bool,
}

#[derive(Debug, Serialize)]
pub struct BlogResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub blog: BlogRecord,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Listing card.
#[derive(Debug, Clone, Serialize)]
pub struct BlogCard {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author: Option<Author>,
    pub featured: bool,
    pub date: String,
    pub preview: String,
}

#[derive(Debug, Default, Serialize)]
pub struct BlogIndex {
    pub featured: Vec<BlogCard>,
    pub latest: Vec<BlogCard>,
    pub others: Vec<BlogCard>,
}

#[derive(Debug, Serialize)]
pub struct BlogPage {
    pub post: BlogResponse,
    pub date: String,
    pub content_html: String,
    pub related: Vec<BlogCard>,
    pub latest: Vec<BlogCard>,
    pub featured: Vec<BlogCard>,
}
