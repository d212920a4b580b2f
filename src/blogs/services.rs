use tracing::{info, warn};

use super::{
    dto::{BlogCard, BlogIndex, BlogPage, BlogResponse, CreateBlogRequest},
    repo::{Author, Blog, BlogRecord, BLOGS},
};
use crate::{
    content::{dedupe_tags, format_date, preview, render_markdown, slugify},
    error::{AppError, AppResult},
    session::SessionUser,
    store::{DocumentStore, Query},
};

const LATEST: usize = 3;
const EXTRAS: usize = 3;

pub fn validate(req: &CreateBlogRequest) -> AppResult<()> {
    if req.title.trim().is_empty() || req.content.trim().is_empty() {
        return Err(AppError::validation("Please fill in all required fields."));
    }
    Ok(())
}

fn slug_for(req: &CreateBlogRequest) -> String {
    let supplied = req.slug.as_deref().map(slugify).unwrap_or_default();
    if supplied.is_empty() {
        slugify(&req.title)
    } else {
        supplied
    }
}

pub async fn create_blog(
    store: &dyn DocumentStore,
    user: Option<&SessionUser>,
    req: CreateBlogRequest,
) -> AppResult<Blog> {
    validate(&req)?;
    let user = user.ok_or_else(|| AppError::unauthenticated("You must be logged in to create a post."))?;

    let record = BlogRecord {
        slug: slug_for(&req),
        title: req.title.trim().to_string(),
        category: req.category.trim().to_string(),
        content: req.content,
        tags: dedupe_tags(&req.tags),
        created_by: Some(Author::from(user)),
        featured: req.featured,
    };
    let blog = Blog::insert(store, &record).await?;
    info!(id = %blog.id, slug = %blog.record.slug, user_id = %user.uid, "blog posted");
    Ok(blog)
}

pub fn to_response(blog: Blog) -> BlogResponse {
    BlogResponse {
        id: blog.id,
        blog: blog.record,
        created_at: blog.created_at,
        updated_at: blog.updated_at,
    }
}

pub fn to_card(blog: &Blog) -> BlogCard {
    let r = &blog.record;
    BlogCard {
        id: blog.id,
        title: r.title.clone(),
        slug: r.slug.clone(),
        category: r.category.clone(),
        tags: r.tags.clone(),
        author: r.created_by.clone(),
        featured: r.featured,
        date: format_date(blog.created_at),
        preview: preview(&r.content),
    }
}

/// Split a newest-first listing into the index sections. A featured post
/// shows up under `featured` and, when recent enough, under `latest` too.
pub fn partition(blogs: &[Blog]) -> BlogIndex {
    let latest: Vec<BlogCard> = blogs.iter().take(LATEST).map(to_card).collect();
    let featured = blogs.iter().filter(|b| b.record.featured).map(to_card).collect();
    let others = blogs
        .iter()
        .skip(LATEST)
        .filter(|b| !b.record.featured)
        .map(to_card)
        .collect();
    BlogIndex { featured, latest, others }
}

pub async fn index(store: &dyn DocumentStore) -> AppResult<BlogIndex> {
    let blogs = Blog::list(store, Query::collection(BLOGS).newest_first()).await?;
    Ok(partition(&blogs))
}

pub async fn list_all(store: &dyn DocumentStore) -> AppResult<Vec<Blog>> {
    Ok(Blog::list(store, Query::collection(BLOGS).newest_first()).await?)
}

pub async fn find(store: &dyn DocumentStore, slug: &str) -> AppResult<Blog> {
    Blog::find_by_slug(store, slug)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found."))
}

/// Sidebar lists are best effort: a failed query is logged and left empty.
/// Posts sharing the `skip` slug are left out.
async fn extras(store: &dyn DocumentStore, what: &str, query: Query, skip: Option<&str>, max: usize) -> Vec<BlogCard> {
    match Blog::list(store, query).await {
        Ok(blogs) => blogs
            .iter()
            .filter(|b| skip != Some(b.record.slug.as_str()))
            .take(max)
            .map(to_card)
            .collect(),
        Err(e) => {
            warn!(error = %e, list = what, "failed to load blog extras");
            Vec::new()
        }
    }
}

pub async fn page(store: &dyn DocumentStore, slug: &str) -> AppResult<BlogPage> {
    let blog = find(store, slug).await?;

    // Over-fetch so the post itself can be dropped and still fill the list.
    let related_q = Query::collection(BLOGS)
        .where_eq("category", blog.record.category.as_str())
        .newest_first()
        .limit(EXTRAS + 1);
    let related = extras(store, "related", related_q, Some(blog.record.slug.as_str()), EXTRAS).await;
    let latest = extras(
        store,
        "latest",
        Query::collection(BLOGS).newest_first().limit(LATEST),
        None,
        LATEST,
    )
    .await;
    let featured = extras(
        store,
        "featured",
        Query::collection(BLOGS).where_eq("featured", true).newest_first().limit(EXTRAS),
        None,
        EXTRAS,
    )
    .await;

    Ok(BlogPage {
        date: format_date(blog.created_at),
        content_html: render_markdown(&blog.record.content),
        post: to_response(blog),
        related,
        latest,
        featured,
    })
}
