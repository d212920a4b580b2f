use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Extension, Json, Router,
};
use tracing::instrument;

use super::{
    dto::{BlogCard, BlogIndex, BlogPage, BlogResponse, CreateBlogRequest},
    services,
};
use crate::{error::AppResult, extract::AppJson, session::SessionUser, state::AppState};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(blog_index))
        .route("/blogs/:slug", get(blog_page))
}

/// Mounted behind `require_session`.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/blogs", get(dashboard_blogs).post(create_blog))
        .route("/dashboard/blogs/:slug", get(dashboard_blog))
}

#[instrument(skip(state))]
pub async fn blog_index(State(state): State<AppState>) -> AppResult<Json<BlogIndex>> {
    Ok(Json(services::index(state.store.as_ref()).await?))
}

#[instrument(skip(state))]
pub async fn blog_page(State(state): State<AppState>, Path(slug): Path<String>) -> AppResult<Json<BlogPage>> {
    Ok(Json(services::page(state.store.as_ref(), &slug).await?))
}

#[instrument(skip(state))]
pub async fn dashboard_blogs(State(state): State<AppState>) -> AppResult<Json<Vec<BlogCard>>> {
    let blogs = services::list_all(state.store.as_ref()).await?;
    Ok(Json(blogs.iter().map(services::to_card).collect()))
}

#[instrument(skip(state))]
pub async fn dashboard_blog(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<BlogResponse>> {
    let blog = services::find(state.store.as_ref(), &slug).await?;
    Ok(Json(services::to_response(blog)))
}

#[instrument(skip(state, user, payload))]
pub async fn create_blog(
    State(state): State<AppState>,
    user: Option<Extension<SessionUser>>,
    AppJson(payload): AppJson<CreateBlogRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<BlogResponse>)> {
    let user = user.map(|Extension(u)| u);
    let blog = services::create_blog(state.store.as_ref(), user.as_ref(), payload).await?;

    let mut headers = HeaderMap::new();
    let location =
        HeaderValue::from_str(&format!("/api/v1/blogs/{}", blog.record.slug)).map_err(anyhow::Error::from)?;
    headers.insert(header::LOCATION, location);

    Ok((StatusCode::CREATED, headers, Json(services::to_response(blog))))
}
