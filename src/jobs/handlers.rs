use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Extension, Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateJobRequest, JobDetails, JobListQuery, JobResponse, JobRow},
    repo::Job,
    services,
};
use crate::{
    error::{AppError, AppResult},
    extract::AppJson,
    session::SessionUser,
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/:id", get(get_job))
}

/// Mounted behind `require_session`.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard/jobs", get(dashboard_jobs).post(create_job))
}

fn to_response(job: Job) -> JobResponse {
    JobResponse {
        id: job.id,
        job: job.record,
        created_at: job.created_at,
        updated_at: job.updated_at,
    }
}

#[instrument(skip(state))]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(q): Query<JobListQuery>,
) -> AppResult<Json<Vec<JobResponse>>> {
    let jobs = services::list_public(state.store.as_ref(), &q).await?;
    Ok(Json(jobs.into_iter().map(to_response).collect()))
}

#[instrument(skip(state))]
pub async fn get_job(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<JobDetails>> {
    let job = Job::get(state.store.as_ref(), id)
        .await?
        .ok_or_else(|| AppError::not_found("Job not found."))?;
    Ok(Json(services::to_details(job)))
}

#[instrument(skip(state))]
pub async fn dashboard_jobs(State(state): State<AppState>) -> AppResult<Json<Vec<JobRow>>> {
    let jobs = services::list_all(state.store.as_ref()).await?;
    Ok(Json(jobs.iter().map(services::to_row).collect()))
}

#[instrument(skip(state, user, payload))]
pub async fn create_job(
    State(state): State<AppState>,
    user: Option<Extension<SessionUser>>,
    AppJson(payload): AppJson<CreateJobRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<JobResponse>)> {
    let user = user.map(|Extension(u)| u);
    let job = services::create_job(state.store.as_ref(), user.as_ref(), payload).await?;

    let mut headers = HeaderMap::new();
    let location = HeaderValue::from_str(&format!("/api/v1/jobs/{}", job.id)).map_err(anyhow::Error::from)?;
    headers.insert(header::LOCATION, location);

    Ok((StatusCode::CREATED, headers, Json(to_response(job))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::build_app,
        auth::{jwt::JwtKeys, password::hash_password, repo::{User, UserRecord}},
        store::MemoryStore,
    };
    use axum::{body::Body, extract::FromRef, http::Request};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn signed_in(state: &AppState) -> String {
        let user = User::create(
            state.store.as_ref(),
            UserRecord {
                email: "hr@example.com".into(),
                display_name: Some("HR Team".into()),
                password_hash: Some(hash_password("secret-pw").unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        JwtKeys::from_ref(state).sign_access(user.id, 0).unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_job(token: &str, body: Value) -> Request<Body> {
        Request::post("/api/v1/dashboard/jobs")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn post_then_read_back() {
        let state = AppState::fake();
        let token = signed_in(&state).await;
        let app = build_app(state);

        let (status, headers, created) = send(
            &app,
            post_job(
                &token,
                json!({
                    "title": "Rust Engineer",
                    "category": "Engineering",
                    "job_type": "Full-time",
                    "description": "Write *safe* code.",
                    "salary": 95000,
                    "skills": "Rust, Tokio"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(headers[header::LOCATION], format!("/api/v1/jobs/{id}"));

        let (status, _, details) = send(
            &app,
            Request::get(format!("/api/v1/jobs/{id}")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(details["title"], "Rust Engineer");
        assert_eq!(details["salary_display"], "$95,000");
        assert_eq!(details["skills_list"], json!(["Rust", "Tokio"]));

        let (_, _, rows) = send(
            &app,
            Request::get("/api/v1/dashboard/jobs")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["deadline_on"], "—");
    }

    #[tokio::test]
    async fn incomplete_post_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::fake_with(store.clone());
        let token = signed_in(&state).await;
        let before = store.writes();
        let app = build_app(state);

        let (status, _, body) = send(&app, post_job(&token, json!({"title": "Only a title"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please fill in all required fields.");
        assert_eq!(store.writes(), before);
    }

    #[tokio::test]
    async fn malformed_body_is_inline_error() {
        let state = AppState::fake();
        let token = signed_in(&state).await;
        let app = build_app(state);

        let req = Request::post("/api/v1/dashboard/jobs")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, headers, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(body["error"], "Request body is not valid JSON.");
    }

    #[tokio::test]
    async fn unknown_job_is_404() {
        let app = build_app(AppState::fake());
        let (status, _, body) = send(
            &app,
            Request::get(format!("/api/v1/jobs/{}", Uuid::new_v4())).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Job not found.");
    }
}
