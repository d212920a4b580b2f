use rand::{distributions::Uniform, Rng};
use time::OffsetDateTime;
use tracing::{debug, info};

use super::{
    dto::{CreateJobRequest, JobDetails, JobListQuery, JobRow},
    repo::{Job, JobRecord, JOBS},
};
use crate::{
    catalog::subcategories_of,
    content::{
        dedupe_tags, format_date, format_iso_day, format_salary, iso_day, render_markdown,
        split_skills,
    },
    error::{AppError, AppResult},
    session::SessionUser,
    store::{DocumentStore, Query},
};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `job_<unix millis>_<5 base36 chars>`.
pub fn new_job_id(now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let dist = Uniform::from(0..BASE36.len());
    let suffix: String = rand::thread_rng()
        .sample_iter(dist)
        .take(5)
        .map(|i| BASE36[i] as char)
        .collect();
    format!("job_{}_{}", millis, suffix)
}

pub fn validate(req: &CreateJobRequest) -> AppResult<()> {
    let required = [&req.title, &req.category, &req.job_type, &req.description];
    if required.iter().any(|f| f.trim().is_empty()) {
        return Err(AppError::validation("Please fill in all required fields."));
    }
    Ok(())
}

fn record_from(req: CreateJobRequest, user: &SessionUser, now: OffsetDateTime) -> JobRecord {
    let subcategory = req.subcategory.trim().to_string();
    let known = subcategories_of(req.category.trim());
    let subcategory = if !subcategory.is_empty() && !known.is_empty() && !known.contains(&subcategory.as_str()) {
        debug!(%subcategory, category = %req.category, "dropping subcategory outside category");
        String::new()
    } else {
        subcategory
    };

    JobRecord {
        job_id: new_job_id(now),
        title: req.title.trim().to_string(),
        company_description: req.company_description,
        category: req.category.trim().to_string(),
        subcategory,
        level: req.level,
        job_type: req.job_type.trim().to_string(),
        positions: req.positions.unwrap_or(1).max(1),
        post_date: iso_day(now),
        experience: req.experience,
        education_level: req.education_level,
        description: req.description,
        responsibilities: req.responsibilities,
        qualifications: req.qualifications,
        skills: req.skills,
        salary: req.salary.filter(|s| s.is_finite() && *s >= 0.0).unwrap_or(0.0),
        location: req.location.trim().to_string(),
        deadline: req.deadline.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
        status: req
            .status
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Open".into()),
        how_to_apply: req.how_to_apply.trim().to_string(),
        tags: dedupe_tags(&req.tags),
        keywords: dedupe_tags(&req.keywords),
        created_by: Some(user.uid),
    }
}

/// Validate, require a session, then write once.
pub async fn create_job(
    store: &dyn DocumentStore,
    user: Option<&SessionUser>,
    req: CreateJobRequest,
) -> AppResult<Job> {
    validate(&req)?;
    let user = user.ok_or_else(|| AppError::unauthenticated("You must be logged in to post a job."))?;

    let record = record_from(req, user, OffsetDateTime::now_utc());
    let job = Job::insert(store, &record).await?;
    info!(id = %job.id, job_id = %job.record.job_id, user_id = %user.uid, "job posted");
    Ok(job)
}

pub async fn list_public(store: &dyn DocumentStore, q: &JobListQuery) -> AppResult<Vec<Job>> {
    let mut query = Query::collection(JOBS).newest_first();
    if let Some(status) = q.status.as_deref().filter(|s| !s.is_empty()) {
        query = query.where_eq("status", status);
    }
    if let Some(category) = q.category.as_deref().filter(|s| !s.is_empty()) {
        query = query.where_eq("category", category);
    }
    if let Some(job_type) = q.job_type.as_deref().filter(|s| !s.is_empty()) {
        query = query.where_eq("job_type", job_type);
    }
    if let Some(limit) = q.limit {
        query = query.limit(limit);
    }
    Ok(Job::list(store, query).await?)
}

pub async fn list_all(store: &dyn DocumentStore) -> AppResult<Vec<Job>> {
    Ok(Job::list(store, Query::collection(JOBS).newest_first()).await?)
}

pub fn to_row(job: &Job) -> JobRow {
    JobRow {
        id: job.id,
        job_id: job.record.job_id.clone(),
        title: job.record.title.clone(),
        category: job.record.category.clone(),
        job_type: job.record.job_type.clone(),
        status: job.record.status.clone(),
        created_on: format_date(job.created_at),
        updated_on: format_date(job.updated_at),
        deadline_on: format_iso_day(job.record.deadline.as_deref()),
    }
}

fn optional_html(src: &str) -> Option<String> {
    (!src.trim().is_empty()).then(|| render_markdown(src))
}

pub fn to_details(job: Job) -> JobDetails {
    let r = &job.record;
    JobDetails {
        id: job.id,
        description_html: render_markdown(&r.description),
        responsibilities_html: optional_html(&r.responsibilities),
        qualifications_html: optional_html(&r.qualifications),
        skills_list: split_skills(&r.skills),
        salary_display: format_salary(r.salary),
        location_display: if r.location.trim().is_empty() {
            "Location not specified".into()
        } else {
            r.location.clone()
        },
        deadline_display: r.deadline.as_deref().map(|d| format_iso_day(Some(d))),
        created_at: job.created_at,
        job: job.record,
    }
}
