use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::JobRecord;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateJobRequest {
    pub title: String,
    pub company_description: String,
    pub category: String,
    pub subcategory: String,
    pub level: String,
    pub job_type: String,
    pub positions: Option<u32>,
    pub experience: String,
    pub education_level: String,
    pub description: String,
    pub responsibilities: String,
    pub qualifications: String,
    pub skills: String,
    pub salary: Option<f64>,
    pub location: String,
    pub deadline: Option<String>,
    pub status: Option<String>,
    pub how_to_apply: String,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub job: JobRecord,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Public job page.
#[derive(Debug, Serialize)]
pub struct JobDetails {
    pub id: Uuid,
    #[serde(flatten)]
    pub job: JobRecord,
    pub description_html: String,
    pub responsibilities_html: Option<String>,
    pub qualifications_html: Option<String>,
    pub skills_list: Vec<String>,
    pub salary_display: String,
    pub location_display: String,
    pub deadline_display: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Dashboard table row.
#[derive(Debug, Serialize)]
pub struct JobRow {
    pub id: Uuid,
    pub job_id: String,
    pub title: String,
    pub category: String,
    pub job_type: String,
    pub status: String,
    pub created_on: String,
    pub updated_on: String,
    pub deadline_on: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub job_type: Option<String>,
    pub limit: Option<usize>,
}
