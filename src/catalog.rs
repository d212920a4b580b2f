use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Category {
    pub name: &'static str,
    pub subcategories: &'static [&'static str],
}

pub const CATEGORIES: &[Category] = &[
    Category {
        name: "Engineering",
        subcategories: &["Backend", "Frontend", "Full Stack", "Mobile", "DevOps", "QA"],
    },
    Category {
        name: "Data",
        subcategories: &["Data Engineering", "Data Science", "Analytics", "Machine Learning"],
    },
    Category {
        name: "Design",
        subcategories: &["Product Design", "UX Research", "Graphic Design"],
    },
    Category {
        name: "Product",
        subcategories: &["Product Management", "Project Management"],
    },
    Category {
        name: "Marketing",
        subcategories: &["Content", "SEO", "Growth", "Social Media"],
    },
    Category {
        name: "Sales",
        subcategories: &["Account Executive", "Business Development", "Customer Success"],
    },
    Category {
        name: "Operations",
        subcategories: &["HR", "Finance", "Legal", "Administration"],
    },
];

pub const JOB_TYPES: &[&str] = &["Full-time", "Part-time", "Contract", "Internship", "Temporary", "Remote"];

pub const JOB_LEVELS: &[&str] = &["Internship", "Entry", "Junior", "Mid", "Senior", "Lead", "Manager", "Director"];

/// Subcategories offered once a category is picked; empty for unknown names.
pub fn subcategories_of(category: &str) -> &'static [&'static str] {
    CATEGORIES
        .iter()
        .find(|c| c.name == category)
        .map(|c| c.subcategories)
        .unwrap_or(&[])
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub categories: &'static [Category],
    pub job_types: &'static [&'static str],
    pub job_levels: &'static [&'static str],
}

pub async fn get_catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        categories: CATEGORIES,
        job_types: JOB_TYPES,
        job_levels: JOB_LEVELS,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/catalog", get(get_catalog))
}
