//! Job handlers
//!
//! Public browse/detail plus the organization dashboard's job
//! management. A job is publicly visible only while it is active and
//! its organization is verified; the detail view is the documented
//! side-effecting read (it bumps the view counter).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use samit_common::{
    auth::Actor,
    db::models::{Job, Organization},
    db::{JobChanges, Repository, ADMIN_ORGANIZATION_SLUG},
    errors::{AppError, Result},
    workflow,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::{page_guard, PageParams};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct JobFilter {
    pub category: Option<String>,
    pub employment_type: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl JobFilter {
    fn page(&self) -> PageParams {
        PageParams {
            offset: self.offset,
            limit: self.limit,
        }
    }
}

#[derive(Serialize)]
pub struct CompanyRef {
    pub slug: String,
    pub display_name: String,
}

#[derive(Serialize)]
pub struct JobSummary {
    pub slug: String,
    pub title: String,
    pub category: String,
    pub employment_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jlpt_required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub company: CompanyRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl JobSummary {
    fn from_row(job: Job, organization: Organization) -> Self {
        Self {
            slug: job.slug,
            title: job.title,
            category: job.category,
            employment_type: job.employment_type,
            jlpt_required: job.jlpt_required,
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            location: job.location,
            company: CompanyRef {
                slug: organization.slug,
                display_name: organization.display_name,
            },
            published_at: job.published_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

#[derive(Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobSummary>,
    pub total: u64,
}

/// Public job listing: active jobs of verified organizations only
pub async fn list_public(
    State(state): State<AppState>,
    Query(filter): Query<JobFilter>,
) -> Result<Json<JobListResponse>> {
    let repo = Repository::new(state.db.clone());

    let page = filter.page();
    let (rows, total) = repo
        .list_public_jobs(
            filter.category.as_deref(),
            filter.employment_type.as_deref(),
            page.offset(),
            page.limit(),
        )
        .await?;

    Ok(Json(JobListResponse {
        jobs: rows
            .into_iter()
            .map(|(job, org)| JobSummary::from_row(job, org))
            .collect(),
        total,
    }))
}

#[derive(Serialize)]
pub struct JobDetailResponse {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub employment_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jlpt_required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub company: CompanyRef,
    pub applications_count: i32,
    pub views_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// Public job detail; increments the view counter
pub async fn detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<JobDetailResponse>> {
    let repo = Repository::new(state.db.clone());
    let (job, organization) = workflow::jobs::record_view(&repo, &slug).await?;

    Ok(Json(JobDetailResponse {
        slug: job.slug,
        title: job.title,
        description: job.description,
        category: job.category,
        employment_type: job.employment_type,
        jlpt_required: job.jlpt_required,
        salary_min: job.salary_min,
        salary_max: job.salary_max,
        location: job.location,
        company: CompanyRef {
            slug: organization.slug,
            display_name: organization.display_name,
        },
        applications_count: job.applications_count,
        views_count: job.views_count,
        published_at: job.published_at.map(|dt| dt.to_rfc3339()),
    }))
}

#[derive(Serialize)]
pub struct OwnedJobView {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub category: String,
    pub employment_type: String,
    pub is_active: bool,
    pub applications_count: i32,
    pub views_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    pub created_at: String,
}

impl From<Job> for OwnedJobView {
    fn from(job: Job) -> Self {
        Self {
            id: job.id.to_string(),
            slug: job.slug,
            title: job.title,
            category: job.category,
            employment_type: job.employment_type,
            is_active: job.is_active,
            applications_count: job.applications_count,
            views_count: job.views_count,
            published_at: job.published_at.map(|dt| dt.to_rfc3339()),
            created_at: job.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct OwnedJobsResponse {
    pub jobs: Vec<OwnedJobView>,
}

/// The organization dashboard's job list (any status). Admin sees the
/// platform organization's posts; this read never provisions it.
pub async fn list_mine(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<OwnedJobsResponse>> {
    page_guard(&actor, "/dashboard/jobs")?;

    let repo = Repository::new(state.db.clone());

    let organization = if actor.role.is_admin() {
        repo.find_organization_by_slug(ADMIN_ORGANIZATION_SLUG).await?
    } else {
        repo.find_organization_by_owner(actor.id).await?
    };

    let jobs = match organization {
        Some(organization) => repo.list_jobs_by_organization(organization.id).await?,
        None => Vec::new(),
    };

    Ok(Json(OwnedJobsResponse {
        jobs: jobs.into_iter().map(Into::into).collect(),
    }))
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[validate(length(min = 1, max = 120))]
    pub slug: String,

    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 20000))]
    pub description: String,

    #[validate(length(min = 1, max = 64))]
    pub category: String,

    #[validate(length(min = 1, max = 64))]
    pub employment_type: String,

    #[validate(length(max = 8))]
    pub jlpt_required: Option<String>,

    pub salary_min: Option<i64>,

    pub salary_max: Option<i64>,

    #[validate(length(max = 200))]
    pub location: Option<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Create a job. Requires a verified organization (admin bypasses via
/// the platform organization).
pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<OwnedJobView>)> {
    page_guard(&actor, "/dashboard/jobs")?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let job = workflow::jobs::create(
        &repo,
        &actor,
        workflow::jobs::NewJob {
            slug: request.slug,
            title: request.title,
            description: request.description,
            category: request.category,
            employment_type: request.employment_type,
            jlpt_required: request.jlpt_required,
            salary_min: request.salary_min,
            salary_max: request.salary_max,
            location: request.location,
            is_active: request.is_active,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(job.into())))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateJobRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 20000))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub category: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub employment_type: Option<String>,

    #[validate(length(max = 8))]
    pub jlpt_required: Option<String>,

    pub salary_min: Option<i64>,

    pub salary_max: Option<i64>,

    #[validate(length(max = 200))]
    pub location: Option<String>,

    pub is_active: Option<bool>,
}

/// Update an owned job; activating for the first time stamps
/// `published_at`
pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateJobRequest>,
) -> Result<Json<OwnedJobView>> {
    page_guard(&actor, "/dashboard/jobs")?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let job = workflow::jobs::update(
        &repo,
        &actor,
        id,
        JobChanges {
            title: request.title,
            description: request.description,
            category: request.category,
            employment_type: request.employment_type,
            jlpt_required: request.jlpt_required.map(Some),
            salary_min: request.salary_min.map(Some),
            salary_max: request.salary_max.map(Some),
            location: request.location.map(Some),
            is_active: request.is_active,
        },
    )
    .await?;

    Ok(Json(job.into()))
}

/// Delete an owned job
pub async fn remove(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    page_guard(&actor, "/dashboard/jobs")?;

    let repo = Repository::new(state.db.clone());
    workflow::jobs::remove(&repo, &actor, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
