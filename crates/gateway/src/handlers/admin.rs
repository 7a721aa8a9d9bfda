//! Admin handlers
//!
//! Overview counts, the verification review queue and decisions, user
//! management, class management and the audit log. All routes here sit
//! under `/dashboard/admin/*` and are admin-only at both the edge and
//! the page level.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use samit_common::{
    auth::Actor,
    db::models::{ClassType, VerificationStatus},
    db::{ClassChanges, NewClassRecord, OverviewCounts, Repository},
    errors::{AppError, Result},
    workflow::{self, verification::{self, Verdict, VerificationDecision}},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::organizations::OrganizationView;
use crate::handlers::{page_guard, PageParams};
use crate::AppState;

/// Overview counts for the admin landing page
pub async fn overview(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<OverviewCounts>> {
    page_guard(&actor, "/dashboard/admin/overview")?;

    let repo = Repository::new(state.db.clone());
    Ok(Json(repo.admin_overview().await?))
}

#[derive(Debug, Deserialize)]
pub struct VerificationFilter {
    pub status: Option<VerificationStatus>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Serialize)]
pub struct OrganizationListResponse {
    pub organizations: Vec<OrganizationView>,
    pub total: u64,
}

/// The verification review queue
pub async fn list_organizations(
    State(state): State<AppState>,
    actor: Actor,
    Query(filter): Query<VerificationFilter>,
) -> Result<Json<OrganizationListResponse>> {
    page_guard(&actor, "/dashboard/admin/organizations")?;

    let page = PageParams {
        offset: filter.offset,
        limit: filter.limit,
    };

    let repo = Repository::new(state.db.clone());
    let (organizations, total) = repo
        .list_organizations_by_status(filter.status, page.offset(), page.limit())
        .await?;

    Ok(Json(OrganizationListResponse {
        organizations: organizations.into_iter().map(Into::into).collect(),
        total,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: Verdict,
    pub notes: Option<String>,
}

/// Decide a verification: verify or reject (reject needs a reason)
pub async fn decide_verification(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<OrganizationView>> {
    page_guard(&actor, "/dashboard/admin/organizations")?;

    let repo = Repository::new(state.db.clone());
    let organization = verification::decide(
        &repo,
        &actor,
        VerificationDecision {
            organization_id: id,
            verdict: request.decision,
            notes: request.notes,
        },
    )
    .await?;

    Ok(Json(organization.into()))
}

#[derive(Serialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserView>,
    pub total: u64,
}

/// User management list
pub async fn list_users(
    State(state): State<AppState>,
    actor: Actor,
    Query(page): Query<PageParams>,
) -> Result<Json<UserListResponse>> {
    page_guard(&actor, "/dashboard/admin/users")?;

    let repo = Repository::new(state.db.clone());
    let (profiles, total) = repo.list_profiles(page.offset(), page.limit()).await?;

    Ok(Json(UserListResponse {
        users: profiles
            .into_iter()
            .map(|profile| UserView {
                id: profile.id.to_string(),
                email: profile.email,
                full_name: profile.full_name,
                role: profile.role.to_string(),
                created_at: profile.created_at.to_rfc3339(),
            })
            .collect(),
        total,
    }))
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassRequest {
    #[validate(length(min = 1, max = 120))]
    pub slug: String,

    #[validate(length(min = 1, max = 200))]
    pub title: String,

    pub class_type: ClassType,

    #[validate(length(max = 8))]
    pub jlpt_level: Option<String>,

    #[validate(length(min = 1, max = 20000))]
    pub description: String,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    #[validate(range(min = 1, max = 1000))]
    pub max_students: i32,

    #[validate(length(max = 500))]
    pub meeting_link: Option<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Serialize)]
pub struct ClassCreatedResponse {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub class_type: ClassType,
    pub start_date: String,
    pub end_date: String,
    pub max_students: i32,
    pub is_active: bool,
}

/// Create a class
pub async fn create_class(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<CreateClassRequest>,
) -> Result<(StatusCode, Json<ClassCreatedResponse>)> {
    page_guard(&actor, "/dashboard/admin/classes")?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    if !workflow::is_valid_slug(&request.slug) {
        return Err(AppError::InvalidFormat {
            message: format!("slug must match [a-z0-9-]+: {}", request.slug),
        });
    }

    if request.end_date < request.start_date {
        return Err(AppError::Validation {
            message: "end_date precedes start_date".to_string(),
            field: Some("end_date".to_string()),
        });
    }

    let repo = Repository::new(state.db.clone());
    let class = repo
        .create_class(NewClassRecord {
            slug: request.slug,
            title: request.title,
            class_type: request.class_type,
            jlpt_level: request.jlpt_level,
            description: request.description,
            start_date: request.start_date,
            end_date: request.end_date,
            max_students: request.max_students,
            meeting_link: request.meeting_link,
            is_active: request.is_active,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ClassCreatedResponse {
            id: class.id.to_string(),
            slug: class.slug,
            title: class.title,
            class_type: class.class_type,
            start_date: class.start_date.to_string(),
            end_date: class.end_date.to_string(),
            max_students: class.max_students,
            is_active: class.is_active,
        }),
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClassRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 20000))]
    pub description: Option<String>,

    #[validate(length(max = 8))]
    pub jlpt_level: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,

    #[validate(range(min = 1, max = 1000))]
    pub max_students: Option<i32>,

    #[validate(length(max = 500))]
    pub meeting_link: Option<String>,

    pub is_active: Option<bool>,
}

/// Update a class
pub async fn update_class(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClassRequest>,
) -> Result<Json<ClassCreatedResponse>> {
    page_guard(&actor, "/dashboard/admin/classes")?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let class = repo
        .update_class(
            id,
            ClassChanges {
                title: request.title,
                description: request.description,
                jlpt_level: request.jlpt_level.map(Some),
                start_date: request.start_date,
                end_date: request.end_date,
                max_students: request.max_students,
                meeting_link: request.meeting_link.map(Some),
                is_active: request.is_active,
            },
        )
        .await?;

    Ok(Json(ClassCreatedResponse {
        id: class.id.to_string(),
        slug: class.slug,
        title: class.title,
        class_type: class.class_type,
        start_date: class.start_date.to_string(),
        end_date: class.end_date.to_string(),
        max_students: class.max_students,
        is_active: class.is_active,
    }))
}

#[derive(Serialize)]
pub struct AuditEntryView {
    pub id: String,
    pub actor_id: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct AuditLogResponse {
    pub entries: Vec<AuditEntryView>,
    pub total: u64,
}

/// The audit log, newest first
pub async fn audit_log(
    State(state): State<AppState>,
    actor: Actor,
    Query(page): Query<PageParams>,
) -> Result<Json<AuditLogResponse>> {
    page_guard(&actor, "/dashboard/admin/audit")?;

    let repo = Repository::new(state.db.clone());
    let (entries, total) = repo.list_audit(page.offset(), page.limit()).await?;

    Ok(Json(AuditLogResponse {
        entries: entries
            .into_iter()
            .map(|entry| AuditEntryView {
                id: entry.id.to_string(),
                actor_id: entry.actor_id.to_string(),
                action: entry.action,
                target_type: entry.target_type,
                target_id: entry.target_id.to_string(),
                notes: entry.notes,
                created_at: entry.created_at.to_rfc3339(),
            })
            .collect(),
        total,
    }))
}
