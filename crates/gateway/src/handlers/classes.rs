//! Class and enrollment handlers
//!
//! Public course browsing (schedule status derived from the date window
//! at read time), enrollment, the student's own enrollments and status
//! changes. The meeting link is only surfaced to confirmed enrollees.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use samit_common::{
    auth::Actor,
    db::models::{Class, ClassEnrollment, ClassType, EnrollmentStatus, ScheduleStatus},
    db::Repository,
    errors::{AppError, Result},
    workflow::enrollments::{self, EnrollRequest, EnrollmentStatusUpdate},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::{page_guard, PageParams};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ClassFilter {
    pub class_type: Option<ClassType>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Serialize)]
pub struct ClassSummary {
    pub slug: String,
    pub title: String,
    pub class_type: ClassType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jlpt_level: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub schedule_status: ScheduleStatus,
    pub max_students: i32,
    pub enrolled_count: i32,
    pub is_full: bool,
}

impl ClassSummary {
    fn from_model(class: Class) -> Self {
        let today = chrono::Utc::now().date_naive();
        Self {
            schedule_status: class.schedule_status(today),
            is_full: class.is_full(),
            slug: class.slug,
            title: class.title,
            class_type: class.class_type,
            jlpt_level: class.jlpt_level,
            start_date: class.start_date.to_string(),
            end_date: class.end_date.to_string(),
            max_students: class.max_students,
            enrolled_count: class.enrolled_count,
        }
    }
}

#[derive(Serialize)]
pub struct ClassListResponse {
    pub classes: Vec<ClassSummary>,
    pub total: u64,
}

/// Public course catalog
pub async fn list_public(
    State(state): State<AppState>,
    Query(filter): Query<ClassFilter>,
) -> Result<Json<ClassListResponse>> {
    let repo = Repository::new(state.db.clone());

    let page = PageParams {
        offset: filter.offset,
        limit: filter.limit,
    };
    let (classes, total) = repo
        .list_classes(filter.class_type, true, page.offset(), page.limit())
        .await?;

    Ok(Json(ClassListResponse {
        classes: classes.into_iter().map(ClassSummary::from_model).collect(),
        total,
    }))
}

#[derive(Serialize)]
pub struct ClassDetailResponse {
    pub slug: String,
    pub title: String,
    pub class_type: ClassType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jlpt_level: Option<String>,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub schedule_status: ScheduleStatus,
    pub max_students: i32,
    pub enrolled_count: i32,
    pub is_full: bool,
}

/// Public class detail. No meeting link here; that is enrollment-gated.
pub async fn detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ClassDetailResponse>> {
    let repo = Repository::new(state.db.clone());

    let class = repo
        .find_class_by_slug(&slug)
        .await?
        .filter(|class| class.is_active)
        .ok_or_else(|| AppError::ClassNotFound { slug: slug.clone() })?;

    let today = chrono::Utc::now().date_naive();

    Ok(Json(ClassDetailResponse {
        schedule_status: class.schedule_status(today),
        is_full: class.is_full(),
        slug: class.slug,
        title: class.title,
        class_type: class.class_type,
        jlpt_level: class.jlpt_level,
        description: class.description,
        start_date: class.start_date.to_string(),
        end_date: class.end_date.to_string(),
        max_students: class.max_students,
        enrolled_count: class.enrolled_count,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct EnrollBody {
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct EnrollmentCreatedResponse {
    pub id: String,
    pub status: EnrollmentStatus,
    pub enrolled_at: String,
}

/// Enroll the caller into a class. The body may be `{}`.
pub async fn enroll(
    State(state): State<AppState>,
    actor: Actor,
    Path(slug): Path<String>,
    Json(body): Json<EnrollBody>,
) -> Result<(StatusCode, Json<EnrollmentCreatedResponse>)> {
    let notes = body.notes;

    let repo = Repository::new(state.db.clone());
    let enrollment = enrollments::enroll(
        &repo,
        &actor,
        EnrollRequest {
            class_slug: slug,
            notes,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(EnrollmentCreatedResponse {
            id: enrollment.id.to_string(),
            status: enrollment.status,
            enrolled_at: enrollment.enrolled_at.to_rfc3339(),
        }),
    ))
}

#[derive(Serialize)]
pub struct EnrollmentView {
    pub id: String,
    pub status: EnrollmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub enrolled_at: String,
    pub class: ClassSummary,
    /// Present only while the enrollment is confirmed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
}

impl EnrollmentView {
    fn from_row(enrollment: ClassEnrollment, class: Class) -> Self {
        let meeting_link = if enrollment.status.grants_meeting_access() {
            class.meeting_link.clone()
        } else {
            None
        };

        Self {
            id: enrollment.id.to_string(),
            status: enrollment.status,
            notes: enrollment.notes,
            enrolled_at: enrollment.enrolled_at.to_rfc3339(),
            class: ClassSummary::from_model(class),
            meeting_link,
        }
    }
}

#[derive(Serialize)]
pub struct EnrollmentListResponse {
    pub enrollments: Vec<EnrollmentView>,
}

/// The caller's enrollments
pub async fn list_mine(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<EnrollmentListResponse>> {
    page_guard(&actor, "/dashboard/classes")?;

    let repo = Repository::new(state.db.clone());
    let rows = repo.list_enrollments_by_user(actor.id).await?;

    Ok(Json(EnrollmentListResponse {
        enrollments: rows
            .into_iter()
            .map(|(enrollment, class)| EnrollmentView::from_row(enrollment, class))
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct EnrollmentStatusBody {
    pub status: EnrollmentStatus,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct EnrollmentStatusResponse {
    pub id: String,
    pub status: EnrollmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub updated_at: String,
}

/// Change an enrollment's status (enrollee cancel / admin decisions)
pub async fn update_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(body): Json<EnrollmentStatusBody>,
) -> Result<Json<EnrollmentStatusResponse>> {
    page_guard(&actor, "/dashboard/classes")?;

    let repo = Repository::new(state.db.clone());
    let updated = enrollments::update_status(
        &repo,
        &actor,
        EnrollmentStatusUpdate {
            enrollment_id: id,
            status: body.status,
            notes: body.notes,
        },
    )
    .await?;

    Ok(Json(EnrollmentStatusResponse {
        id: updated.id.to_string(),
        status: updated.status,
        notes: updated.notes,
        updated_at: updated.updated_at.to_rfc3339(),
    }))
}
