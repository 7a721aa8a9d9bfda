//! Application handlers
//!
//! The apply entry point (multipart: an existing resume id or a fresh
//! CV upload), the applicant's own list, and the reviewer surface for
//! organizations.

use axum::{
    extract::{Multipart, Path, State},
    response::Redirect,
    Json,
};
use samit_common::{
    auth::Actor,
    db::models::{Application, ApplicationStatus, Job},
    db::{Repository, ADMIN_ORGANIZATION_SLUG},
    errors::{AppError, Result},
    workflow::applications::{self, ApplicationStatusUpdate, CvSource, SubmitApplication},
    workflow::resumes::NewResume,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::{page_guard, read_file_field, read_text_field, UploadedFile};
use crate::AppState;

/// Submit an application to `/apply/{slug}`.
///
/// Multipart fields: `resume_id` (existing CV) or `title` + `file`
/// (new upload), plus an optional `cover_letter`. On success the
/// applicant is sent to their applications list.
pub async fn submit(
    State(state): State<AppState>,
    actor: Actor,
    Path(slug): Path<String>,
    mut multipart: Multipart,
) -> Result<Redirect> {
    page_guard(&actor, &format!("/apply/{slug}"))?;

    let mut resume_id: Option<Uuid> = None;
    let mut title: Option<String> = None;
    let mut cover_letter: Option<String> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::Validation {
        message: format!("malformed submission: {e}"),
        field: None,
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("resume_id") => {
                let raw = read_text_field(field, "resume_id").await?;
                let parsed = Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidFormat {
                    message: format!("resume_id is not a UUID: {raw}"),
                })?;
                resume_id = Some(parsed);
            }
            Some("title") => title = Some(read_text_field(field, "title").await?),
            Some("cover_letter") => {
                cover_letter = Some(read_text_field(field, "cover_letter").await?)
            }
            Some("file") => file = Some(read_file_field(field).await?),
            _ => {}
        }
    }

    let cv = match (resume_id, file) {
        (Some(resume_id), _) => CvSource::Existing(resume_id),
        (None, Some(file)) => CvSource::Upload(NewResume {
            title: title.unwrap_or_else(|| file.filename.clone()),
            filename: file.filename,
            content_type: file.content_type,
            bytes: file.bytes,
        }),
        (None, None) => {
            return Err(AppError::MissingField {
                field: "resume_id or file".to_string(),
            })
        }
    };

    let repo = Repository::new(state.db.clone());
    applications::submit(
        &repo,
        state.store.as_ref(),
        &actor,
        SubmitApplication {
            job_slug: slug,
            cv,
            cover_letter,
        },
    )
    .await?;

    Ok(Redirect::to("/dashboard/applications"))
}

#[derive(Serialize)]
pub struct JobRef {
    pub slug: String,
    pub title: String,
}

#[derive(Serialize)]
pub struct ApplicationView {
    pub id: String,
    pub job: JobRef,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_notes: Option<String>,
    pub cv_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    pub applied_at: String,
    pub updated_at: String,
}

impl ApplicationView {
    fn from_row(application: Application, job: Job) -> Self {
        Self {
            id: application.id.to_string(),
            job: JobRef {
                slug: job.slug,
                title: job.title,
            },
            status: application.status,
            status_notes: application.status_notes,
            cv_url: application.cv_url,
            cover_letter: application.cover_letter,
            applied_at: application.applied_at.to_rfc3339(),
            updated_at: application.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationView>,
}

/// The applicant's own applications
pub async fn list_mine(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<ApplicationListResponse>> {
    page_guard(&actor, "/dashboard/applications")?;

    let repo = Repository::new(state.db.clone());
    let rows = repo.list_applications_by_applicant(actor.id).await?;

    Ok(Json(ApplicationListResponse {
        applications: rows
            .into_iter()
            .map(|(application, job)| ApplicationView::from_row(application, job))
            .collect(),
    }))
}

#[derive(Serialize)]
pub struct ApplicantView {
    pub id: String,
    pub applicant_id: String,
    pub job: JobRef,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_notes: Option<String>,
    pub cv_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    pub applied_at: String,
}

#[derive(Serialize)]
pub struct ApplicantListResponse {
    pub applicants: Vec<ApplicantView>,
}

/// Applications against the organization's jobs (reviewer surface)
pub async fn list_for_organization(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<ApplicantListResponse>> {
    page_guard(&actor, "/dashboard/applicants")?;

    let repo = Repository::new(state.db.clone());

    let organization = if actor.role.is_admin() {
        repo.find_organization_by_slug(ADMIN_ORGANIZATION_SLUG).await?
    } else {
        repo.find_organization_by_owner(actor.id).await?
    };

    let rows = match organization {
        Some(organization) => {
            repo.list_applications_for_organization(organization.id)
                .await?
        }
        None => Vec::new(),
    };

    Ok(Json(ApplicantListResponse {
        applicants: rows
            .into_iter()
            .map(|(application, job)| ApplicantView {
                id: application.id.to_string(),
                applicant_id: application.applicant_id.to_string(),
                job: JobRef {
                    slug: job.slug,
                    title: job.title,
                },
                status: application.status,
                status_notes: application.status_notes,
                cv_url: application.cv_url,
                cover_letter: application.cover_letter,
                applied_at: application.applied_at.to_rfc3339(),
            })
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ApplicationStatus,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct StatusUpdateResponse {
    pub id: String,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_notes: Option<String>,
    pub updated_at: String,
}

/// Move an application through its review lifecycle
pub async fn update_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<StatusUpdateResponse>> {
    page_guard(&actor, "/dashboard/applicants")?;

    let repo = Repository::new(state.db.clone());
    let updated = applications::update_status(
        &repo,
        &actor,
        ApplicationStatusUpdate {
            application_id: id,
            status: request.status,
            notes: request.notes,
        },
    )
    .await?;

    Ok(Json(StatusUpdateResponse {
        id: updated.id.to_string(),
        status: updated.status,
        status_notes: updated.status_notes,
        updated_at: updated.updated_at.to_rfc3339(),
    }))
}
