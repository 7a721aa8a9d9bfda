//! Resume handlers
//!
//! Upload, list, default selection and deletion for the job seeker's
//! CVs. The single-default invariant lives in the repository; the
//! handlers stay thin.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use samit_common::{
    auth::Actor,
    db::models::Resume,
    db::Repository,
    errors::{AppError, Result},
    workflow::resumes::{self, NewResume},
};
use serde::Serialize;
use uuid::Uuid;

use crate::handlers::{page_guard, read_file_field, read_text_field, UploadedFile};
use crate::AppState;

#[derive(Serialize)]
pub struct ResumeView {
    pub id: String,
    pub title: String,
    pub file_url: String,
    pub file_size: i64,
    pub is_default: bool,
    pub created_at: String,
}

impl From<Resume> for ResumeView {
    fn from(resume: Resume) -> Self {
        Self {
            id: resume.id.to_string(),
            title: resume.title,
            file_url: resume.file_url,
            file_size: resume.file_size,
            is_default: resume.is_default,
            created_at: resume.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ResumeListResponse {
    pub resumes: Vec<ResumeView>,
}

/// The caller's resumes
pub async fn list(State(state): State<AppState>, actor: Actor) -> Result<Json<ResumeListResponse>> {
    page_guard(&actor, "/dashboard/resumes")?;

    let repo = Repository::new(state.db.clone());
    let rows = repo.list_resumes(actor.id).await?;

    Ok(Json(ResumeListResponse {
        resumes: rows.into_iter().map(Into::into).collect(),
    }))
}

/// Upload a resume (multipart: `title` + `file`)
pub async fn upload(
    State(state): State<AppState>,
    actor: Actor,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeView>)> {
    page_guard(&actor, "/dashboard/resumes")?;

    let mut title: Option<String> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::Validation {
        message: format!("malformed upload: {e}"),
        field: None,
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => title = Some(read_text_field(field, "title").await?),
            Some("file") => file = Some(read_file_field(field).await?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::MissingField {
        field: "file".to_string(),
    })?;

    let repo = Repository::new(state.db.clone());
    let resume = resumes::upload(
        &repo,
        state.store.as_ref(),
        &actor,
        NewResume {
            title: title.unwrap_or_else(|| file.filename.clone()),
            filename: file.filename,
            content_type: file.content_type,
            bytes: file.bytes,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(resume.into())))
}

/// Make a resume the default
pub async fn set_default(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    page_guard(&actor, "/dashboard/resumes")?;

    let repo = Repository::new(state.db.clone());
    resumes::set_default(&repo, &actor, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a resume
pub async fn remove(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    page_guard(&actor, "/dashboard/resumes")?;

    let repo = Repository::new(state.db.clone());
    resumes::delete(&repo, state.store.as_ref(), &actor, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
