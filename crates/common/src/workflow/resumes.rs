//! Resume management
//!
//! A user's first resume becomes the default; the default-swap and the
//! `profiles.default_cv_id` mirror are one transaction in the
//! repository, so a zero-default state cannot be observed. The stored
//! blob is deleted best-effort after the row is gone.

use crate::auth::Actor;
use crate::db::Repository;
use crate::db::models::Resume;
use crate::errors::{AppError, Result};
use crate::storage::{self, ObjectStore, UploadKind};
use crate::workflow::verification::sanitize_filename;
use uuid::Uuid;

/// A new resume file
pub struct NewResume {
    pub title: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Upload a resume. The blob must land before any row is written; an
/// upload failure leaves no trace in the store.
pub async fn upload(
    repo: &Repository,
    store: &dyn ObjectStore,
    actor: &Actor,
    input: NewResume,
) -> Result<Resume> {
    actor.require_user()?;

    let title = input.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::MissingField {
            field: "title".to_string(),
        });
    }

    storage::validate_upload(UploadKind::Resume, &input.content_type, input.bytes.len())?;
    let file_size = input.bytes.len() as i64;

    let key = format!(
        "resumes/{}/{}-{}",
        actor.id,
        Uuid::new_v4(),
        sanitize_filename(&input.filename)
    );
    let file_url = store.put(&key, &input.content_type, input.bytes).await?;

    let is_first = repo.count_resumes(actor.id).await? == 0;
    let resume = repo
        .create_resume(actor.id, title, file_url, file_size, is_first)
        .await?;

    crate::metrics::record_resume_uploaded();
    tracing::info!(
        resume_id = %resume.id,
        user_id = %actor.id,
        is_default = resume.is_default,
        "resume uploaded"
    );

    Ok(resume)
}

/// Make a resume the caller's default
pub async fn set_default(repo: &Repository, actor: &Actor, resume_id: Uuid) -> Result<()> {
    actor.require_user()?;

    let resume = repo
        .find_resume(resume_id)
        .await?
        .ok_or_else(|| AppError::ResumeNotFound {
            id: resume_id.to_string(),
        })?;
    if resume.user_id != actor.id {
        return Err(AppError::NotOwner);
    }

    repo.set_default_resume(actor.id, resume_id).await
}

/// Delete a resume. The row goes first; a storage failure cannot
/// resurrect a deleted-looking resume, it only orphans a blob.
pub async fn delete(
    repo: &Repository,
    store: &dyn ObjectStore,
    actor: &Actor,
    resume_id: Uuid,
) -> Result<()> {
    actor.require_user()?;

    let resume = repo
        .find_resume(resume_id)
        .await?
        .ok_or_else(|| AppError::ResumeNotFound {
            id: resume_id.to_string(),
        })?;
    if resume.user_id != actor.id {
        return Err(AppError::NotOwner);
    }

    repo.delete_resume(actor.id, resume_id).await?;

    if let Err(err) = store.delete(&resume.file_url).await {
        tracing::warn!(
            resume_id = %resume_id,
            error = %err,
            "orphaned resume blob after row deletion"
        );
    }

    Ok(())
}
