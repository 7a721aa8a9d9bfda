//! Job application state machine
//!
//! Submission is job-seeker-only and re-validates the publishing
//! predicate (active job, verified organization) at submit time instead
//! of trusting the listing the applicant came from. The composite
//! unique key on (job, applicant) makes the duplicate check hold under
//! concurrent double-submit.
//!
//! Review transitions follow a forward DAG for organization actors;
//! admin may set any status as an audited correction.

use crate::auth::Actor;
use crate::db::Repository;
use crate::db::models::{Application, ApplicationStatus, Job};
use crate::errors::{AppError, Result};
use crate::storage::ObjectStore;
use crate::workflow::resumes::{self, NewResume};
use uuid::Uuid;

/// Where the CV for a submission comes from
pub enum CvSource {
    /// An existing resume owned by the applicant
    Existing(Uuid),
    /// A new file, uploaded before anything is persisted
    Upload(NewResume),
}

/// A job application submission
pub struct SubmitApplication {
    pub job_slug: String,
    pub cv: CvSource,
    pub cover_letter: Option<String>,
}

/// Submit an application. Effects: one application row with status
/// `applied`, and the job's applications counter bumped atomically.
pub async fn submit(
    repo: &Repository,
    store: &dyn ObjectStore,
    actor: &Actor,
    input: SubmitApplication,
) -> Result<Application> {
    actor.require_user()?;

    // Re-validate the publishing predicate; an inactive or unverified
    // listing reads as absent.
    let (job, _organization) = repo
        .find_public_job_by_slug(&input.job_slug)
        .await?
        .ok_or_else(|| AppError::JobNotFound {
            slug: input.job_slug.clone(),
        })?;

    let cv_url = match input.cv {
        CvSource::Existing(resume_id) => {
            let resume = repo
                .find_resume(resume_id)
                .await?
                .ok_or_else(|| AppError::ResumeNotFound {
                    id: resume_id.to_string(),
                })?;
            if resume.user_id != actor.id {
                return Err(AppError::NotOwner);
            }
            resume.file_url
        }
        // Upload success gates persistence: if the blob does not land,
        // neither a resume nor an application row is written.
        CvSource::Upload(upload) => resumes::upload(repo, store, actor, upload).await?.file_url,
    };

    let cover_letter = input
        .cover_letter
        .map(|letter| letter.trim().to_string())
        .filter(|letter| !letter.is_empty());

    let application = repo
        .create_application(job.id, actor.id, cv_url, cover_letter)
        .await?;

    crate::metrics::record_application_submitted();
    tracing::info!(
        application_id = %application.id,
        job_id = %job.id,
        applicant_id = %actor.id,
        "application submitted"
    );

    Ok(application)
}

/// A status change request from a reviewer
#[derive(Debug, Clone)]
pub struct ApplicationStatusUpdate {
    pub application_id: Uuid,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
}

/// Change an application's status. Organization actors must own the
/// job and follow the forward DAG; admin may set anything, audited.
pub async fn update_status(
    repo: &Repository,
    actor: &Actor,
    update: ApplicationStatusUpdate,
) -> Result<Application> {
    actor.require_organization()?;

    let (application, job) = repo
        .find_application_with_job(update.application_id)
        .await?
        .ok_or_else(|| AppError::ApplicationNotFound {
            id: update.application_id.to_string(),
        })?;

    authorize_reviewer(repo, actor, &job).await?;
    check_transition(repo, actor, &application, update.status).await?;

    let notes = update
        .notes
        .map(|notes| notes.trim().to_string())
        .filter(|notes| !notes.is_empty());

    let updated = repo
        .update_application_status(application.id, update.status, notes)
        .await?;

    crate::metrics::record_status_change("application", update.status.as_str());
    tracing::info!(
        application_id = %updated.id,
        from = %application.status,
        to = %updated.status,
        actor_id = %actor.id,
        "application status updated"
    );

    Ok(updated)
}

/// Admin, or the lembaga owning the job's organization
async fn authorize_reviewer(repo: &Repository, actor: &Actor, job: &Job) -> Result<()> {
    if actor.role.is_admin() {
        return Ok(());
    }

    let organization = repo
        .find_organization_by_owner(actor.id)
        .await?
        .ok_or(AppError::NotOwner)?;

    if organization.id != job.organization_id {
        return Err(AppError::NotOwner);
    }

    Ok(())
}

/// Enforce the forward DAG for organization actors; record an audit
/// entry when admin steps outside it.
async fn check_transition(
    repo: &Repository,
    actor: &Actor,
    application: &Application,
    to: ApplicationStatus,
) -> Result<()> {
    let from = application.status;

    if from == to {
        return Err(AppError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    if from.can_progress_to(to) {
        return Ok(());
    }

    if actor.role.is_admin() {
        repo.append_audit(
            actor.id,
            "application.status_override",
            "application",
            application.id,
            Some(format!("{from} -> {to}")),
        )
        .await?;
        return Ok(());
    }

    Err(AppError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    })
}
