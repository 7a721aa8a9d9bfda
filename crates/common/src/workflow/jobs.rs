//! Job publishing
//!
//! Creation is gated on the owning organization's verification: a
//! lembaga with a pending or rejected organization cannot publish.
//! Admin posts bypass the gate through the explicit, idempotent
//! platform organization. The public detail view is the one documented
//! side-effecting read: it bumps the view counter atomically.

use crate::auth::Actor;
use crate::db::models::{Job, Organization};
use crate::db::{JobChanges, NewJobRecord, Repository};
use crate::errors::{AppError, Result};
use crate::workflow::is_valid_slug;
use uuid::Uuid;

/// A new job posting
#[derive(Debug, Clone)]
pub struct NewJob {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub employment_type: String,
    pub jlpt_required: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub location: Option<String>,
    pub is_active: bool,
}

/// Validate a posting before any I/O
pub fn validate(input: &NewJob) -> Result<()> {
    if !is_valid_slug(&input.slug) {
        return Err(AppError::InvalidFormat {
            message: format!("slug must match [a-z0-9-]+: {}", input.slug),
        });
    }

    if input.title.trim().is_empty() {
        return Err(AppError::MissingField {
            field: "title".to_string(),
        });
    }

    if let (Some(min), Some(max)) = (input.salary_min, input.salary_max) {
        if min > max {
            return Err(AppError::Validation {
                message: "salary_min exceeds salary_max".to_string(),
                field: Some("salary_min".to_string()),
            });
        }
    }

    Ok(())
}

/// Create a job under the actor's organization
pub async fn create(repo: &Repository, actor: &Actor, input: NewJob) -> Result<Job> {
    actor.require_organization()?;
    validate(&input)?;

    let organization = resolve_publisher(repo, actor).await?;

    let job = repo
        .create_job(NewJobRecord {
            organization_id: organization.id,
            slug: input.slug,
            title: input.title.trim().to_string(),
            description: input.description,
            category: input.category,
            employment_type: input.employment_type,
            jlpt_required: input.jlpt_required,
            salary_min: input.salary_min,
            salary_max: input.salary_max,
            location: input.location,
            is_active: input.is_active,
        })
        .await?;

    tracing::info!(
        job_id = %job.id,
        organization_id = %organization.id,
        actor_id = %actor.id,
        "job created"
    );

    Ok(job)
}

/// The organization a posting lands under. Lembaga must be verified;
/// admin posts go to the platform organization, created on first use.
async fn resolve_publisher(repo: &Repository, actor: &Actor) -> Result<Organization> {
    if actor.role.is_admin() {
        return repo.ensure_admin_organization(actor.id).await;
    }

    let organization = repo
        .find_organization_by_owner(actor.id)
        .await?
        .ok_or_else(|| AppError::Validation {
            message: "create an organization profile first".to_string(),
            field: Some("organization".to_string()),
        })?;

    if !organization.is_verified() {
        return Err(AppError::VerificationRequired);
    }

    Ok(organization)
}

/// Update a job the actor owns (or any job, for admin)
pub async fn update(
    repo: &Repository,
    actor: &Actor,
    job_id: Uuid,
    changes: JobChanges,
) -> Result<Job> {
    actor.require_organization()?;

    let job = repo.find_job(job_id).await?.ok_or_else(|| AppError::JobNotFound {
        slug: job_id.to_string(),
    })?;
    authorize_owner(repo, actor, &job).await?;

    repo.update_job(job.id, changes).await
}

/// Delete a job the actor owns (or any job, for admin)
pub async fn remove(repo: &Repository, actor: &Actor, job_id: Uuid) -> Result<()> {
    actor.require_organization()?;

    let job = repo.find_job(job_id).await?.ok_or_else(|| AppError::JobNotFound {
        slug: job_id.to_string(),
    })?;
    authorize_owner(repo, actor, &job).await?;

    repo.delete_job(job.id).await?;
    tracing::info!(job_id = %job.id, actor_id = %actor.id, "job deleted");
    Ok(())
}

/// Public job detail: resolves only published jobs and bumps the view
/// counter. Everything failing the publishing predicate reads as absent.
pub async fn record_view(repo: &Repository, slug: &str) -> Result<(Job, Organization)> {
    let (job, organization) = repo
        .find_public_job_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::JobNotFound {
            slug: slug.to_string(),
        })?;

    repo.increment_views_count(job.id).await?;
    crate::metrics::record_job_view();

    Ok((job, organization))
}

async fn authorize_owner(repo: &Repository, actor: &Actor, job: &Job) -> Result<()> {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn posting() -> NewJob {
        NewJob {
            slug: "tokyo-waiter-2026".to_string(),
            title: "Waiter (Tokyo)".to_string(),
            description: "Restaurant staff position".to_string(),
            category: "hospitality".to_string(),
            employment_type: "full_time".to_string(),
            jlpt_required: Some("N3".to_string()),
            salary_min: Some(180_000),
            salary_max: Some(220_000),
            location: Some("Tokyo".to_string()),
            is_active: true,
        }
    }

    #[test]
    fn test_valid_posting() {
        assert!(validate(&posting()).is_ok());
    }

    #[test]
    fn test_slug_format_enforced() {
        let mut input = posting();
        input.slug = "Tokyo Waiter".to_string();
        assert!(matches!(
            validate(&input),
            Err(AppError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_title_required() {
        let mut input = posting();
        input.title = "   ".to_string();
        assert!(matches!(validate(&input), Err(AppError::MissingField { .. })));
    }

    #[test]
    fn test_salary_range_ordered() {
        let mut input = posting();
        input.salary_min = Some(300_000);
        input.salary_max = Some(200_000);
        assert!(matches!(validate(&input), Err(AppError::Validation { .. })));

        // open-ended ranges are fine
        input.salary_max = None;
        assert!(validate(&input).is_ok());
    }
}
