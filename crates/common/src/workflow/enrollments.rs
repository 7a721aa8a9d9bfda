//! Class enrollment state machine
//!
//! registered -> confirmed | cancelled, confirmed -> cancelled. The
//! enrollee may only cancel their own enrollment; confirmation and
//! corrections are admin actions. Seats are taken with a guarded
//! atomic increment so capacity holds under concurrent enrollment.

use crate::auth::Actor;
use crate::db::Repository;
use crate::db::models::{ClassEnrollment, EnrollmentStatus, ScheduleStatus};
use crate::errors::{AppError, Result};
use uuid::Uuid;

/// An enrollment request against a class
#[derive(Debug, Clone)]
pub struct EnrollRequest {
    pub class_slug: String,
    pub notes: Option<String>,
}

/// Enroll the acting job seeker into a class
pub async fn enroll(repo: &Repository, actor: &Actor, input: EnrollRequest) -> Result<ClassEnrollment> {
    actor.require_user()?;

    let class = repo
        .find_class_by_slug(&input.class_slug)
        .await?
        .filter(|class| class.is_active)
        .ok_or_else(|| AppError::ClassNotFound {
            slug: input.class_slug.clone(),
        })?;

    let today = chrono::Utc::now().date_naive();
    if class.schedule_status(today) == ScheduleStatus::Completed {
        return Err(AppError::Validation {
            message: "class has already ended".to_string(),
            field: Some("class".to_string()),
        });
    }

    let notes = input
        .notes
        .map(|notes| notes.trim().to_string())
        .filter(|notes| !notes.is_empty());

    let enrollment = repo.create_enrollment(class.id, actor.id, notes).await?;

    crate::metrics::record_enrollment();
    tracing::info!(
        enrollment_id = %enrollment.id,
        class_id = %class.id,
        user_id = %actor.id,
        "enrollment created"
    );

    Ok(enrollment)
}

/// A status change request for an enrollment
#[derive(Debug, Clone)]
pub struct EnrollmentStatusUpdate {
    pub enrollment_id: Uuid,
    pub status: EnrollmentStatus,
    pub notes: Option<String>,
}

/// Change an enrollment's status. The enrollee may cancel; everything
/// else is admin. Admin moves outside the forward table are audited.
pub async fn update_status(
    repo: &Repository,
    actor: &Actor,
    update: EnrollmentStatusUpdate,
) -> Result<ClassEnrollment> {
    let (enrollment, _class) = repo
        .find_enrollment_with_class(update.enrollment_id)
        .await?
        .ok_or_else(|| AppError::EnrollmentNotFound {
            id: update.enrollment_id.to_string(),
        })?;

    if !actor.role.is_admin() {
        let cancelling_own =
            enrollment.user_id == actor.id && update.status == EnrollmentStatus::Cancelled;
        if !cancelling_own {
            return Err(AppError::Forbidden {
                message: "only the enrollee may cancel; other changes are admin-only".to_string(),
            });
        }
    }

    let from = enrollment.status;
    if from == update.status {
        return Err(AppError::InvalidTransition {
            from: from.to_string(),
            to: update.status.to_string(),
        });
    }

    if !from.can_progress_to(update.status) {
        if actor.role.is_admin() {
            repo.append_audit(
                actor.id,
                "enrollment.status_override",
                "class_enrollment",
                enrollment.id,
                Some(format!("{from} -> {}", update.status)),
            )
            .await?;
        } else {
            return Err(AppError::InvalidTransition {
                from: from.to_string(),
                to: update.status.to_string(),
            });
        }
    }

    let notes = update
        .notes
        .map(|notes| notes.trim().to_string())
        .filter(|notes| !notes.is_empty());

    let updated = repo
        .update_enrollment_status(enrollment.id, update.status, notes)
        .await?;

    crate::metrics::record_status_change("enrollment", update.status.as_str());

    Ok(updated)
}
