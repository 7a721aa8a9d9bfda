//! Organization verification state machine
//!
//! pending -> verified | rejected, rejected -> verified (re-verify).
//! A verified organization admits no further decision. Rejections
//! require a reason; the decision, notes, timestamp and audit entry
//! land atomically in the repository.

use crate::auth::Actor;
use crate::db::Repository;
use crate::db::models::{Organization, VerificationStatus};
use crate::errors::{AppError, Result};
use crate::storage::{self, ObjectStore, UploadKind};
use serde::Deserialize;
use uuid::Uuid;

/// Admin verdict on an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Verify,
    Reject,
}

/// A verification decision as a pure command object, validated before
/// dispatch. The notes-required-for-reject rule lives here, not in any
/// form component.
#[derive(Debug, Clone)]
pub struct VerificationDecision {
    pub organization_id: Uuid,
    pub verdict: Verdict,
    pub notes: Option<String>,
}

/// Validate a decision before any I/O
pub fn validate(decision: &VerificationDecision) -> Result<()> {
    if decision.verdict == Verdict::Reject {
        let has_reason = decision
            .notes
            .as_deref()
            .is_some_and(|notes| !notes.trim().is_empty());
        if !has_reason {
            return Err(AppError::Validation {
                message: "a rejection reason is required".to_string(),
                field: Some("notes".to_string()),
            });
        }
    }
    Ok(())
}

/// Apply an admin verification decision
pub async fn decide(
    repo: &Repository,
    actor: &Actor,
    decision: VerificationDecision,
) -> Result<Organization> {
    actor.require_admin()?;
    validate(&decision)?;

    let (status, action) = match decision.verdict {
        Verdict::Verify => (VerificationStatus::Verified, "organization.verify"),
        Verdict::Reject => (VerificationStatus::Rejected, "organization.reject"),
    };

    let notes = decision
        .notes
        .map(|notes| notes.trim().to_string())
        .filter(|notes| !notes.is_empty());

    let organization = repo
        .apply_verification(decision.organization_id, status, notes, actor.id, action)
        .await?;

    crate::metrics::record_verification(status.as_str());
    tracing::info!(
        organization_id = %organization.id,
        status = %organization.verification_status,
        actor_id = %actor.id,
        "verification decided"
    );

    Ok(organization)
}

/// A legal document upload for the actor's own organization
#[derive(Debug)]
pub struct LegalDocumentUpload {
    pub doc_type: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Store a legal document and record it in the organization's document
/// map. Validation happens before the upload; the upload happens before
/// the row is touched.
pub async fn upload_legal_document(
    repo: &Repository,
    store: &dyn ObjectStore,
    actor: &Actor,
    upload: LegalDocumentUpload,
) -> Result<Organization> {
    actor.require_organization()?;

    let doc_type = upload.doc_type.trim().to_lowercase();
    if doc_type.is_empty() || !doc_type.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::Validation {
            message: "document type must be a lowercase identifier".to_string(),
            field: Some("doc_type".to_string()),
        });
    }

    storage::validate_upload(
        UploadKind::LegalDocument,
        &upload.content_type,
        upload.bytes.len(),
    )?;

    let organization = repo
        .find_organization_by_owner(actor.id)
        .await?
        .ok_or_else(|| AppError::Validation {
            message: "create an organization profile first".to_string(),
            field: Some("organization".to_string()),
        })?;

    let key = format!(
        "legal/{}/{}-{}-{}",
        organization.id,
        doc_type,
        Uuid::new_v4(),
        sanitize_filename(&upload.filename)
    );
    let url = store.put(&key, &upload.content_type, upload.bytes).await?;

    repo.upsert_legal_document(organization.id, &doc_type, &url, &upload.filename)
        .await
}

/// Keep filenames to a safe charset for object keys
pub(crate) fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(verdict: Verdict, notes: Option<&str>) -> VerificationDecision {
        VerificationDecision {
            organization_id: Uuid::new_v4(),
            verdict,
            notes: notes.map(String::from),
        }
    }

    #[test]
    fn test_reject_requires_reason() {
        assert!(validate(&decision(Verdict::Reject, None)).is_err());
        assert!(validate(&decision(Verdict::Reject, Some(""))).is_err());
        assert!(validate(&decision(Verdict::Reject, Some("   "))).is_err());
        assert!(validate(&decision(Verdict::Reject, Some("Missing NPWP"))).is_ok());
    }

    #[test]
    fn test_verify_notes_optional() {
        assert!(validate(&decision(Verdict::Verify, None)).is_ok());
        assert!(validate(&decision(Verdict::Verify, Some("Documents in order"))).is_ok());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("akta pendirian.pdf"), "akta-pendirian.pdf");
        assert_eq!(sanitize_filename("npwp_2026.PDF"), "npwp_2026.PDF");
        assert_eq!(sanitize_filename("../../etc/passwd"), "..-..-etc-passwd");
        assert_eq!(sanitize_filename(""), "document");
    }
}
