//! Organization handlers
//!
//! Public companies directory plus the lembaga dashboard: the own-org
//! profile page (created lazily on first visit), profile updates and
//! legal-document uploads. Verification decisions live under the admin
//! handlers.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use samit_common::{
    auth::Actor,
    db::models::Organization,
    db::{OrganizationChanges, Repository},
    errors::{AppError, Result},
    workflow::verification::{self, LegalDocumentUpload},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::handlers::{page_guard, read_file_field, read_text_field, PageParams, UploadedFile};
use crate::AppState;

#[derive(Serialize)]
pub struct CompanySummary {
    pub slug: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Serialize)]
pub struct CompanyListResponse {
    pub companies: Vec<CompanySummary>,
    pub total: u64,
}

/// Public directory of verified organizations
pub async fn list_public(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<CompanyListResponse>> {
    let repo = Repository::new(state.db.clone());
    let (organizations, total) = repo
        .list_verified_organizations(page.offset(), page.limit())
        .await?;

    Ok(Json(CompanyListResponse {
        companies: organizations
            .into_iter()
            .map(|org| CompanySummary {
                slug: org.slug,
                display_name: org.display_name,
                description: org.description,
                website: org.website,
            })
            .collect(),
        total,
    }))
}

/// Public company profile; unverified organizations read as absent
pub async fn public_profile(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CompanySummary>> {
    let repo = Repository::new(state.db.clone());

    let organization = repo
        .find_organization_by_slug(&slug)
        .await?
        .filter(Organization::is_verified)
        .ok_or_else(|| AppError::OrganizationNotFound { id: slug.clone() })?;

    Ok(Json(CompanySummary {
        slug: organization.slug,
        display_name: organization.display_name,
        description: organization.description,
        website: organization.website,
    }))
}

#[derive(Serialize)]
pub struct OrganizationView {
    pub id: String,
    pub slug: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub verification_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<String>,
}

impl From<Organization> for OrganizationView {
    fn from(org: Organization) -> Self {
        Self {
            id: org.id.to_string(),
            slug: org.slug,
            display_name: org.display_name,
            description: org.description,
            website: org.website,
            verification_status: org.verification_status.to_string(),
            verification_notes: org.verification_notes,
            verified_at: org.verified_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Derive a unique organization slug from the owner's name
fn derive_slug(full_name: &str, owner_id: uuid::Uuid) -> String {
    let base: String = full_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let base = base.trim_matches('-').to_string();
    let id_hex = owner_id.simple().to_string();
    let suffix = &id_hex[..8];

    if base.is_empty() {
        format!("org-{suffix}")
    } else {
        format!("{base}-{suffix}")
    }
}

/// The own organization profile page. Created lazily (pending) on first
/// visit; admin resolves to the explicit platform organization.
pub async fn my_organization(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<OrganizationView>> {
    page_guard(&actor, "/dashboard/org")?;

    let repo = Repository::new(state.db.clone());

    let organization = if actor.role.is_admin() {
        repo.ensure_admin_organization(actor.id).await?
    } else {
        let profile = repo
            .find_profile(actor.id)
            .await?
            .ok_or_else(|| AppError::ProfileNotFound {
                id: actor.id.to_string(),
            })?;
        let slug = derive_slug(&profile.full_name, actor.id);
        repo.get_or_create_organization(actor.id, &profile.full_name, &slug)
            .await?
    };

    Ok(Json(organization.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, max = 200))]
    pub display_name: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(length(max = 200))]
    pub website: Option<String>,
}

/// Update the own organization's profile
pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<UpdateOrganizationRequest>,
) -> Result<Json<OrganizationView>> {
    page_guard(&actor, "/dashboard/org")?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let organization = repo
        .find_organization_by_owner(actor.id)
        .await?
        .ok_or_else(|| AppError::OrganizationNotFound {
            id: actor.id.to_string(),
        })?;

    let updated = repo
        .update_organization(
            organization.id,
            OrganizationChanges {
                display_name: request.display_name,
                description: request.description.map(Some),
                website: request.website.map(Some),
            },
        )
        .await?;

    Ok(Json(updated.into()))
}

#[derive(Serialize)]
pub struct LegalDocumentsResponse {
    pub verification_status: String,
    pub documents: serde_json::Value,
}

/// The legal documents page for the own organization
pub async fn legal_documents(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<LegalDocumentsResponse>> {
    page_guard(&actor, "/dashboard/legal")?;

    let repo = Repository::new(state.db.clone());
    let organization = repo
        .find_organization_by_owner(actor.id)
        .await?
        .ok_or_else(|| AppError::OrganizationNotFound {
            id: actor.id.to_string(),
        })?;

    Ok(Json(LegalDocumentsResponse {
        verification_status: organization.verification_status.to_string(),
        documents: organization.legal_documents,
    }))
}

/// Upload a legal document (multipart: `doc_type` + `file`)
pub async fn upload_legal_document(
    State(state): State<AppState>,
    actor: Actor,
    mut multipart: Multipart,
) -> Result<Json<LegalDocumentsResponse>> {
    page_guard(&actor, "/dashboard/legal")?;

    let mut doc_type: Option<String> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::Validation {
        message: format!("malformed upload: {e}"),
        field: None,
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("doc_type") => doc_type = Some(read_text_field(field, "doc_type").await?),
            Some("file") => file = Some(read_file_field(field).await?),
            _ => {}
        }
    }

    let doc_type = doc_type.ok_or_else(|| AppError::MissingField {
        field: "doc_type".to_string(),
    })?;
    let file = file.ok_or_else(|| AppError::MissingField {
        field: "file".to_string(),
    })?;

    let repo = Repository::new(state.db.clone());
    let organization = verification::upload_legal_document(
        &repo,
        state.store.as_ref(),
        &actor,
        LegalDocumentUpload {
            doc_type,
            filename: file.filename,
            content_type: file.content_type,
            bytes: file.bytes,
        },
    )
    .await?;

    Ok(Json(LegalDocumentsResponse {
        verification_status: organization.verification_status.to_string(),
        documents: organization.legal_documents,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_slug() {
        let id = uuid::Uuid::parse_str("a1b2c3d4-0000-0000-0000-000000000000").unwrap();
        assert_eq!(derive_slug("PT Sakura Indah", id), "pt-sakura-indah-a1b2c3d4");
        assert_eq!(derive_slug("---", id), "org-a1b2c3d4");
        assert!(samit_common::workflow::is_valid_slug(&derive_slug(
            "PT Sakura Indah",
            id
        )));
    }
}
