//! API handlers module

pub mod admin;
pub mod applications;
pub mod classes;
pub mod dashboard;
pub mod health;
pub mod jobs;
pub mod organizations;
pub mod resumes;

use axum::extract::multipart::Field;
use samit_common::{
    auth::Actor,
    errors::{AppError, Result},
    policy::{self, PolicyDecision},
};
use serde::Deserialize;

/// Page-level guard. Every dashboard handler applies this in addition
/// to the edge middleware; a role mismatch produces the same redirect
/// the policy prescribes. Deliberately redundant with the edge check.
pub(crate) fn page_guard(actor: &Actor, path: &str) -> Result<()> {
    match policy::evaluate(path, Some(actor.role)) {
        PolicyDecision::Allow => Ok(()),
        decision => Err(AppError::AuthRedirect {
            location: decision
                .location()
                .unwrap_or_else(|| policy::DASHBOARD_ROUTE.to_string()),
        }),
    }
}

/// Common pagination query parameters
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageParams {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl PageParams {
    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}

/// A file read out of a multipart field
pub(crate) struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Read a multipart file field into memory
pub(crate) async fn read_file_field(field: Field<'_>) -> Result<UploadedFile> {
    let filename = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation {
            message: format!("failed to read upload: {e}"),
            field: Some("file".to_string()),
        })?
        .to_vec();

    Ok(UploadedFile {
        filename,
        content_type,
        bytes,
    })
}

/// Read a multipart text field
pub(crate) async fn read_text_field(field: Field<'_>, name: &str) -> Result<String> {
    field.text().await.map_err(|e| AppError::Validation {
        message: format!("failed to read {name}: {e}"),
        field: Some(name.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use samit_common::db::models::Role;
    use uuid::Uuid;

    #[test]
    fn test_page_guard_redirects_on_role_mismatch() {
        let seeker = Actor::new(Uuid::new_v4(), "u@samit.id", Role::User);
        let err = page_guard(&seeker, "/dashboard/admin/overview").unwrap_err();
        match err {
            AppError::AuthRedirect { location } => assert_eq!(location, "/dashboard"),
            other => panic!("expected redirect, got {other:?}"),
        }

        assert!(page_guard(&seeker, "/dashboard/profile").is_ok());

        let admin = Actor::new(Uuid::new_v4(), "a@samit.id", Role::Admin);
        assert!(page_guard(&admin, "/dashboard/admin/overview").is_ok());
    }

    #[test]
    fn test_page_params_clamping() {
        let params = PageParams {
            offset: None,
            limit: Some(10_000),
        };
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), 100);

        let params = PageParams {
            offset: Some(40),
            limit: Some(0),
        };
        assert_eq!(params.limit(), 1);
        assert_eq!(params.offset(), 40);
    }
}
