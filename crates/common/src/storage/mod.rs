//! Object storage abstraction
//!
//! Resume and legal-document binaries live in an S3-compatible store;
//! the platform only persists the returned URL. Upload constraints
//! (MIME allow-list, size cap) are enforced here, before any network
//! call is made.

use crate::config::StorageConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use std::collections::HashMap;
use std::sync::Mutex;

/// Maximum resume upload size (5 MB)
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

/// Maximum legal-document upload size (10 MB)
pub const MAX_LEGAL_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

const RESUME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

const LEGAL_DOCUMENT_TYPES: &[&str] = &["application/pdf", "image/jpeg", "image/png"];

/// What kind of document is being uploaded; selects the constraint set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Resume,
    LegalDocument,
}

impl UploadKind {
    pub fn allowed_types(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Resume => RESUME_TYPES,
            UploadKind::LegalDocument => LEGAL_DOCUMENT_TYPES,
        }
    }

    pub fn max_bytes(&self) -> usize {
        match self {
            UploadKind::Resume => MAX_RESUME_BYTES,
            UploadKind::LegalDocument => MAX_LEGAL_DOCUMENT_BYTES,
        }
    }
}

/// Validate an upload against its constraint set. Runs before any call
/// to the store; a rejected upload never leaves the process.
pub fn validate_upload(kind: UploadKind, content_type: &str, size: usize) -> Result<()> {
    if !kind.allowed_types().contains(&content_type) {
        return Err(AppError::UnsupportedFileType {
            content_type: content_type.to_string(),
        });
    }

    if size == 0 {
        return Err(AppError::Validation {
            message: "uploaded file is empty".to_string(),
            field: Some("file".to_string()),
        });
    }

    if size > kind.max_bytes() {
        return Err(AppError::PayloadTooLarge {
            size,
            limit: kind.max_bytes(),
        });
    }

    Ok(())
}

/// Trait for document storage backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object and return its public URL
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String>;

    /// Delete an object by its public URL
    async fn delete(&self, url: &str) -> Result<()>;
}

/// S3-backed object store
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3ObjectStore {
    /// Build a client from the environment and storage configuration
    pub async fn new(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_types::region::Region::new(config.region.clone()));

        if let Some(ref endpoint) = config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn key_from_url<'a>(&self, url: &'a str) -> Result<&'a str> {
        url.strip_prefix(&self.public_base_url)
            .map(|key| key.trim_start_matches('/'))
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::Storage {
                message: format!("URL outside the managed bucket: {url}"),
            })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| AppError::Storage {
                message: format!("put {key}: {e}"),
            })?;

        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let key = self.key_from_url(url)?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage {
                message: format!("delete {key}: {e}"),
            })?;

        Ok(())
    }
}

/// In-memory store for tests and local development
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (String, usize)>>,
    fail_puts: bool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose puts always fail, for upload-failure paths
    pub fn failing() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_puts: true,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, url: &str) -> bool {
        self.objects.lock().unwrap().contains_key(url)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        if self.fail_puts {
            return Err(AppError::Storage {
                message: "memory store configured to fail".to_string(),
            });
        }

        let url = format!("memory://{key}");
        self.objects
            .lock()
            .unwrap()
            .insert(url.clone(), (content_type.to_string(), bytes.len()));
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_type_allow_list() {
        assert!(validate_upload(UploadKind::Resume, "application/pdf", 1024).is_ok());
        assert!(validate_upload(UploadKind::Resume, "application/msword", 1024).is_ok());
        assert!(matches!(
            validate_upload(UploadKind::Resume, "image/png", 1024),
            Err(AppError::UnsupportedFileType { .. })
        ));
    }

    #[test]
    fn test_legal_document_type_allow_list() {
        assert!(validate_upload(UploadKind::LegalDocument, "image/png", 1024).is_ok());
        assert!(validate_upload(UploadKind::LegalDocument, "image/jpeg", 1024).is_ok());
        assert!(matches!(
            validate_upload(UploadKind::LegalDocument, "application/msword", 1024),
            Err(AppError::UnsupportedFileType { .. })
        ));
    }

    #[test]
    fn test_size_caps() {
        assert!(validate_upload(UploadKind::Resume, "application/pdf", MAX_RESUME_BYTES).is_ok());
        assert!(matches!(
            validate_upload(UploadKind::Resume, "application/pdf", MAX_RESUME_BYTES + 1),
            Err(AppError::PayloadTooLarge { .. })
        ));
        assert!(validate_upload(
            UploadKind::LegalDocument,
            "application/pdf",
            MAX_LEGAL_DOCUMENT_BYTES
        )
        .is_ok());
    }

    #[test]
    fn test_empty_upload_rejected() {
        assert!(matches!(
            validate_upload(UploadKind::Resume, "application/pdf", 0),
            Err(AppError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryObjectStore::new();
        let url = store
            .put("resumes/u1/cv.pdf", "application/pdf", vec![1, 2, 3])
            .await
            .unwrap();
        assert!(store.contains(&url));

        store.delete(&url).await.unwrap();
        assert!(!store.contains(&url));
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = MemoryObjectStore::failing();
        let err = store
            .put("resumes/u1/cv.pdf", "application/pdf", vec![1])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage { .. }));
        assert!(store.is_empty());
    }
}
