//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations with proper
//! error handling and transaction support. The workflow invariants live
//! at the store level: denormalized counters are single-statement atomic
//! increments, duplicate application/enrollment is a composite unique
//! key, and the single-default resume is a partial unique index.
//! Unique-violations surface as the matching conflict error.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, Statement,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Slug of the platform-owned organization used for admin job posts
pub const ADMIN_ORGANIZATION_SLUG: &str = "samit-official";

/// Display name of the platform-owned organization
pub const ADMIN_ORGANIZATION_NAME: &str = "SAMIT Official";

/// Input for creating a job row
#[derive(Debug, Clone)]
pub struct NewJobRecord {
    pub organization_id: Uuid,
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

/// Partial update for a job row
#[derive(Debug, Clone, Default)]
pub struct JobChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub employment_type: Option<String>,
    pub jlpt_required: Option<Option<String>>,
    pub salary_min: Option<Option<i64>>,
    pub salary_max: Option<Option<i64>>,
    pub location: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Partial update for a profile row
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub phone: Option<Option<String>>,
    pub bio: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub linkedin: Option<Option<String>>,
}

/// Partial update for an organization profile
#[derive(Debug, Clone, Default)]
pub struct OrganizationChanges {
    pub display_name: Option<String>,
    pub description: Option<Option<String>>,
    pub website: Option<Option<String>>,
}

/// Input for creating a class row
#[derive(Debug, Clone)]
pub struct NewClassRecord {
    pub slug: String,
    pub title: String,
    pub class_type: ClassType,
    pub jlpt_level: Option<String>,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub max_students: i32,
    pub meeting_link: Option<String>,
    pub is_active: bool,
}

/// Partial update for a class row
#[derive(Debug, Clone, Default)]
pub struct ClassChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub jlpt_level: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub max_students: Option<i32>,
    pub meeting_link: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Entity counts for the admin overview page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewCounts {
    pub profiles: u64,
    pub organizations_pending: u64,
    pub jobs: u64,
    pub applications: u64,
    pub classes: u64,
}

/// Map a unique-constraint violation to the expected conflict error,
/// anything else to a database error.
fn on_unique(err: DbErr, conflict: AppError) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => conflict,
        _ => AppError::Database(err),
    }
}

/// Append an audit entry on the given connection (usable inside a
/// transaction).
async fn insert_audit<C: ConnectionTrait>(
    conn: &C,
    actor_id: Uuid,
    action: &str,
    target_type: &str,
    target_id: Uuid,
    notes: Option<String>,
) -> Result<AuditEntry> {
    let now = chrono::Utc::now();

    let entry = AuditEntryActiveModel {
        id: Set(Uuid::new_v4()),
        actor_id: Set(actor_id),
        action: Set(action.to_string()),
        target_type: Set(target_type.to_string()),
        target_id: Set(target_id),
        notes: Set(notes),
        created_at: Set(now.into()),
    };

    entry.insert(conn).await.map_err(Into::into)
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Profile Operations
    // ========================================================================

    /// Find profile by ID
    pub async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>> {
        ProfileEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Update mutable profile fields. The role is immutable here.
    pub async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<Profile> {
        let profile = ProfileEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::ProfileNotFound { id: id.to_string() })?;

        let mut active: ProfileActiveModel = profile.into();

        if let Some(full_name) = changes.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(phone);
        }
        if let Some(bio) = changes.bio {
            active.bio = Set(bio);
        }
        if let Some(website) = changes.website {
            active.website = Set(website);
        }
        if let Some(linkedin) = changes.linkedin {
            active.linkedin = Set(linkedin);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(self.write_conn()).await.map_err(Into::into)
    }

    /// List profiles with pagination (admin user management)
    pub async fn list_profiles(&self, offset: u64, limit: u64) -> Result<(Vec<Profile>, u64)> {
        let paginator = ProfileEntity::find()
            .order_by_desc(ProfileColumn::CreatedAt)
            .paginate(self.read_conn(), limit);

        let total = paginator.num_items().await?;
        let profiles = paginator.fetch_page(offset / limit).await?;

        Ok((profiles, total))
    }

    // ========================================================================
    // Organization Operations
    // ========================================================================

    /// Find organization by ID
    pub async fn find_organization(&self, id: Uuid) -> Result<Option<Organization>> {
        OrganizationEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find the organization owned by a profile
    pub async fn find_organization_by_owner(&self, owner_id: Uuid) -> Result<Option<Organization>> {
        OrganizationEntity::find()
            .filter(OrganizationColumn::OwnerId.eq(owner_id))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find organization by slug
    pub async fn find_organization_by_slug(&self, slug: &str) -> Result<Option<Organization>> {
        OrganizationEntity::find()
            .filter(OrganizationColumn::Slug.eq(slug))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Get the owner's organization, creating a pending one on first
    /// access. Idempotent under concurrent first visits: the loser of the
    /// insert race re-reads the winner's row.
    pub async fn get_or_create_organization(
        &self,
        owner_id: Uuid,
        display_name: &str,
        slug: &str,
    ) -> Result<Organization> {
        if let Some(org) = self.find_organization_by_owner(owner_id).await? {
            return Ok(org);
        }

        let now = chrono::Utc::now();

        let org = OrganizationActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(owner_id),
            slug: Set(slug.to_string()),
            display_name: Set(display_name.to_string()),
            description: Set(None),
            website: Set(None),
            verification_status: Set(VerificationStatus::Pending),
            verification_notes: Set(None),
            verified_at: Set(None),
            legal_documents: Set(serde_json::json!({})),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        match org.insert(self.write_conn()).await {
            Ok(created) => Ok(created),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => self
                    .find_organization_by_owner(owner_id)
                    .await?
                    .ok_or_else(|| AppError::Duplicate {
                        message: format!("organization slug already taken: {slug}"),
                    }),
                _ => Err(AppError::Database(err)),
            },
        }
    }

    /// Get or create the platform-owned organization for admin job
    /// posts. Explicit and idempotent; born verified.
    pub async fn ensure_admin_organization(&self, admin_id: Uuid) -> Result<Organization> {
        if let Some(org) = self.find_organization_by_slug(ADMIN_ORGANIZATION_SLUG).await? {
            return Ok(org);
        }

        let now = chrono::Utc::now();

        let org = OrganizationActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(admin_id),
            slug: Set(ADMIN_ORGANIZATION_SLUG.to_string()),
            display_name: Set(ADMIN_ORGANIZATION_NAME.to_string()),
            description: Set(None),
            website: Set(None),
            verification_status: Set(VerificationStatus::Verified),
            verification_notes: Set(None),
            verified_at: Set(Some(now.into())),
            legal_documents: Set(serde_json::json!({})),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        match org.insert(self.write_conn()).await {
            Ok(created) => Ok(created),
            Err(err) => match err.sql_err() {
                // Concurrent ensure: re-read the winner
                Some(SqlErr::UniqueConstraintViolation(_)) => self
                    .find_organization_by_slug(ADMIN_ORGANIZATION_SLUG)
                    .await?
                    .ok_or_else(|| AppError::Internal {
                        message: "admin organization vanished during ensure".to_string(),
                    }),
                _ => Err(AppError::Database(err)),
            },
        }
    }

    /// Update organization profile fields
    pub async fn update_organization(
        &self,
        id: Uuid,
        changes: OrganizationChanges,
    ) -> Result<Organization> {
        let org = OrganizationEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::OrganizationNotFound { id: id.to_string() })?;

        let mut active: OrganizationActiveModel = org.into();

        if let Some(display_name) = changes.display_name {
            active.display_name = Set(display_name);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(website) = changes.website {
            active.website = Set(website);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Apply a verification decision together with its audit entry.
    /// Status, notes, timestamp and audit land in one transaction; the
    /// caller never observes a partial decision.
    pub async fn apply_verification(
        &self,
        organization_id: Uuid,
        status: VerificationStatus,
        notes: Option<String>,
        actor_id: Uuid,
        action: &str,
    ) -> Result<Organization> {
        let now = chrono::Utc::now();
        let txn = self.write_conn().begin().await?;

        let org = OrganizationEntity::find_by_id(organization_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::OrganizationNotFound {
                id: organization_id.to_string(),
            })?;

        if !org.verification_status.is_open_for_decision() {
            txn.rollback().await?;
            return Err(AppError::VerificationClosed {
                status: org.verification_status.to_string(),
            });
        }

        let mut active: OrganizationActiveModel = org.into();
        active.verification_status = Set(status);
        active.verification_notes = Set(notes.clone());
        active.verified_at = Set(match status {
            VerificationStatus::Verified => Some(now.into()),
            _ => None,
        });
        active.updated_at = Set(now.into());

        let updated = active.update(&txn).await?;

        insert_audit(&txn, actor_id, action, "organization", organization_id, notes).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Record a legal document upload in the organization's document map
    pub async fn upsert_legal_document(
        &self,
        organization_id: Uuid,
        doc_type: &str,
        url: &str,
        filename: &str,
    ) -> Result<Organization> {
        let now = chrono::Utc::now();
        let txn = self.write_conn().begin().await?;

        let org = OrganizationEntity::find_by_id(organization_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::OrganizationNotFound {
                id: organization_id.to_string(),
            })?;

        let mut documents = org.legal_documents.clone();
        if !documents.is_object() {
            documents = serde_json::json!({});
        }
        documents[doc_type] = serde_json::json!({
            "url": url,
            "filename": filename,
            "uploaded_at": now.to_rfc3339(),
        });

        let mut active: OrganizationActiveModel = org.into();
        active.legal_documents = Set(documents);
        active.updated_at = Set(now.into());

        let updated = active.update(&txn).await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// List organizations by verification status (admin review queue)
    pub async fn list_organizations_by_status(
        &self,
        status: Option<VerificationStatus>,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Organization>, u64)> {
        let mut query = OrganizationEntity::find().order_by_desc(OrganizationColumn::CreatedAt);

        if let Some(status) = status {
            query = query.filter(OrganizationColumn::VerificationStatus.eq(status));
        }

        let paginator = query.paginate(self.read_conn(), limit);
        let total = paginator.num_items().await?;
        let organizations = paginator.fetch_page(offset / limit).await?;

        Ok((organizations, total))
    }

    /// List verified organizations for the public companies directory
    pub async fn list_verified_organizations(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Organization>, u64)> {
        let paginator = OrganizationEntity::find()
            .filter(OrganizationColumn::VerificationStatus.eq(VerificationStatus::Verified))
            .order_by_desc(OrganizationColumn::VerifiedAt)
            .paginate(self.read_conn(), limit);

        let total = paginator.num_items().await?;
        let organizations = paginator.fetch_page(offset / limit).await?;

        Ok((organizations, total))
    }

    // ========================================================================
    // Job Operations
    // ========================================================================

    /// Create a new job
    pub async fn create_job(&self, record: NewJobRecord) -> Result<Job> {
        let now = chrono::Utc::now();

        let job = JobActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(record.organization_id),
            slug: Set(record.slug.clone()),
            title: Set(record.title),
            description: Set(record.description),
            category: Set(record.category),
            employment_type: Set(record.employment_type),
            jlpt_required: Set(record.jlpt_required),
            salary_min: Set(record.salary_min),
            salary_max: Set(record.salary_max),
            location: Set(record.location),
            is_active: Set(record.is_active),
            published_at: Set(record.is_active.then(|| now.into())),
            applications_count: Set(0),
            views_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        job.insert(self.write_conn()).await.map_err(|e| {
            on_unique(
                e,
                AppError::Duplicate {
                    message: format!("job slug already taken: {}", record.slug),
                },
            )
        })
    }

    /// Find job by ID
    pub async fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        JobEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find a publicly visible job by slug: active and owned by a
    /// verified organization. Anything else reads as absent.
    pub async fn find_public_job_by_slug(&self, slug: &str) -> Result<Option<(Job, Organization)>> {
        let row = JobEntity::find()
            .find_also_related(OrganizationEntity)
            .filter(JobColumn::Slug.eq(slug))
            .filter(JobColumn::IsActive.eq(true))
            .filter(OrganizationColumn::VerificationStatus.eq(VerificationStatus::Verified))
            .one(self.read_conn())
            .await?;

        Ok(row.and_then(|(job, org)| org.map(|org| (job, org))))
    }

    /// List publicly visible jobs with optional filters
    pub async fn list_public_jobs(
        &self,
        category: Option<&str>,
        employment_type: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<(Job, Organization)>, u64)> {
        let mut query = JobEntity::find()
            .find_also_related(OrganizationEntity)
            .filter(JobColumn::IsActive.eq(true))
            .filter(OrganizationColumn::VerificationStatus.eq(VerificationStatus::Verified))
            .order_by_desc(JobColumn::PublishedAt);

        if let Some(category) = category {
            query = query.filter(JobColumn::Category.eq(category));
        }
        if let Some(employment_type) = employment_type {
            query = query.filter(JobColumn::EmploymentType.eq(employment_type));
        }

        let paginator = query.paginate(self.read_conn(), limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(offset / limit).await?;

        let jobs = rows
            .into_iter()
            .filter_map(|(job, org)| org.map(|org| (job, org)))
            .collect();

        Ok((jobs, total))
    }

    /// List all jobs of an organization (owner dashboard, any status)
    pub async fn list_jobs_by_organization(&self, organization_id: Uuid) -> Result<Vec<Job>> {
        JobEntity::find()
            .filter(JobColumn::OrganizationId.eq(organization_id))
            .order_by_desc(JobColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Update job fields; first activation stamps `published_at`
    pub async fn update_job(&self, id: Uuid, changes: JobChanges) -> Result<Job> {
        let job = JobEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::JobNotFound { slug: id.to_string() })?;

        let first_activation = changes.is_active == Some(true) && job.published_at.is_none();

        let mut active: JobActiveModel = job.into();

        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(category) = changes.category {
            active.category = Set(category);
        }
        if let Some(employment_type) = changes.employment_type {
            active.employment_type = Set(employment_type);
        }
        if let Some(jlpt_required) = changes.jlpt_required {
            active.jlpt_required = Set(jlpt_required);
        }
        if let Some(salary_min) = changes.salary_min {
            active.salary_min = Set(salary_min);
        }
        if let Some(salary_max) = changes.salary_max {
            active.salary_max = Set(salary_max);
        }
        if let Some(location) = changes.location {
            active.location = Set(location);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        if first_activation {
            active.published_at = Set(Some(chrono::Utc::now().into()));
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Delete a job
    pub async fn delete_job(&self, id: Uuid) -> Result<bool> {
        let result = JobEntity::delete_by_id(id).exec(self.write_conn()).await?;
        Ok(result.rows_affected > 0)
    }

    /// Atomic view-count increment; the one side-effecting read
    pub async fn increment_views_count(&self, job_id: Uuid) -> Result<()> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE jobs SET views_count = views_count + 1 WHERE id = $1",
            vec![job_id.into()],
        );

        self.write_conn().execute(stmt).await?;
        Ok(())
    }

    // ========================================================================
    // Application Operations
    // ========================================================================

    /// Insert an application and bump the job's applications counter in
    /// one transaction. The composite unique key turns a concurrent
    /// double-submit into `AlreadyApplied`.
    pub async fn create_application(
        &self,
        job_id: Uuid,
        applicant_id: Uuid,
        cv_url: String,
        cover_letter: Option<String>,
    ) -> Result<Application> {
        let now = chrono::Utc::now();
        let txn = self.write_conn().begin().await?;

        let application = ApplicationActiveModel {
            id: Set(Uuid::new_v4()),
            job_id: Set(job_id),
            applicant_id: Set(applicant_id),
            cv_url: Set(cv_url),
            cover_letter: Set(cover_letter),
            status: Set(ApplicationStatus::Applied),
            status_notes: Set(None),
            applied_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let application = application
            .insert(&txn)
            .await
            .map_err(|e| on_unique(e, AppError::AlreadyApplied))?;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE jobs SET applications_count = applications_count + 1 WHERE id = $1",
            vec![job_id.into()],
        );
        txn.execute(stmt).await?;

        txn.commit().await?;
        Ok(application)
    }

    /// Find application by ID
    pub async fn find_application(&self, id: Uuid) -> Result<Option<Application>> {
        ApplicationEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find application with its job (for ownership checks)
    pub async fn find_application_with_job(
        &self,
        id: Uuid,
    ) -> Result<Option<(Application, Job)>> {
        let row = ApplicationEntity::find_by_id(id)
            .find_also_related(JobEntity)
            .one(self.read_conn())
            .await?;

        Ok(row.and_then(|(application, job)| job.map(|job| (application, job))))
    }

    /// List an applicant's applications, newest first
    pub async fn list_applications_by_applicant(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<(Application, Job)>> {
        let rows = ApplicationEntity::find()
            .find_also_related(JobEntity)
            .filter(ApplicationColumn::ApplicantId.eq(applicant_id))
            .order_by_desc(ApplicationColumn::AppliedAt)
            .all(self.read_conn())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(application, job)| job.map(|job| (application, job)))
            .collect())
    }

    /// List applications against all jobs of an organization
    pub async fn list_applications_for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<(Application, Job)>> {
        let rows = ApplicationEntity::find()
            .find_also_related(JobEntity)
            .filter(JobColumn::OrganizationId.eq(organization_id))
            .order_by_desc(ApplicationColumn::AppliedAt)
            .all(self.read_conn())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(application, job)| job.map(|job| (application, job)))
            .collect())
    }

    /// Update application status and notes
    pub async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<Application> {
        let application = ApplicationEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::ApplicationNotFound { id: id.to_string() })?;

        let mut active: ApplicationActiveModel = application.into();
        active.status = Set(status);
        if let Some(notes) = notes {
            active.status_notes = Set(Some(notes));
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(self.write_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Resume Operations
    // ========================================================================

    /// Count a user's resumes
    pub async fn count_resumes(&self, user_id: Uuid) -> Result<u64> {
        ResumeEntity::find()
            .filter(ResumeColumn::UserId.eq(user_id))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List a user's resumes, newest first
    pub async fn list_resumes(&self, user_id: Uuid) -> Result<Vec<Resume>> {
        ResumeEntity::find()
            .filter(ResumeColumn::UserId.eq(user_id))
            .order_by_desc(ResumeColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find resume by ID
    pub async fn find_resume(&self, id: Uuid) -> Result<Option<Resume>> {
        ResumeEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Insert a resume row; when it is the default, mirror the choice
    /// into the profile in the same transaction.
    pub async fn create_resume(
        &self,
        user_id: Uuid,
        title: String,
        file_url: String,
        file_size: i64,
        is_default: bool,
    ) -> Result<Resume> {
        let now = chrono::Utc::now();
        let txn = self.write_conn().begin().await?;

        let resume = ResumeActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            title: Set(title),
            file_url: Set(file_url),
            file_size: Set(file_size),
            is_default: Set(is_default),
            created_at: Set(now.into()),
        };

        let resume = resume.insert(&txn).await.map_err(|e| {
            on_unique(
                e,
                AppError::Duplicate {
                    message: "another resume is already marked default".to_string(),
                },
            )
        })?;

        if is_default {
            let stmt = Statement::from_sql_and_values(
                DbBackend::Postgres,
                "UPDATE profiles SET default_cv_id = $1, updated_at = NOW() WHERE id = $2",
                vec![resume.id.into(), user_id.into()],
            );
            txn.execute(stmt).await?;
        }

        txn.commit().await?;
        Ok(resume)
    }

    /// Swap the default resume in one transaction: clear the previous
    /// default, set the target, mirror into the profile. A failure rolls
    /// the whole swap back; a zero-default state cannot be committed.
    pub async fn set_default_resume(&self, user_id: Uuid, resume_id: Uuid) -> Result<()> {
        let txn = self.write_conn().begin().await?;

        let clear = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE resumes SET is_default = FALSE \
             WHERE user_id = $1 AND is_default = TRUE AND id <> $2",
            vec![user_id.into(), resume_id.into()],
        );
        txn.execute(clear).await?;

        let set = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE resumes SET is_default = TRUE WHERE id = $1 AND user_id = $2",
            vec![resume_id.into(), user_id.into()],
        );
        let result = txn.execute(set).await?;

        if result.rows_affected() == 0 {
            txn.rollback().await?;
            return Err(AppError::ResumeNotFound {
                id: resume_id.to_string(),
            });
        }

        let mirror = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE profiles SET default_cv_id = $1, updated_at = NOW() WHERE id = $2",
            vec![resume_id.into(), user_id.into()],
        );
        txn.execute(mirror).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Delete a resume row; clears the profile mirror when it pointed at
    /// the deleted row. Object-storage cleanup is the caller's concern.
    pub async fn delete_resume(&self, user_id: Uuid, resume_id: Uuid) -> Result<()> {
        let txn = self.write_conn().begin().await?;

        let deleted = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "DELETE FROM resumes WHERE id = $1 AND user_id = $2",
            vec![resume_id.into(), user_id.into()],
        );
        let result = txn.execute(deleted).await?;

        if result.rows_affected() == 0 {
            txn.rollback().await?;
            return Err(AppError::ResumeNotFound {
                id: resume_id.to_string(),
            });
        }

        let clear_mirror = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE profiles SET default_cv_id = NULL, updated_at = NOW() \
             WHERE id = $1 AND default_cv_id = $2",
            vec![user_id.into(), resume_id.into()],
        );
        txn.execute(clear_mirror).await?;

        txn.commit().await?;
        Ok(())
    }

    // ========================================================================
    // Class Operations
    // ========================================================================

    /// Create a class
    pub async fn create_class(&self, record: NewClassRecord) -> Result<Class> {
        let now = chrono::Utc::now();

        let class = ClassActiveModel {
            id: Set(Uuid::new_v4()),
            slug: Set(record.slug.clone()),
            title: Set(record.title),
            class_type: Set(record.class_type),
            jlpt_level: Set(record.jlpt_level),
            description: Set(record.description),
            start_date: Set(record.start_date),
            end_date: Set(record.end_date),
            max_students: Set(record.max_students),
            enrolled_count: Set(0),
            meeting_link: Set(record.meeting_link),
            is_active: Set(record.is_active),
            created_at: Set(now.into()),
        };

        class.insert(self.write_conn()).await.map_err(|e| {
            on_unique(
                e,
                AppError::Duplicate {
                    message: format!("class slug already taken: {}", record.slug),
                },
            )
        })
    }

    /// Find class by slug
    pub async fn find_class_by_slug(&self, slug: &str) -> Result<Option<Class>> {
        ClassEntity::find()
            .filter(ClassColumn::Slug.eq(slug))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find class by ID
    pub async fn find_class(&self, id: Uuid) -> Result<Option<Class>> {
        ClassEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List classes with optional type filter
    pub async fn list_classes(
        &self,
        class_type: Option<ClassType>,
        only_active: bool,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Class>, u64)> {
        let mut query = ClassEntity::find().order_by_desc(ClassColumn::StartDate);

        if only_active {
            query = query.filter(ClassColumn::IsActive.eq(true));
        }
        if let Some(class_type) = class_type {
            query = query.filter(ClassColumn::ClassType.eq(class_type));
        }

        let paginator = query.paginate(self.read_conn(), limit);
        let total = paginator.num_items().await?;
        let classes = paginator.fetch_page(offset / limit).await?;

        Ok((classes, total))
    }

    /// Update class fields
    pub async fn update_class(&self, id: Uuid, changes: ClassChanges) -> Result<Class> {
        let class = ClassEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::ClassNotFound { slug: id.to_string() })?;

        let mut active: ClassActiveModel = class.into();

        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(jlpt_level) = changes.jlpt_level {
            active.jlpt_level = Set(jlpt_level);
        }
        if let Some(start_date) = changes.start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = changes.end_date {
            active.end_date = Set(end_date);
        }
        if let Some(max_students) = changes.max_students {
            active.max_students = Set(max_students);
        }
        if let Some(meeting_link) = changes.meeting_link {
            active.meeting_link = Set(meeting_link);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }

        active.update(self.write_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Enrollment Operations
    // ========================================================================

    /// Insert an enrollment and take one seat, in one transaction. The
    /// seat is taken with a guarded increment so the capacity check
    /// holds under concurrent enrollment; the unique key turns a repeat
    /// enrollment into `AlreadyEnrolled`.
    pub async fn create_enrollment(
        &self,
        class_id: Uuid,
        user_id: Uuid,
        notes: Option<String>,
    ) -> Result<ClassEnrollment> {
        let now = chrono::Utc::now();
        let txn = self.write_conn().begin().await?;

        let enrollment = ClassEnrollmentActiveModel {
            id: Set(Uuid::new_v4()),
            class_id: Set(class_id),
            user_id: Set(user_id),
            status: Set(EnrollmentStatus::Registered),
            notes: Set(notes),
            enrolled_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let enrollment = enrollment
            .insert(&txn)
            .await
            .map_err(|e| on_unique(e, AppError::AlreadyEnrolled))?;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE classes SET enrolled_count = enrolled_count + 1 \
             WHERE id = $1 AND enrolled_count < max_students",
            vec![class_id.into()],
        );
        let result = txn.execute(stmt).await?;

        if result.rows_affected() == 0 {
            txn.rollback().await?;
            return Err(AppError::ClassFull);
        }

        txn.commit().await?;
        Ok(enrollment)
    }

    /// Find enrollment with its class
    pub async fn find_enrollment_with_class(
        &self,
        id: Uuid,
    ) -> Result<Option<(ClassEnrollment, Class)>> {
        let row = ClassEnrollmentEntity::find_by_id(id)
            .find_also_related(ClassEntity)
            .one(self.read_conn())
            .await?;

        Ok(row.and_then(|(enrollment, class)| class.map(|class| (enrollment, class))))
    }

    /// List a user's enrollments with their classes
    pub async fn list_enrollments_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(ClassEnrollment, Class)>> {
        let rows = ClassEnrollmentEntity::find()
            .find_also_related(ClassEntity)
            .filter(ClassEnrollmentColumn::UserId.eq(user_id))
            .order_by_desc(ClassEnrollmentColumn::EnrolledAt)
            .all(self.read_conn())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(enrollment, class)| class.map(|class| (enrollment, class)))
            .collect())
    }

    /// List enrollments for a class (admin roster)
    pub async fn list_enrollments_for_class(&self, class_id: Uuid) -> Result<Vec<ClassEnrollment>> {
        ClassEnrollmentEntity::find()
            .filter(ClassEnrollmentColumn::ClassId.eq(class_id))
            .order_by_desc(ClassEnrollmentColumn::EnrolledAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Update enrollment status and notes
    pub async fn update_enrollment_status(
        &self,
        id: Uuid,
        status: EnrollmentStatus,
        notes: Option<String>,
    ) -> Result<ClassEnrollment> {
        let enrollment = ClassEnrollmentEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::EnrollmentNotFound { id: id.to_string() })?;

        let mut active: ClassEnrollmentActiveModel = enrollment.into();
        active.status = Set(status);
        if let Some(notes) = notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(self.write_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Audit Operations
    // ========================================================================

    /// Append an audit entry outside a transaction
    pub async fn append_audit(
        &self,
        actor_id: Uuid,
        action: &str,
        target_type: &str,
        target_id: Uuid,
        notes: Option<String>,
    ) -> Result<AuditEntry> {
        insert_audit(
            self.write_conn(),
            actor_id,
            action,
            target_type,
            target_id,
            notes,
        )
        .await
    }

    /// List audit entries, newest first
    pub async fn list_audit(&self, offset: u64, limit: u64) -> Result<(Vec<AuditEntry>, u64)> {
        let paginator = AuditEntryEntity::find()
            .order_by_desc(AuditEntryColumn::CreatedAt)
            .paginate(self.read_conn(), limit);

        let total = paginator.num_items().await?;
        let entries = paginator.fetch_page(offset / limit).await?;

        Ok((entries, total))
    }

    // ========================================================================
    // Admin Overview
    // ========================================================================

    /// Entity counts for the admin overview dashboard
    pub async fn admin_overview(&self) -> Result<OverviewCounts> {
        let conn = self.read_conn();

        let profiles = ProfileEntity::find().count(conn).await?;
        let organizations_pending = OrganizationEntity::find()
            .filter(OrganizationColumn::VerificationStatus.eq(VerificationStatus::Pending))
            .count(conn)
            .await?;
        let jobs = JobEntity::find().count(conn).await?;
        let applications = ApplicationEntity::find().count(conn).await?;
        let classes = ClassEntity::find().count(conn).await?;

        Ok(OverviewCounts {
            profiles,
            organizations_pending,
            jobs,
            applications,
            classes,
        })
    }
}
