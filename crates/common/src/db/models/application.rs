//! Application entity
//!
//! Links an applicant to a job. At most one application per
//! (job, applicant) pair, enforced by a composite unique key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ApplicationStatus {
    #[sea_orm(string_value = "applied")]
    #[default]
    Applied,
    #[sea_orm(string_value = "shortlisted")]
    Shortlisted,
    #[sea_orm(string_value = "interview")]
    Interview,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "hired")]
    Hired,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Hired => "hired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Hired)
    }

    /// Forward transitions available to organization-side reviewers.
    /// Admin corrections bypass this table and are audited instead.
    pub fn can_progress_to(&self, to: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        match (self, to) {
            (Applied, Shortlisted | Interview | Rejected | Hired) => true,
            (Shortlisted, Interview | Rejected | Hired) => true,
            (Interview, Rejected | Hired) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub job_id: Uuid,

    pub applicant_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub cv_url: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub cover_letter: Option<String>,

    pub status: ApplicationStatus,

    #[sea_orm(column_type = "Text", nullable)]
    pub status_notes: Option<String>,

    pub applied_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::job::Entity",
        from = "Column::JobId",
        to = "super::job::Column::Id"
    )]
    Job,

    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::ApplicantId",
        to = "super::profile::Column::Id"
    )]
    Applicant,
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Job.def()
    }
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Applicant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn test_forward_transitions() {
        assert!(Applied.can_progress_to(Shortlisted));
        assert!(Applied.can_progress_to(Interview));
        assert!(Applied.can_progress_to(Rejected));
        assert!(Applied.can_progress_to(Hired));
        assert!(Shortlisted.can_progress_to(Interview));
        assert!(Interview.can_progress_to(Hired));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!Shortlisted.can_progress_to(Applied));
        assert!(!Interview.can_progress_to(Shortlisted));
        assert!(!Hired.can_progress_to(Applied));
        assert!(!Rejected.can_progress_to(Interview));
    }

    #[test]
    fn test_terminal_states() {
        assert!(Rejected.is_terminal());
        assert!(Hired.is_terminal());
        assert!(!Interview.is_terminal());
        // no self-transition
        assert!(!Applied.can_progress_to(Applied));
        assert!(!Hired.can_progress_to(Hired));
    }
}
