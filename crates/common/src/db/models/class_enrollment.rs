//! Class enrollment entity
//!
//! One enrollment per (class, user), enforced by a composite unique key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Enrollment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum EnrollmentStatus {
    #[sea_orm(string_value = "registered")]
    #[default]
    Registered,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Registered => "registered",
            EnrollmentStatus::Confirmed => "confirmed",
            EnrollmentStatus::Cancelled => "cancelled",
        }
    }

    /// Forward transitions for non-admin actors. Admin corrections
    /// bypass this table and are audited.
    pub fn can_progress_to(&self, to: EnrollmentStatus) -> bool {
        use EnrollmentStatus::*;
        match (self, to) {
            (Registered, Confirmed | Cancelled) => true,
            (Confirmed, Cancelled) => true,
            _ => false,
        }
    }

    /// The class meeting link becomes actionable once confirmed.
    pub fn grants_meeting_access(&self) -> bool {
        matches!(self, EnrollmentStatus::Confirmed)
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "class_enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub class_id: Uuid,

    pub user_id: Uuid,

    pub status: EnrollmentStatus,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    pub enrolled_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id"
    )]
    Class,

    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id"
    )]
    Student,
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use EnrollmentStatus::*;

    #[test]
    fn test_forward_transitions() {
        assert!(Registered.can_progress_to(Confirmed));
        assert!(Registered.can_progress_to(Cancelled));
        assert!(Confirmed.can_progress_to(Cancelled));
    }

    #[test]
    fn test_blocked_transitions() {
        assert!(!Confirmed.can_progress_to(Registered));
        assert!(!Cancelled.can_progress_to(Registered));
        assert!(!Cancelled.can_progress_to(Confirmed));
        assert!(!Registered.can_progress_to(Registered));
    }

    #[test]
    fn test_meeting_access() {
        assert!(Confirmed.grants_meeting_access());
        assert!(!Registered.grants_meeting_access());
        assert!(!Cancelled.grants_meeting_access());
    }
}
