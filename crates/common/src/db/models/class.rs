//! Class entity for language courses
//!
//! Schedule status is derived from the date window at read time and is
//! never stored.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Course format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ClassType {
    /// Conversation practice
    #[sea_orm(string_value = "kaiwa")]
    Kaiwa,
    /// Intensive course
    #[sea_orm(string_value = "intensif")]
    Intensif,
    /// JLPT preparation
    #[sea_orm(string_value = "jlpt")]
    Jlpt,
}

/// Derived schedule state, computed from the date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl ScheduleStatus {
    pub fn for_window(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Self {
        if today < start {
            ScheduleStatus::Upcoming
        } else if today > end {
            ScheduleStatus::Completed
        } else {
            ScheduleStatus::Ongoing
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScheduleStatus::Upcoming => "upcoming",
            ScheduleStatus::Ongoing => "ongoing",
            ScheduleStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub slug: String,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    pub class_type: ClassType,

    /// Target JLPT level for jlpt-type classes, e.g. "N4"
    #[sea_orm(column_type = "Text", nullable)]
    pub jlpt_level: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub start_date: Date,

    pub end_date: Date,

    pub max_students: i32,

    pub enrolled_count: i32,

    /// Online meeting link, surfaced only to confirmed enrollees
    #[sea_orm(column_type = "Text", nullable)]
    pub meeting_link: Option<String>,

    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Schedule status relative to `today`
    pub fn schedule_status(&self, today: NaiveDate) -> ScheduleStatus {
        ScheduleStatus::for_window(self.start_date, self.end_date, today)
    }

    pub fn is_full(&self) -> bool {
        self.enrolled_count >= self.max_students
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::class_enrollment::Entity")]
    Enrollments,
}

impl Related<super::class_enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_schedule_status_windows() {
        let start = d("2026-09-01");
        let end = d("2026-11-30");

        assert_eq!(
            ScheduleStatus::for_window(start, end, d("2026-08-15")),
            ScheduleStatus::Upcoming
        );
        assert_eq!(
            ScheduleStatus::for_window(start, end, d("2026-09-01")),
            ScheduleStatus::Ongoing
        );
        assert_eq!(
            ScheduleStatus::for_window(start, end, d("2026-11-30")),
            ScheduleStatus::Ongoing
        );
        assert_eq!(
            ScheduleStatus::for_window(start, end, d("2026-12-01")),
            ScheduleStatus::Completed
        );
    }
}
