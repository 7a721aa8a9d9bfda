//! Job entity
//!
//! Publicly listable only while `is_active` and the owning organization
//! is verified. The counters are denormalized and mutated exclusively
//! through atomic increments in the repository; they never decrease.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub organization_id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub slug: String,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(column_type = "Text")]
    pub category: String,

    #[sea_orm(column_type = "Text")]
    pub employment_type: String,

    /// Minimum JLPT level required, e.g. "N3"; none when Japanese is
    /// not required
    #[sea_orm(column_type = "Text", nullable)]
    pub jlpt_required: Option<String>,

    pub salary_min: Option<i64>,

    pub salary_max: Option<i64>,

    #[sea_orm(column_type = "Text", nullable)]
    pub location: Option<String>,

    pub is_active: bool,

    pub published_at: Option<DateTimeWithTimeZone>,

    pub applications_count: i32,

    pub views_count: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,

    #[sea_orm(has_many = "super::application::Entity")]
    Applications,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::application::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Applications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
