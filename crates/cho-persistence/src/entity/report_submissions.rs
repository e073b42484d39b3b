//! `SeaORM` Entity for report_submissions table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub report_submission_template_id: i64,
    pub barangay_id: i64,
    /// pending | submitted | submitted late
    pub status: String,
    pub due_at: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::report_submission_templates::Entity",
        from = "Column::ReportSubmissionTemplateId",
        to = "super::report_submission_templates::Column::Id"
    )]
    Template,
    #[sea_orm(
        belongs_to = "super::barangays::Entity",
        from = "Column::BarangayId",
        to = "super::barangays::Column::Id"
    )]
    Barangay,
    #[sea_orm(has_many = "super::report_statuses::Entity")]
    ReportStatuses,
}

impl Related<super::report_submission_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Template.def()
    }
}

impl Related<super::barangays::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Barangay.def()
    }
}

impl Related<super::report_statuses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportStatuses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
