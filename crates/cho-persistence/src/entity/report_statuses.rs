//! `SeaORM` Entity for report_statuses table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_statuses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub report_submission_id: i64,
    pub user_id: i64,
    /// pending | overdue | for verification | approved | rejected
    pub status: String,
    pub submitted_at: DateTime,
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_note: Option<String>,
    pub projected_population: Option<i64>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::report_submissions::Entity",
        from = "Column::ReportSubmissionId",
        to = "super::report_submissions::Column::Id"
    )]
    ReportSubmission,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::report_submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportSubmission.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
