//! `SeaORM` Entity for report_submission_templates table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_submission_templates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub admin_id: i64,
    /// m1 | m2
    pub report_type: String,
    pub report_month: i32,
    pub report_year: i32,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AdminId",
        to = "super::users::Column::Id"
    )]
    Admin,
    #[sea_orm(has_many = "super::report_submissions::Entity")]
    ReportSubmissions,
}

impl Related<super::report_submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportSubmissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
