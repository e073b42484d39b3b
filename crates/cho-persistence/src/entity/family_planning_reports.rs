//! `SeaORM` Entity for family_planning_reports table (M1)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "family_planning_reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub report_status_id: i64,
    pub age_category_id: i64,
    pub fp_method: String,
    pub current_users_beginning: i64,
    pub new_acceptors_previous_month: i64,
    pub other_acceptors_present_month: i64,
    pub drop_outs_present_month: i64,
    pub current_users_end: i64,
    pub new_acceptors_present_month: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::report_statuses::Entity",
        from = "Column::ReportStatusId",
        to = "super::report_statuses::Column::Id"
    )]
    ReportStatus,
    #[sea_orm(
        belongs_to = "super::age_categories::Entity",
        from = "Column::AgeCategoryId",
        to = "super::age_categories::Column::Id"
    )]
    AgeCategory,
}

impl Related<super::report_statuses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReportStatus.def()
    }
}

impl Related<super::age_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AgeCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
