//! `SeaORM` Entity for morbidity_reports table (M2)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "morbidity_reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub report_status_id: i64,
    pub age_category_id: i64,
    pub disease_name: String,
    pub male: i64,
    pub female: i64,
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
