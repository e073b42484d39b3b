//! `SeaORM` Entity for service_data table (M1)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_data")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub report_status_id: i64,
    /// Some indicators are not broken down by age
    pub age_category_id: Option<i64>,
    pub service_name: String,
    pub indicator: String,
    pub male: i64,
    pub female: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub remarks: Option<String>,
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
