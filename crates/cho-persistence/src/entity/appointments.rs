//! `SeaORM` Entity for appointments table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub appointment_category_id: i64,
    pub full_name: String,
    pub email: String,
    pub contact_number: String,
    pub appointment_date: Date,
    pub appointment_time: Option<Time>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    /// pending | confirmed | completed | cancelled
    pub status: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::appointment_categories::Entity",
        from = "Column::AppointmentCategoryId",
        to = "super::appointment_categories::Column::Id"
    )]
    Category,
}

impl Related<super::appointment_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
