//! `SeaORM` Entity for users table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    /// admin | encoder
    pub role: String,
    pub barangay_id: Option<i64>,
    /// active | disabled
    pub status: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::barangays::Entity",
        from = "Column::BarangayId",
        to = "super::barangays::Column::Id"
    )]
    Barangay,
    #[sea_orm(has_many = "super::personal_access_tokens::Entity")]
    PersonalAccessTokens,
}

impl Related<super::barangays::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Barangay.def()
    }
}

impl Related<super::personal_access_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PersonalAccessTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
