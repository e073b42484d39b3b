//! Seeds barangays, age categories and appointment categories.

use cho_common::reference::{AGE_CATEGORIES, APPOINTMENT_CATEGORIES, BARANGAYS};
use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_accounts::Barangays;
use crate::m20240101_000002_create_reports::AgeCategories;
use crate::m20240101_000003_create_appointments::AppointmentCategories;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn build_error(e: impl std::fmt::Display) -> DbErr {
    DbErr::Migration(e.to_string())
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut barangays = Query::insert();
        barangays.into_table(Barangays::Table).columns([
            Barangays::Name,
            Barangays::CreatedAt,
            Barangays::UpdatedAt,
        ]);
        for name in BARANGAYS {
            barangays
                .values([
                    name.into(),
                    Expr::current_timestamp().into(),
                    Expr::current_timestamp().into(),
                ])
                .map_err(build_error)?;
        }
        manager.exec_stmt(barangays).await?;

        let mut age_categories = Query::insert();
        age_categories
            .into_table(AgeCategories::Table)
            .columns([AgeCategories::Name]);
        for name in AGE_CATEGORIES {
            age_categories.values([name.into()]).map_err(build_error)?;
        }
        manager.exec_stmt(age_categories).await?;

        let mut appointment_categories = Query::insert();
        appointment_categories
            .into_table(AppointmentCategories::Table)
            .columns([AppointmentCategories::Name]);
        for name in APPOINTMENT_CATEGORIES {
            appointment_categories
                .values([name.into()])
                .map_err(build_error)?;
        }
        manager.exec_stmt(appointment_categories).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(AppointmentCategories::Table)
                    .and_where(Expr::col(AppointmentCategories::Name).is_in(APPOINTMENT_CATEGORIES))
                    .to_owned(),
            )
            .await?;
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(AgeCategories::Table)
                    .and_where(Expr::col(AgeCategories::Name).is_in(AGE_CATEGORIES))
                    .to_owned(),
            )
            .await?;
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Barangays::Table)
                    .and_where(Expr::col(Barangays::Name).is_in(BARANGAYS))
                    .to_owned(),
            )
            .await
    }
}
