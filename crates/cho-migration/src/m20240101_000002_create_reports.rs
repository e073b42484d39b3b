//! Report templates, submissions, statuses and their detail rows.

use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_accounts::{Barangays, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

fn id_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn count_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .default(0)
        .to_owned()
}

/// Shared shape of the four detail tables: id, status link, age category link.
fn detail_table<T>(table: T, age_category_nullable: bool) -> TableCreateStatement
where
    T: IntoIden + Copy + 'static,
{
    let mut age_category = ColumnDef::new(Detail::AgeCategoryId);
    age_category.big_integer();
    if age_category_nullable {
        age_category.null();
    } else {
        age_category.not_null();
    }

    Table::create()
        .table(table)
        .if_not_exists()
        .col(id_col(Detail::Id))
        .col(
            ColumnDef::new(Detail::ReportStatusId)
                .big_integer()
                .not_null(),
        )
        .col(age_category)
        .foreign_key(
            ForeignKey::create()
                .from(table, Detail::ReportStatusId)
                .to(ReportStatuses::Table, ReportStatuses::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .from(table, Detail::AgeCategoryId)
                .to(AgeCategories::Table, AgeCategories::Id)
                .on_delete(ForeignKeyAction::Restrict),
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AgeCategories::Table)
                    .if_not_exists()
                    .col(id_col(AgeCategories::Id))
                    .col(
                        ColumnDef::new(AgeCategories::Name)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReportSubmissionTemplates::Table)
                    .if_not_exists()
                    .col(id_col(ReportSubmissionTemplates::Id))
                    .col(
                        ColumnDef::new(ReportSubmissionTemplates::AdminId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportSubmissionTemplates::ReportType)
                            .string_len(8)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportSubmissionTemplates::ReportMonth)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportSubmissionTemplates::ReportYear)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportSubmissionTemplates::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_templates_admin")
                            .from(
                                ReportSubmissionTemplates::Table,
                                ReportSubmissionTemplates::AdminId,
                            )
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uk_templates_period_type")
                    .table(ReportSubmissionTemplates::Table)
                    .col(ReportSubmissionTemplates::ReportYear)
                    .col(ReportSubmissionTemplates::ReportMonth)
                    .col(ReportSubmissionTemplates::ReportType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReportSubmissions::Table)
                    .if_not_exists()
                    .col(id_col(ReportSubmissions::Id))
                    .col(
                        ColumnDef::new(ReportSubmissions::ReportSubmissionTemplateId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportSubmissions::BarangayId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportSubmissions::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ReportSubmissions::DueAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportSubmissions::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportSubmissions::UpdatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submissions_template")
                            .from(
                                ReportSubmissions::Table,
                                ReportSubmissions::ReportSubmissionTemplateId,
                            )
                            .to(
                                ReportSubmissionTemplates::Table,
                                ReportSubmissionTemplates::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submissions_barangay")
                            .from(ReportSubmissions::Table, ReportSubmissions::BarangayId)
                            .to(Barangays::Table, Barangays::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uk_submissions_template_barangay")
                    .table(ReportSubmissions::Table)
                    .col(ReportSubmissions::ReportSubmissionTemplateId)
                    .col(ReportSubmissions::BarangayId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_submissions_status_due")
                    .table(ReportSubmissions::Table)
                    .col(ReportSubmissions::Status)
                    .col(ReportSubmissions::DueAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReportStatuses::Table)
                    .if_not_exists()
                    .col(id_col(ReportStatuses::Id))
                    .col(
                        ColumnDef::new(ReportStatuses::ReportSubmissionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportStatuses::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportStatuses::Status)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportStatuses::SubmittedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReportStatuses::AdminNote).text().null())
                    .col(
                        ColumnDef::new(ReportStatuses::ProjectedPopulation)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReportStatuses::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportStatuses::UpdatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_statuses_submission")
                            .from(ReportStatuses::Table, ReportStatuses::ReportSubmissionId)
                            .to(ReportSubmissions::Table, ReportSubmissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_statuses_user")
                            .from(ReportStatuses::Table, ReportStatuses::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                detail_table(WomenOfReproductiveAges::Table, false)
                    .col(count_col(WomenOfReproductiveAges::Population))
                    .col(count_col(WomenOfReproductiveAges::WithMfpUnmetNeed))
                    .col(count_col(WomenOfReproductiveAges::AcceptAnyMfp))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                detail_table(FamilyPlanningReports::Table, false)
                    .col(
                        ColumnDef::new(FamilyPlanningReports::FpMethod)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(count_col(FamilyPlanningReports::CurrentUsersBeginning))
                    .col(count_col(FamilyPlanningReports::NewAcceptorsPreviousMonth))
                    .col(count_col(FamilyPlanningReports::OtherAcceptorsPresentMonth))
                    .col(count_col(FamilyPlanningReports::DropOutsPresentMonth))
                    .col(count_col(FamilyPlanningReports::CurrentUsersEnd))
                    .col(count_col(FamilyPlanningReports::NewAcceptorsPresentMonth))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                detail_table(ServiceData::Table, true)
                    .col(
                        ColumnDef::new(ServiceData::ServiceName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceData::Indicator)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(count_col(ServiceData::Male))
                    .col(count_col(ServiceData::Female))
                    .col(ColumnDef::new(ServiceData::Remarks).text().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                detail_table(MorbidityReports::Table, false)
                    .col(
                        ColumnDef::new(MorbidityReports::DiseaseName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(count_col(MorbidityReports::Male))
                    .col(count_col(MorbidityReports::Female))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            MorbidityReports::Table.into_iden(),
            ServiceData::Table.into_iden(),
            FamilyPlanningReports::Table.into_iden(),
            WomenOfReproductiveAges::Table.into_iden(),
            ReportStatuses::Table.into_iden(),
            ReportSubmissions::Table.into_iden(),
            ReportSubmissionTemplates::Table.into_iden(),
            AgeCategories::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum AgeCategories {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum ReportSubmissionTemplates {
    Table,
    Id,
    AdminId,
    ReportType,
    ReportMonth,
    ReportYear,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ReportSubmissions {
    Table,
    Id,
    ReportSubmissionTemplateId,
    BarangayId,
    Status,
    DueAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ReportStatuses {
    Table,
    Id,
    ReportSubmissionId,
    UserId,
    Status,
    SubmittedAt,
    AdminNote,
    ProjectedPopulation,
    CreatedAt,
    UpdatedAt,
}

/// Columns every detail table has
#[derive(DeriveIden)]
enum Detail {
    Id,
    ReportStatusId,
    AgeCategoryId,
}

#[derive(DeriveIden, Clone, Copy)]
enum WomenOfReproductiveAges {
    Table,
    Population,
    WithMfpUnmetNeed,
    AcceptAnyMfp,
}

#[derive(DeriveIden, Clone, Copy)]
enum FamilyPlanningReports {
    Table,
    FpMethod,
    CurrentUsersBeginning,
    NewAcceptorsPreviousMonth,
    OtherAcceptorsPresentMonth,
    DropOutsPresentMonth,
    CurrentUsersEnd,
    NewAcceptorsPresentMonth,
}

#[derive(DeriveIden, Clone, Copy)]
enum ServiceData {
    Table,
    ServiceName,
    Indicator,
    Male,
    Female,
    Remarks,
}

#[derive(DeriveIden, Clone, Copy)]
enum MorbidityReports {
    Table,
    DiseaseName,
    Male,
    Female,
}
