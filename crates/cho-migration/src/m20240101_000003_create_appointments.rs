//! Appointment categories and public bookings.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AppointmentCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AppointmentCategories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AppointmentCategories::Name)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Appointments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Appointments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Appointments::AppointmentCategoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Appointments::FullName).string_len(255).not_null())
                    .col(ColumnDef::new(Appointments::Email).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Appointments::ContactNumber)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Appointments::AppointmentDate).date().not_null())
                    .col(ColumnDef::new(Appointments::AppointmentTime).time().null())
                    .col(ColumnDef::new(Appointments::Notes).text().null())
                    .col(
                        ColumnDef::new(Appointments::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Appointments::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Appointments::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_appointments_category")
                            .from(Appointments::Table, Appointments::AppointmentCategoryId)
                            .to(AppointmentCategories::Table, AppointmentCategories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appointments_booking")
                    .table(Appointments::Table)
                    .col(Appointments::Email)
                    .col(Appointments::AppointmentCategoryId)
                    .col(Appointments::AppointmentDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Appointments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AppointmentCategories::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum AppointmentCategories {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Appointments {
    Table,
    Id,
    AppointmentCategoryId,
    FullName,
    Email,
    ContactNumber,
    AppointmentDate,
    AppointmentTime,
    Notes,
    Status,
    CreatedAt,
    UpdatedAt,
}
