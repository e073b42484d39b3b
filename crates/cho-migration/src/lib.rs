//! Schema migrations and reference seeds
//!
//! Run through `cho-server migrate`, which applies every pending migration
//! in order.

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_accounts;
mod m20240101_000002_create_reports;
mod m20240101_000003_create_appointments;
mod m20240101_000004_seed_reference_data;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_accounts::Migration),
            Box::new(m20240101_000002_create_reports::Migration),
            Box::new(m20240101_000003_create_appointments::Migration),
            Box::new(m20240101_000004_seed_reference_data::Migration),
        ]
    }
}
