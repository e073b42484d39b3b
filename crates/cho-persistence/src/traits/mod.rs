//! Persistence traits for the storage abstraction layer
//!
//! This module defines the persistence traits that abstract over the two
//! storage backends: external database (MySQL/PostgreSQL) and in-memory.

pub mod appointment;
pub mod barangay;
pub mod report;
pub mod submission;
pub mod user;

pub use appointment::AppointmentPersistence;
pub use barangay::BarangayPersistence;
pub use report::ReportPersistence;
pub use submission::SubmissionPersistence;
pub use user::UserPersistence;

use async_trait::async_trait;

use crate::model::StorageMode;

/// Unified persistence service trait
///
/// This is the main interface for all storage operations. Handlers and
/// services hold it as `Arc<dyn PersistenceService>`.
#[async_trait]
pub trait PersistenceService:
    BarangayPersistence
    + UserPersistence
    + AppointmentPersistence
    + SubmissionPersistence
    + ReportPersistence
    + Send
    + Sync
{
    /// Get the current storage mode
    fn storage_mode(&self) -> StorageMode;

    /// Health check for the storage backend
    async fn health_check(&self) -> anyhow::Result<()>;
}
