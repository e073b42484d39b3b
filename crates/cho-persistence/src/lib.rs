//! CHO Persistence - Database entities and persistence layer
//!
//! This crate provides:
//! - SeaORM entity definitions
//! - Persistence trait abstractions over both storage backends
//! - Domain model types and joined read models

pub mod entity;
pub mod memory;
pub mod model;
pub mod sql;
pub mod traits;

// Re-export sea-orm for convenience
pub use sea_orm;

// Re-export entity prelude
pub use entity::prelude::*;

// Re-export persistence traits
pub use traits::{
    AppointmentPersistence, BarangayPersistence, PersistenceService, ReportPersistence,
    SubmissionPersistence, UserPersistence,
};

// Re-export SQL backend
pub use sql::ExternalDbPersistService;

// Re-export in-memory backend
pub use memory::MemoryPersistService;

// Re-export model types
pub use model::{
    AppointmentStatus, Page, ReportStatusKind, ReportType, Role, StorageMode, SubmissionStatus,
    UserInfo, UserStatus,
};
