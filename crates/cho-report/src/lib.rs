//! CHO Report - monthly reporting workflow
//!
//! Covers the admin-created submission batches, barangay report submits,
//! admin review, chart-ready aggregation of the detail tables, pending
//! report notices, plus the barangay and appointment registries.

pub mod aggregate;
pub mod metrics;
pub mod model;
pub mod notice;
pub mod service;

pub use notice::{LogNoticeSender, NoticeJob, NoticeSender, NoticeSummary, WebhookNoticeSender};
pub use service::{
    AppointmentService, BarangayService, ReportService, StatusService, SubmissionService,
};
