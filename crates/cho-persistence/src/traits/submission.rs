//! Report submission persistence trait

use async_trait::async_trait;

use crate::model::{NewSubmissionBatch, PeriodBounds, SubmissionBatch, SubmissionQuery, SubmissionRow};

#[async_trait]
pub trait SubmissionPersistence: Send + Sync {
    /// True when any template exists for the period
    async fn template_exists(&self, year: i32, month: u32) -> anyhow::Result<bool>;

    /// Creates one template per report type and one pending submission per
    /// barangay per template, atomically. Fails with
    /// `ChoError::DuplicateTemplate` when the period is already taken.
    async fn submission_create_batch(
        &self,
        batch: NewSubmissionBatch,
    ) -> anyhow::Result<SubmissionBatch>;

    /// Joined submission rows, newest period first, then barangay name
    async fn submission_find(&self, query: &SubmissionQuery)
    -> anyhow::Result<Vec<SubmissionRow>>;

    async fn submission_find_by_id(&self, id: i64) -> anyhow::Result<Option<SubmissionRow>>;

    async fn submission_period_bounds(&self) -> anyhow::Result<PeriodBounds>;
}
