//! Report status and detail-row persistence trait

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::model::{
    DetailQuery, FamilyPlanningRow, MorbidityRow, ReportStatusKind, ServiceDataRow, StatusQuery,
    StatusRow, SubmitBundle, SubmitOutcome, SubmittedBounds, WraRow,
};

#[async_trait]
pub trait ReportPersistence: Send + Sync {
    /// Writes status rows and detail rows and flips each submission out of
    /// `pending`, all in one transaction. The flip only applies to rows still
    /// pending; a lost race fails with `ChoError::AlreadySubmitted` and
    /// nothing is kept.
    async fn report_submit(&self, bundle: SubmitBundle) -> anyhow::Result<Vec<SubmitOutcome>>;

    /// Ordered by submitted_at descending
    async fn status_find(&self, query: &StatusQuery) -> anyhow::Result<Vec<StatusRow>>;

    async fn status_find_by_id(&self, id: i64) -> anyhow::Result<Option<StatusRow>>;

    async fn status_submitted_bounds(
        &self,
        barangay_id: Option<i64>,
    ) -> anyhow::Result<SubmittedBounds>;

    async fn status_review(
        &self,
        id: i64,
        status: ReportStatusKind,
        admin_note: Option<String>,
        now: NaiveDateTime,
    ) -> anyhow::Result<Option<StatusRow>>;

    // ==================== Detail rows ====================

    async fn family_planning_find(&self, query: &DetailQuery)
    -> anyhow::Result<Vec<FamilyPlanningRow>>;

    async fn morbidity_find(&self, query: &DetailQuery) -> anyhow::Result<Vec<MorbidityRow>>;

    async fn service_data_find(&self, query: &DetailQuery) -> anyhow::Result<Vec<ServiceDataRow>>;

    async fn wra_find(&self, query: &DetailQuery) -> anyhow::Result<Vec<WraRow>>;
}
