//! Report submit and the report status queries

use std::sync::Arc;

use tracing::info;

use cho_auth::Principal;
use cho_common::{ChoError, Clock, validate_request};
use cho_persistence::PersistenceService;
use cho_persistence::model::{
    ReportDetails, ReportStatusKind, StatusQuery, StatusRow, SubmitBundle, SubmitEntry,
    SubmittedBounds,
};

use crate::metrics;
use crate::model::{ReviewRequest, StatusFilterRequest, SubmitReportRequest, SubmitReportResult};

#[derive(Clone)]
pub struct StatusService {
    persistence: Arc<dyn PersistenceService>,
    clock: Arc<dyn Clock>,
}

impl StatusService {
    pub fn new(persistence: Arc<dyn PersistenceService>, clock: Arc<dyn Clock>) -> Self {
        Self { persistence, clock }
    }

    /// Records a submission event with its detail rows and moves each
    /// referenced submission out of `pending`.
    ///
    /// Every id is checked before anything is written; the write itself is
    /// one transaction that re-checks `pending` when it flips the status.
    pub async fn submit(
        &self,
        principal: &Principal,
        request: SubmitReportRequest,
    ) -> anyhow::Result<Vec<SubmitReportResult>> {
        validate_request(&request)?;
        request.check_ids()?;

        let mut entries = Vec::with_capacity(2);
        if let Some(id) = request.m1_report_id {
            entries.push(self.prepare(principal, "m1ReportId", id, request.m1_details()).await?);
        }
        if let Some(id) = request.m2_report_id {
            entries.push(self.prepare(principal, "m2ReportId", id, request.m2_details()).await?);
        }

        let submitted_at = self.clock.now();
        let outcomes = self
            .persistence
            .report_submit(SubmitBundle {
                user_id: principal.id(),
                submitted_at,
                projected_population: request.projected_population,
                entries,
            })
            .await?;

        Ok(outcomes
            .into_iter()
            .map(|outcome| {
                metrics::record_report_submitted(outcome.status.as_str());
                info!(
                    user_id = principal.id(),
                    submission_id = outcome.submission_id,
                    report_status_id = outcome.report_status_id,
                    status = %outcome.status,
                    "report submitted"
                );
                SubmitReportResult {
                    report_status_id: outcome.report_status_id,
                    submission_id: outcome.submission_id,
                    status: outcome.status,
                    submitted_at,
                }
            })
            .collect())
    }

    async fn prepare(
        &self,
        principal: &Principal,
        field: &str,
        submission_id: i64,
        details: ReportDetails,
    ) -> anyhow::Result<SubmitEntry> {
        let row = self
            .persistence
            .submission_find_by_id(submission_id)
            .await?
            .ok_or_else(|| {
                ChoError::validation(field, format!("The selected {} is invalid.", field))
            })?;

        if row.report_type()? != details.report_type() {
            return Err(ChoError::validation(
                field,
                format!(
                    "The {} must reference a {} report submission.",
                    field,
                    details.report_type()
                ),
            )
            .into());
        }

        principal.ensure_barangay(row.barangay_id)?;

        if row.submission_status()?.is_submitted() {
            return Err(ChoError::AlreadySubmitted(submission_id).into());
        }

        Ok(SubmitEntry {
            submission_id,
            details,
        })
    }

    /// Submission events, role-scoped
    pub async fn report_status(
        &self,
        principal: &Principal,
        request: StatusFilterRequest,
    ) -> anyhow::Result<Vec<StatusRow>> {
        let barangay_id = principal.scope_barangay(request.barangay_id)?;
        self.persistence
            .status_find(&StatusQuery {
                year: request.year,
                month: request.month,
                barangay_id,
                status: request.status,
            })
            .await
    }

    /// Earliest and latest submission instants, role-scoped
    pub async fn min_max(&self, principal: &Principal) -> anyhow::Result<SubmittedBounds> {
        let barangay_id = principal.scope_barangay(None)?;
        self.persistence.status_submitted_bounds(barangay_id).await
    }

    /// Admin verdict on a submission event. Detail rows are left as they are.
    pub async fn review(&self, id: i64, request: ReviewRequest) -> anyhow::Result<StatusRow> {
        validate_request(&request)?;
        if !matches!(
            request.status,
            ReportStatusKind::Approved | ReportStatusKind::Rejected | ReportStatusKind::ForVerification
        ) {
            return Err(ChoError::validation(
                "status",
                "The status must be one of: approved, rejected, for verification.",
            )
            .into());
        }

        let admin_note = request
            .admin_note
            .map(|note| note.trim().to_string())
            .filter(|note| !note.is_empty());

        let row = self
            .persistence
            .status_review(id, request.status, admin_note, self.clock.now())
            .await?
            .ok_or_else(|| ChoError::NotFound(format!("report status {}", id)))?;

        info!(report_status_id = id, status = %request.status, "report status reviewed");
        Ok(row)
    }
}
