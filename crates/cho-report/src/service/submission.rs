//! Report submission batches and submission queries

use std::sync::Arc;

use tracing::{info, warn};

use cho_auth::Principal;
use cho_common::period::{end_of_day, parse_date};
use cho_common::{ChoError, Clock, ReportPeriod, validate_request};
use cho_persistence::PersistenceService;
use cho_persistence::model::{
    NewSubmissionBatch, PeriodBounds, SubmissionBatch, SubmissionQuery, SubmissionStatus,
};

use crate::metrics;
use crate::model::{
    BarangayReportsQuery, CreateSubmissionRequest, SubmissionFilterRequest, SubmissionView,
};
use crate::notice::NoticeJob;

/// Status filter accepted by the submission query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusFilter {
    Pending,
    /// Both `submitted` and `submitted late`
    Submitted,
    /// `submitted late` rows that really landed after their deadline
    SubmittedLate,
}

impl StatusFilter {
    fn parse(value: &str) -> Result<Self, ChoError> {
        match value.trim().parse::<SubmissionStatus>() {
            Ok(SubmissionStatus::Pending) => Ok(StatusFilter::Pending),
            Ok(SubmissionStatus::Submitted) => Ok(StatusFilter::Submitted),
            Ok(SubmissionStatus::SubmittedLate) => Ok(StatusFilter::SubmittedLate),
            Err(_) => Err(ChoError::validation(
                "status",
                "The status must be one of: pending, submitted, submitted late.",
            )),
        }
    }

    fn statuses(&self) -> Vec<SubmissionStatus> {
        match self {
            StatusFilter::Pending => vec![SubmissionStatus::Pending],
            StatusFilter::Submitted => {
                vec![SubmissionStatus::Submitted, SubmissionStatus::SubmittedLate]
            }
            StatusFilter::SubmittedLate => vec![SubmissionStatus::SubmittedLate],
        }
    }
}

#[derive(Clone)]
pub struct SubmissionService {
    persistence: Arc<dyn PersistenceService>,
    clock: Arc<dyn Clock>,
    notice: Option<Arc<NoticeJob>>,
}

impl SubmissionService {
    pub fn new(
        persistence: Arc<dyn PersistenceService>,
        clock: Arc<dyn Clock>,
        notice: Option<Arc<NoticeJob>>,
    ) -> Self {
        Self {
            persistence,
            clock,
            notice,
        }
    }

    /// Creates both report templates of a period and fans them out to every
    /// barangay, then runs the pending-notice job inline.
    pub async fn create(
        &self,
        admin_id: i64,
        request: CreateSubmissionRequest,
    ) -> anyhow::Result<SubmissionBatch> {
        validate_request(&request)?;
        let period = ReportPeriod::new(request.report_year, request.report_month)?;
        let due_at = end_of_day(parse_date("due_date", &request.due_date)?);

        if self
            .persistence
            .template_exists(period.year, period.month)
            .await?
        {
            return Err(ChoError::DuplicateTemplate {
                year: period.year,
                month: period.month,
            }
            .into());
        }

        let batch = self
            .persistence
            .submission_create_batch(NewSubmissionBatch {
                admin_id,
                period,
                due_at,
                created_at: self.clock.now(),
            })
            .await?;

        metrics::record_submissions_created(batch.submissions_created);
        info!(
            period = %period,
            due_at = %due_at,
            submissions = batch.submissions_created,
            "report submissions created"
        );

        if let Some(job) = &self.notice {
            match job.run(false).await {
                Ok(summary) => info!(sent = summary.notices_sent, "pending notices sent"),
                Err(e) => warn!(error = %e, "pending notice run failed after batch creation"),
            }
        }

        Ok(batch)
    }

    /// Earliest and latest report periods over all templates
    pub async fn min_max(&self) -> anyhow::Result<PeriodBounds> {
        self.persistence.submission_period_bounds().await
    }

    /// Submissions of one period, role-scoped, optionally by status.
    pub async fn filter(
        &self,
        principal: &Principal,
        request: SubmissionFilterRequest,
    ) -> anyhow::Result<Vec<SubmissionView>> {
        let barangay_id = principal.scope_barangay(request.barangay_id)?;
        let year = request.year.ok_or_else(|| ChoError::parameter_missing("year"))?;
        let month = request
            .month
            .ok_or_else(|| ChoError::parameter_missing("month"))?;
        let period = ReportPeriod::new(year, month)?;
        let filter = request
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(StatusFilter::parse)
            .transpose()?;

        let query = SubmissionQuery {
            year: Some(period.year),
            month: Some(period.month),
            barangay_id,
            statuses: filter.map(|f| f.statuses()).unwrap_or_default(),
            ..Default::default()
        };

        let rows = self.persistence.submission_find(&query).await?;
        Ok(rows
            .into_iter()
            .filter(|row| {
                filter != Some(StatusFilter::SubmittedLate)
                    || row.submitted_at.is_some_and(|at| at > row.due_at)
            })
            .map(SubmissionView::from)
            .collect())
    }

    /// Submissions still waiting for data. Encoders see their own barangay.
    pub async fn pending(&self, principal: &Principal) -> anyhow::Result<Vec<SubmissionView>> {
        let barangay_id = principal.scope_barangay(None)?;
        let query = SubmissionQuery {
            barangay_id,
            statuses: vec![SubmissionStatus::Pending],
            ..Default::default()
        };
        let mut rows = self.persistence.submission_find(&query).await?;
        rows.sort_by(|a, b| a.due_at.cmp(&b.due_at).then(a.id.cmp(&b.id)));
        Ok(rows.into_iter().map(SubmissionView::from).collect())
    }

    /// Every submission of one barangay, newest period first.
    pub async fn barangay_reports(
        &self,
        principal: &Principal,
        query: BarangayReportsQuery,
    ) -> anyhow::Result<Vec<SubmissionView>> {
        let barangay_id = principal
            .scope_barangay(query.barangay_id)?
            .ok_or_else(|| ChoError::parameter_missing("barangay_id"))?;
        let rows = self
            .persistence
            .submission_find(&SubmissionQuery {
                barangay_id: Some(barangay_id),
                ..Default::default()
            })
            .await?;
        Ok(rows.into_iter().map(SubmissionView::from).collect())
    }
}
