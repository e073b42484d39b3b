//! Raw and chart-ready fetches of the report detail tables

use std::sync::Arc;

use cho_auth::Principal;
use cho_persistence::PersistenceService;
use cho_persistence::model::{DetailQuery, FamilyPlanningRow, MorbidityRow, ServiceDataRow, WraRow};

use crate::aggregate::{
    FamilyPlanningChart, MorbidityChart, ServiceDataChart, WraChart, family_planning, morbidity,
    service_data, wra,
};
use crate::model::{FilteredReport, RawReportRequest, ReportFilterRequest};

#[derive(Clone)]
pub struct ReportService {
    persistence: Arc<dyn PersistenceService>,
}

/// Resolved filter of a chart request
struct Window {
    query: DetailQuery,
    barangay_id: Option<i64>,
    start: cho_common::ReportPeriod,
    end: cho_common::ReportPeriod,
}

impl Window {
    fn report<T>(self, periods: T) -> FilteredReport<T> {
        FilteredReport {
            barangay_id: self.barangay_id,
            start: self.start,
            end: self.end,
            periods,
        }
    }
}

impl ReportService {
    pub fn new(persistence: Arc<dyn PersistenceService>) -> Self {
        Self { persistence }
    }

    fn raw_query(principal: &Principal, request: &RawReportRequest) -> anyhow::Result<DetailQuery> {
        Ok(DetailQuery {
            barangay_id: principal.scope_barangay(request.barangay_id)?,
            year: request.year,
            ..Default::default()
        })
    }

    /// Role scoping is checked before the period so that an encoder without
    /// a barangay always gets 403.
    fn window(principal: &Principal, request: &ReportFilterRequest) -> anyhow::Result<Window> {
        let barangay_id = principal.scope_barangay(request.barangay_id)?;
        let (start, end) = request.window()?;
        Ok(Window {
            query: DetailQuery {
                barangay_id,
                year: None,
                range: Some((start, end)),
                exclude_rejected: true,
            },
            barangay_id,
            start,
            end,
        })
    }

    pub async fn family_planning(
        &self,
        principal: &Principal,
        request: RawReportRequest,
    ) -> anyhow::Result<Vec<FamilyPlanningRow>> {
        let query = Self::raw_query(principal, &request)?;
        self.persistence.family_planning_find(&query).await
    }

    pub async fn family_planning_filtered(
        &self,
        principal: &Principal,
        request: ReportFilterRequest,
    ) -> anyhow::Result<FilteredReport<FamilyPlanningChart>> {
        let window = Self::window(principal, &request)?;
        let rows = self.persistence.family_planning_find(&window.query).await?;
        Ok(window.report(family_planning::summarize(&rows)))
    }

    pub async fn morbidity(
        &self,
        principal: &Principal,
        request: RawReportRequest,
    ) -> anyhow::Result<Vec<MorbidityRow>> {
        let query = Self::raw_query(principal, &request)?;
        self.persistence.morbidity_find(&query).await
    }

    pub async fn morbidity_filtered(
        &self,
        principal: &Principal,
        request: ReportFilterRequest,
    ) -> anyhow::Result<FilteredReport<MorbidityChart>> {
        let window = Self::window(principal, &request)?;
        let rows = self.persistence.morbidity_find(&window.query).await?;
        Ok(window.report(morbidity::summarize(&rows)))
    }

    pub async fn service_data(
        &self,
        principal: &Principal,
        request: RawReportRequest,
    ) -> anyhow::Result<Vec<ServiceDataRow>> {
        let query = Self::raw_query(principal, &request)?;
        self.persistence.service_data_find(&query).await
    }

    pub async fn service_data_filtered(
        &self,
        principal: &Principal,
        request: ReportFilterRequest,
    ) -> anyhow::Result<FilteredReport<ServiceDataChart>> {
        let window = Self::window(principal, &request)?;
        let rows = self.persistence.service_data_find(&window.query).await?;
        Ok(window.report(service_data::summarize(&rows)))
    }

    pub async fn wra(
        &self,
        principal: &Principal,
        request: RawReportRequest,
    ) -> anyhow::Result<Vec<WraRow>> {
        let query = Self::raw_query(principal, &request)?;
        self.persistence.wra_find(&query).await
    }

    pub async fn wra_filtered(
        &self,
        principal: &Principal,
        request: ReportFilterRequest,
    ) -> anyhow::Result<FilteredReport<WraChart>> {
        let window = Self::window(principal, &request)?;
        let rows = self.persistence.wra_find(&window.query).await?;
        Ok(window.report(wra::summarize(&rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReviewRequest, SubmitReportRequest};
    use crate::service::test_support::*;
    use cho_persistence::model::{ReportStatusKind, Role};

    fn filter(barangay_id: Option<i64>, year: i32, month: u32) -> ReportFilterRequest {
        ReportFilterRequest {
            barangay_id,
            year: Some(year),
            month: Some(month),
            ..Default::default()
        }
    }

    async fn submit_morbidity(ctx: &TestContext, principal: &Principal, barangay_id: i64, male: i64) -> i64 {
        let m2 = ctx.submission_id(barangay_id, "m2").await;
        let request: SubmitReportRequest = serde_json::from_value(serde_json::json!({
            "m2ReportId": m2,
            "m2Report": {"morbidity": [
                {"age_category": "1-4", "disease_name": "Dengue", "male": male, "female": 1},
                {"age_category": "5-9", "disease_name": "Dengue", "male": 1, "female": 0}
            ]}
        }))
        .unwrap();
        ctx.statuses.submit(principal, request).await.unwrap()[0].report_status_id
    }

    #[tokio::test]
    async fn test_encoder_without_barangay_gets_403_on_filtered() {
        let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
        let orphan = ctx.orphan_encoder();
        let err = ctx
            .reports
            .morbidity_filtered(&orphan, ReportFilterRequest::default())
            .await
            .unwrap_err();
        assert_eq!(error_code(&err), "NO_AFFILIATED_BARANGAY");
        assert_eq!(err.to_string(), "Encoder does not have an affiliated barangay.");
    }

    #[tokio::test]
    async fn test_missing_month_is_parameter_missing() {
        let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
        let request = ReportFilterRequest {
            year: Some(2024),
            ..Default::default()
        };
        let err = ctx.reports.wra_filtered(&ctx.admin, request).await.unwrap_err();
        assert_eq!(error_code(&err), "PARAMETER_MISSING");
    }

    #[tokio::test]
    async fn test_admin_totals_span_all_barangays_and_skip_rejected() {
        let ctx = TestContext::with_period(at(2024, 6, 1, 8), 2024, 6, "2024-06-10").await;
        submit_morbidity(&ctx, &ctx.admin, 1, 2).await;
        submit_morbidity(&ctx, &ctx.admin, 2, 3).await;
        let rejected = submit_morbidity(&ctx, &ctx.admin, 3, 100).await;
        ctx.statuses
            .review(
                rejected,
                ReviewRequest {
                    status: ReportStatusKind::Rejected,
                    admin_note: None,
                },
            )
            .await
            .unwrap();

        let report = ctx
            .reports
            .morbidity_filtered(&ctx.admin, filter(None, 2024, 6))
            .await
            .unwrap();
        let dengue = &report.periods["2024-06"]["Dengue"];
        assert_eq!(dengue.totals.male, 2 + 3 + 2);
        assert_eq!(dengue.totals.female, 2);
        assert_eq!(dengue.by_age_category["1-4"].male, 5);

        // raw fetch still lists the rejected rows
        let raw = ctx
            .reports
            .morbidity(&ctx.admin, RawReportRequest::default())
            .await
            .unwrap();
        assert_eq!(raw.len(), 6);
    }

    #[tokio::test]
    async fn test_encoder_is_scoped_to_own_barangay() {
        let ctx = TestContext::with_period(at(2024, 6, 1, 8), 2024, 6, "2024-06-10").await;
        let encoder = ctx.user(Role::Encoder, Some(2)).await;
        submit_morbidity(&ctx, &ctx.admin, 1, 2).await;
        submit_morbidity(&ctx, &encoder, 2, 3).await;

        let report = ctx
            .reports
            .morbidity_filtered(&encoder, filter(Some(1), 2024, 6))
            .await
            .unwrap();
        assert_eq!(report.barangay_id, Some(2));
        assert_eq!(report.periods["2024-06"]["Dengue"].totals.male, 4);

        let raw = ctx
            .reports
            .morbidity(
                &encoder,
                RawReportRequest {
                    barangay_id: Some(1),
                    year: Some(2024),
                },
            )
            .await
            .unwrap();
        assert!(raw.iter().all(|r| r.barangay_id == 2));
    }

    #[tokio::test]
    async fn test_window_excludes_other_periods() {
        let ctx = TestContext::with_period(at(2024, 6, 1, 8), 2024, 6, "2024-06-10").await;
        submit_morbidity(&ctx, &ctx.admin, 1, 2).await;

        let report = ctx
            .reports
            .morbidity_filtered(&ctx.admin, filter(None, 2024, 7))
            .await
            .unwrap();
        assert!(report.periods.is_empty());
    }

    #[tokio::test]
    async fn test_m1_charts() {
        let ctx = TestContext::with_period(at(2024, 6, 1, 8), 2024, 6, "2024-06-10").await;
        let m1 = ctx.submission_id(1, "m1").await;
        ctx.submit_m1(&ctx.admin, m1).await.unwrap();

        let fp = ctx
            .reports
            .family_planning_filtered(&ctx.admin, filter(Some(1), 2024, 6))
            .await
            .unwrap();
        assert_eq!(fp.periods["2024-06"]["Condom"].current_users_end, 4);

        let wra = ctx
            .reports
            .wra_filtered(&ctx.admin, filter(Some(1), 2024, 6))
            .await
            .unwrap();
        assert_eq!(wra.periods["2024-06"]["15-19"].population, 120);

        let services = ctx
            .reports
            .service_data_filtered(&ctx.admin, filter(Some(1), 2024, 6))
            .await
            .unwrap();
        assert_eq!(services.periods["2024-06"]["Immunization"]["BCG"].total, 5);

        assert_eq!(
            ctx.reports
                .family_planning(&ctx.admin, RawReportRequest::default())
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            ctx.reports
                .service_data(&ctx.admin, RawReportRequest::default())
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            ctx.reports
                .wra(&ctx.admin, RawReportRequest::default())
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
