//! Raw detail rows and chart totals of the four report tables.
//!
//! Encoders are always scoped to their own barangay; admins pick one with
//! `barangay_id` or see every barangay when it is omitted.

use actix_web::{HttpRequest, HttpResponse, post, web};

use cho_persistence::model::{FamilyPlanningRow, MorbidityRow, ServiceDataRow, WraRow};
use cho_report::aggregate::{FamilyPlanningChart, MorbidityChart, ServiceDataChart, WraChart};
use cho_report::model::{FilteredReport, RawReportRequest, ReportFilterRequest};

use crate::{
    error::AppError,
    model::{AppState, response as common},
    secured,
    secured::Secured,
};

#[post("/family-planning-reports")]
pub async fn family_planning(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<RawReportRequest>,
) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let rows = data
        .reports
        .family_planning(&principal, body.into_inner())
        .await?;
    Ok(common::Result::<Vec<FamilyPlanningRow>>::http_success(rows))
}

#[post("/family-planning-reports/filtered")]
pub async fn family_planning_filtered(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<ReportFilterRequest>,
) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let report = data
        .reports
        .family_planning_filtered(&principal, body.into_inner())
        .await?;
    Ok(common::Result::<FilteredReport<FamilyPlanningChart>>::http_success(report))
}

#[post("/morbidity-reports")]
pub async fn morbidity(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<RawReportRequest>,
) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let rows = data.reports.morbidity(&principal, body.into_inner()).await?;
    Ok(common::Result::<Vec<MorbidityRow>>::http_success(rows))
}

#[post("/morbidity-reports/filtered")]
pub async fn morbidity_filtered(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<ReportFilterRequest>,
) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let report = data
        .reports
        .morbidity_filtered(&principal, body.into_inner())
        .await?;
    Ok(common::Result::<FilteredReport<MorbidityChart>>::http_success(report))
}

#[post("/service-data-reports")]
pub async fn service_data(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<RawReportRequest>,
) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let rows = data
        .reports
        .service_data(&principal, body.into_inner())
        .await?;
    Ok(common::Result::<Vec<ServiceDataRow>>::http_success(rows))
}

#[post("/service-data-reports/filtered")]
pub async fn service_data_filtered(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<ReportFilterRequest>,
) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let report = data
        .reports
        .service_data_filtered(&principal, body.into_inner())
        .await?;
    Ok(common::Result::<FilteredReport<ServiceDataChart>>::http_success(report))
}

#[post("/wra-reports")]
pub async fn wra(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<RawReportRequest>,
) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let rows = data.reports.wra(&principal, body.into_inner()).await?;
    Ok(common::Result::<Vec<WraRow>>::http_success(rows))
}

#[post("/wra-reports/filtered")]
pub async fn wra_filtered(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<ReportFilterRequest>,
) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let report = data
        .reports
        .wra_filtered(&principal, body.into_inner())
        .await?;
    Ok(common::Result::<FilteredReport<WraChart>>::http_success(report))
}
