use actix_web::{HttpRequest, HttpResponse, get, post, web};

use cho_persistence::model::{PeriodBounds, SubmissionBatch};
use cho_report::model::{
    BarangayReportsQuery, CreateSubmissionRequest, SubmissionFilterRequest, SubmissionView,
};

use crate::{
    error::AppError,
    model::{AppState, response as common},
    secured,
    secured::Secured,
};

/// Creates the M1 and M2 templates of a period and one pending submission
/// per barangay and template.
#[post("/submissions")]
pub async fn create(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<CreateSubmissionRequest>,
) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).admin().build());
    let batch = data
        .submissions
        .create(principal.id(), body.into_inner())
        .await?;
    Ok(common::Result::<SubmissionBatch>::http_created(batch))
}

#[post("/submissions/month-year")]
pub async fn filter(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<SubmissionFilterRequest>,
) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let rows = data.submissions.filter(&principal, body.into_inner()).await?;
    Ok(common::Result::<Vec<SubmissionView>>::http_success(rows))
}

#[get("/submissions/min-max")]
pub async fn min_max(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).build());
    let bounds = data.submissions.min_max().await?;
    Ok(common::Result::<PeriodBounds>::http_success(bounds))
}

#[get("/submissions/pending")]
pub async fn pending(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let rows = data.submissions.pending(&principal).await?;
    Ok(common::Result::<Vec<SubmissionView>>::http_success(rows))
}

#[get("/submissions/barangay-reports")]
pub async fn barangay_reports(
    req: HttpRequest,
    data: web::Data<AppState>,
    query: web::Query<BarangayReportsQuery>,
) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let rows = data
        .submissions
        .barangay_reports(&principal, query.into_inner())
        .await?;
    Ok(common::Result::<Vec<SubmissionView>>::http_success(rows))
}
