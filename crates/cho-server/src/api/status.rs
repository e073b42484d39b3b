use actix_web::{HttpRequest, HttpResponse, post, put, web};

use cho_persistence::model::{StatusRow, SubmittedBounds};
use cho_report::model::{ReviewRequest, StatusFilterRequest, SubmitReportRequest, SubmitReportResult};

use crate::{
    error::AppError,
    model::{AppState, response as common},
    secured,
    secured::Secured,
};

#[post("/statuses/submit/report")]
pub async fn submit(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<SubmitReportRequest>,
) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let results = data.statuses.submit(&principal, body.into_inner()).await?;
    Ok(common::Result::<Vec<SubmitReportResult>>::http_created(results))
}

#[post("/statuses/report-status")]
pub async fn report_status(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<StatusFilterRequest>,
) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let rows = data
        .statuses
        .report_status(&principal, body.into_inner())
        .await?;
    Ok(common::Result::<Vec<StatusRow>>::http_success(rows))
}

#[post("/statuses/min-max")]
pub async fn min_max(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let bounds = data.statuses.min_max(&principal).await?;
    Ok(common::Result::<SubmittedBounds>::http_success(bounds))
}

#[put("/statuses/review/{id}")]
pub async fn review(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<ReviewRequest>,
) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).admin().build());
    let row = data
        .statuses
        .review(path.into_inner(), body.into_inner())
        .await?;
    Ok(common::Result::<StatusRow>::http_success(row))
}
