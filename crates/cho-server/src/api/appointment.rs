//! Public booking plus the staff-side appointment list

use actix_web::{HttpRequest, HttpResponse, get, post, put, web};

use cho_persistence::model::{AppointmentCategoryInfo, AppointmentInfo, Page};
use cho_report::model::{AppointmentListQuery, AppointmentStatusRequest, BookAppointmentRequest};

use crate::{
    error::AppError,
    model::{AppState, response as common},
    secured,
    secured::Secured,
};

#[get("/appointment-categories")]
pub async fn categories(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let categories = data.appointments.categories().await?;
    Ok(common::Result::<Vec<AppointmentCategoryInfo>>::http_success(categories))
}

#[post("/appointments")]
pub async fn book(
    data: web::Data<AppState>,
    body: web::Json<BookAppointmentRequest>,
) -> Result<HttpResponse, AppError> {
    let appointment = data.appointments.book(body.into_inner()).await?;
    Ok(common::Result::<AppointmentInfo>::http_created(appointment))
}

#[get("/appointments")]
pub async fn list(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<AppointmentListQuery>,
) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).build());
    let page = data.appointments.list(params.into_inner()).await?;
    Ok(common::Result::<Page<AppointmentInfo>>::http_success(page))
}

#[get("/appointments/{id}")]
pub async fn get(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).build());
    let appointment = data.appointments.get(path.into_inner()).await?;
    Ok(common::Result::<AppointmentInfo>::http_success(appointment))
}

#[put("/appointments/status/{id}")]
pub async fn update_status(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<AppointmentStatusRequest>,
) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).build());
    let appointment = data
        .appointments
        .update_status(path.into_inner(), body.into_inner())
        .await?;
    Ok(common::Result::<AppointmentInfo>::http_success(appointment))
}
