use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};

use cho_persistence::model::{AgeCategoryInfo, BarangayInfo};
use cho_report::model::BarangayRequest;

use crate::{
    error::AppError,
    model::{AppState, response as common},
    secured,
    secured::Secured,
};

#[get("/barangays")]
pub async fn list(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).build());
    let barangays = data.barangays.list().await?;
    Ok(common::Result::<Vec<BarangayInfo>>::http_success(barangays))
}

#[get("/barangays/{id}")]
pub async fn get(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).build());
    let barangay = data.barangays.get(path.into_inner()).await?;
    Ok(common::Result::<BarangayInfo>::http_success(barangay))
}

#[post("/barangays")]
pub async fn create(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<BarangayRequest>,
) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).admin().build());
    let barangay = data.barangays.create(body.into_inner()).await?;
    Ok(common::Result::<BarangayInfo>::http_created(barangay))
}

#[put("/barangays/{id}")]
pub async fn update(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<BarangayRequest>,
) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).admin().build());
    let barangay = data
        .barangays
        .update(path.into_inner(), body.into_inner())
        .await?;
    Ok(common::Result::<BarangayInfo>::http_success(barangay))
}

#[delete("/barangays/{id}")]
pub async fn remove(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).admin().build());
    data.barangays.delete(path.into_inner()).await?;
    Ok(common::Result::<()>::http_success(()))
}

#[get("/age-categories")]
pub async fn age_categories(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).build());
    let categories = data.barangays.age_categories().await?;
    Ok(common::Result::<Vec<AgeCategoryInfo>>::http_success(categories))
}
