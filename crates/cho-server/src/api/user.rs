use actix_web::{HttpRequest, HttpResponse, get, post, put, web};
use serde::Deserialize;

use cho_auth::model::{CreateUserRequest, UpdateUserRequest};
use cho_common::DEFAULT_PAGE_SIZE;
use cho_persistence::model::{Page, Role, UserInfo, UserQuery, UserStatus};

use crate::{
    error::AppError,
    model::{AppState, response as common},
    secured,
    secured::Secured,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPageParam {
    role: Option<Role>,
    status: Option<UserStatus>,
    #[serde(alias = "barangay_id")]
    barangay_id: Option<i64>,
    search: Option<String>,
    #[serde(alias = "page_no")]
    page_no: Option<u64>,
    #[serde(alias = "page_size")]
    page_size: Option<u64>,
}

#[get("/users")]
pub async fn search_page(
    req: HttpRequest,
    data: web::Data<AppState>,
    params: web::Query<SearchPageParam>,
) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).admin().build());

    let params = params.into_inner();
    let query = UserQuery {
        role: params.role,
        status: params.status,
        barangay_id: params.barangay_id,
        search: params.search.filter(|s| !s.trim().is_empty()),
    };
    let page = data
        .users
        .list(
            &query,
            params.page_no.unwrap_or(1),
            params.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 500),
        )
        .await?;

    Ok(common::Result::<Page<UserInfo>>::http_success(page))
}

#[get("/users/{id}")]
pub async fn get(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).admin().build());
    let user = data.users.get(path.into_inner()).await?;
    Ok(common::Result::<UserInfo>::http_success(user))
}

#[post("/users")]
pub async fn create(
    req: HttpRequest,
    data: web::Data<AppState>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).admin().build());
    let user = data.users.create(body.into_inner()).await?;
    Ok(common::Result::<UserInfo>::http_created(user))
}

#[put("/users/{id}")]
pub async fn update(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    secured!(Secured::builder(&req).admin().build());
    let user = data
        .users
        .update(path.into_inner(), body.into_inner())
        .await?;
    Ok(common::Result::<UserInfo>::http_success(user))
}

/// Disables the account and revokes every token it holds.
#[put("/users/disable/{id}")]
pub async fn disable(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).admin().build());
    let user = data.users.disable(&principal, path.into_inner()).await?;
    Ok(common::Result::<UserInfo>::http_success(user))
}
