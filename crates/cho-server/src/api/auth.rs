use actix_web::{
    HttpMessage, HttpRequest, HttpResponse,
    cookie::{Cookie, SameSite, time::Duration as CookieDuration},
    get, post, web,
};
use serde::Serialize;

use cho_auth::model::{AuthContext, LoginRequest};
use cho_common::{ChoError, SESSION_COOKIE, validate_request};
use cho_persistence::model::UserInfo;

use crate::{
    error::AppError,
    model::{AppState, response as common},
    secured,
    secured::Secured,
};

#[derive(Debug, Serialize)]
struct AuthCheck {
    authenticated: bool,
    user: Option<UserInfo>,
}

fn session_cookie(data: &AppState, value: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(data.configuration.cookie_secure())
        .finish()
}

#[post("/login")]
pub async fn login(
    data: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    validate_request(&body)?;

    let result = data.auth.login(&body.email, &body.password).await?;
    let sealed = data
        .session
        .encrypt(&result.token)
        .map_err(|e| ChoError::InternalError(format!("session cookie could not be sealed: {}", e)))?;

    let mut cookie = session_cookie(&data, sealed);
    cookie.set_max_age(CookieDuration::seconds(data.configuration.token_expire_seconds()));

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(common::Result::success(result)))
}

#[post("/logout")]
pub async fn logout(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    let token = req
        .extensions()
        .get::<AuthContext>()
        .and_then(|context| context.token.clone());

    data.auth.logout(&principal, token.as_deref()).await?;

    let mut cookie = session_cookie(&data, String::new());
    cookie.make_removal();

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(common::Result::success(())))
}

/// Never answers 401; reports whether the caller is signed in.
#[get("/auth/check")]
pub async fn check(req: HttpRequest) -> Result<HttpResponse, AppError> {
    let user = Secured::builder(&req).build().check().ok().map(|p| p.user);
    Ok(common::Result::<AuthCheck>::http_success(AuthCheck {
        authenticated: user.is_some(),
        user,
    }))
}

#[get("/user")]
pub async fn current_user(req: HttpRequest) -> Result<HttpResponse, AppError> {
    let principal = secured!(Secured::builder(&req).build());
    Ok(common::Result::<UserInfo>::http_success(principal.user))
}
