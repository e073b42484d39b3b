// Authentication middleware for Actix-web
// Resolves the presented token to a principal and stores the outcome in the
// request extensions for the secured! macro

use std::rc::Rc;

use actix_service::forward_ready;
use actix_utils::future::{Ready, ok};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web::Data,
};
use futures::future::LocalBoxFuture;
use tracing::{debug, error};

use cho_auth::model::{AUTHORIZATION_HEADER, AuthContext, TOKEN_PREFIX};
use cho_common::{ChoError, SESSION_COOKIE};

use crate::model::AppState;

// Authentication middleware transformer
pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthenticationMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct AuthenticationMiddleware<S> {
    service: Rc<S>,
}

/// Extract the JWT from, in priority order:
/// 1. `Authorization: Bearer <token>` header
/// 2. the encrypted session cookie
fn extract_token(req: &ServiceRequest, state: &AppState) -> Option<String> {
    if let Some(header_val) = req.headers().get(AUTHORIZATION_HEADER)
        && let Ok(s) = header_val.to_str()
        && let Some(token) = s.trim().strip_prefix(TOKEN_PREFIX)
    {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    let cookie = req.cookie(SESSION_COOKIE)?;
    match state.session.decrypt(cookie.value()) {
        Ok(token) if !token.is_empty() => Some(token),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "ignoring unreadable session cookie");
            None
        }
    }
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            if Method::OPTIONS != *req.method() {
                let context = match req.app_data::<Data<AppState>>().cloned() {
                    Some(state) => match extract_token(&req, &state) {
                        Some(token) => resolve(&state, token).await,
                        None => AuthContext::default(),
                    },
                    None => {
                        error!("AppState not found in request app_data");
                        AuthContext::default()
                    }
                };

                // Always insert AuthContext so the secured! macro can inspect it
                req.extensions_mut().insert(context);
            }

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

async fn resolve(state: &AppState, token: String) -> AuthContext {
    match state.auth.resolve(&token).await {
        Ok(principal) => AuthContext::authenticated(principal, token),
        Err(e) => match e.downcast_ref::<ChoError>() {
            Some(ChoError::Unauthenticated(reason)) => AuthContext::rejected(reason.clone()),
            _ => {
                error!(error = ?e, "token resolution failed");
                AuthContext::rejected("token could not be verified")
            }
        },
    }
}
