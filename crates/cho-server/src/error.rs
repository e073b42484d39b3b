// Error handling for the HTTP layer
// Maps classified ChoError failures onto status codes and the response envelope

use std::fmt::{Display, Formatter};

use actix_web::{HttpRequest, HttpResponse, error::ResponseError, http::StatusCode};
use tracing::error;

pub use cho_common::error::{
    DATA_ACCESS_ERROR, ErrorCode, FieldErrors, SERVER_ERROR, UNAUTHENTICATED,
};
pub use cho_common::ChoError;

use crate::model::response as common;

// Local wrapper so actix-web error handling can be implemented for anyhow errors
#[derive(Debug)]
pub struct AppError {
    inner: anyhow::Error,
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError { inner: value }
    }
}

impl From<ChoError> for AppError {
    fn from(value: ChoError) -> Self {
        AppError {
            inner: value.into(),
        }
    }
}

impl AppError {
    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    pub fn downcast_ref<E: std::error::Error + Send + Sync + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }
}

/// Status code of a classified failure
pub fn status_of(e: &ChoError) -> StatusCode {
    match e {
        ChoError::Validation { .. } | ChoError::DuplicateTemplate { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ChoError::BadRequest(_) | ChoError::AlreadySubmitted(_) => StatusCode::BAD_REQUEST,
        ChoError::Unauthenticated(_) | ChoError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ChoError::Forbidden { .. } => StatusCode::FORBIDDEN,
        ChoError::NotFound(_) => StatusCode::NOT_FOUND,
        ChoError::Conflict(_) | ChoError::DuplicateAppointment => StatusCode::CONFLICT,
        ChoError::DatabaseError(_) | ChoError::InternalError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Client-facing message of a classified failure
fn message_of(e: &ChoError) -> String {
    match e {
        ChoError::Validation { message, .. } => message.clone(),
        ChoError::Unauthenticated(_) => UNAUTHENTICATED.message.to_string(),
        ChoError::InvalidCredentials => {
            "These credentials do not match our records.".to_string()
        }
        ChoError::NotFound(what) => format!("The requested {} was not found.", what),
        ChoError::AlreadySubmitted(_) => "This report has already been submitted.".to_string(),
        ChoError::DuplicateTemplate { year, month } => format!(
            "Report submissions for {}-{:02} have already been created.",
            year, month
        ),
        ChoError::DuplicateAppointment => {
            "You already have an appointment for this category on that date.".to_string()
        }
        ChoError::DatabaseError(_) => DATA_ACCESS_ERROR.message.to_string(),
        ChoError::InternalError(message) => message.clone(),
        other => other.to_string(),
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.downcast_ref::<ChoError>()
            .map(status_of)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let Some(e) = self.downcast_ref::<ChoError>() else {
            error!(error = ?self.inner, "unhandled error");
            return common::Result::<()>::http_response(
                500,
                SERVER_ERROR.code,
                SERVER_ERROR.message.to_string(),
                (),
            );
        };

        let status = status_of(e);
        if status.is_server_error() {
            error!(error = ?self.inner, "request failed");
        }

        let code = e.error_code();
        match e {
            ChoError::Validation { errors, .. } => common::Result::<&FieldErrors>::http_response(
                status.as_u16(),
                code.code,
                message_of(e),
                errors,
            ),
            _ => common::Result::<()>::http_response(status.as_u16(), code.code, message_of(e), ()),
        }
    }
}

/// Maps JSON, query and path extraction failures to a 422 validation error.
pub fn extractor_error(
    err: impl std::error::Error,
    _req: &HttpRequest,
) -> actix_web::Error {
    AppError::from(ChoError::validation("body", err.to_string())).into()
}
