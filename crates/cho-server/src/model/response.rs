//! HTTP response envelope
//!
//! Every endpoint answers `{code, message, data}`.

use actix_web::{HttpResponse, HttpResponseBuilder, http::StatusCode};
use serde::{Deserialize, Serialize};

use cho_common::error::SUCCESS;

/// Generic result wrapper for API responses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Result<T> {
    pub code: String,
    pub message: String,
    pub data: T,
}

impl<T> Result<T> {
    pub fn new(code: &str, message: String, data: T) -> Self {
        Result::<T> {
            code: code.to_string(),
            message,
            data,
        }
    }

    pub fn success(data: T) -> Result<T> {
        Result::<T> {
            code: SUCCESS.code.to_string(),
            message: SUCCESS.message.to_string(),
            data,
        }
    }

    pub fn http_success(data: impl Serialize) -> HttpResponse {
        HttpResponse::Ok().json(Result::success(data))
    }

    pub fn http_created(data: impl Serialize) -> HttpResponse {
        HttpResponse::Created().json(Result::success(data))
    }

    pub fn http_response(status: u16, code: &str, message: String, data: impl Serialize) -> HttpResponse {
        HttpResponseBuilder::new(
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        )
        .json(Result::new(code, message, data))
    }
}
