use actix_web::{HttpResponse, get, http::header::ContentType, web};
use serde::Serialize;

use cho_common::error::DATA_ACCESS_ERROR;
use cho_persistence::model::StorageMode;

use crate::{error::AppError, model::{AppState, response as common}};

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    storage: StorageMode,
}

/// Liveness plus a persistence round trip. Answers 503 when storage is down.
#[get("/health")]
pub async fn health(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let storage = data.persistence.storage_mode();
    match data.persistence.health_check().await {
        Ok(()) => Ok(common::Result::<HealthStatus>::http_success(HealthStatus {
            status: "UP",
            storage,
        })),
        Err(e) => {
            tracing::warn!(error = %e, "persistence health check failed");
            Ok(common::Result::<HealthStatus>::http_response(
                503,
                DATA_ACCESS_ERROR.code,
                DATA_ACCESS_ERROR.message.to_string(),
                HealthStatus {
                    status: "DOWN",
                    storage,
                },
            ))
        }
    }
}

/// Prometheus text exposition. Empty until the recorder is installed.
#[get("/metrics")]
pub async fn prometheus(data: web::Data<AppState>) -> HttpResponse {
    let body = data
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(body)
}
