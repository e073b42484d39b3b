//! HTTP server setup

use std::sync::Arc;
use std::time::Instant;

use actix_web::{
    App, HttpServer,
    dev::{Server, Service},
    middleware::Logger,
    web,
};

use crate::{api, error::extractor_error, metrics, middleware::Authentication, model::AppState};

/// Registers the extractor error handlers, the API under `context_path`
/// and the root-level health and metrics endpoints.
pub fn configure(cfg: &mut web::ServiceConfig, context_path: &str) {
    cfg.app_data(web::JsonConfig::default().error_handler(extractor_error))
        .app_data(web::QueryConfig::default().error_handler(extractor_error))
        .app_data(web::PathConfig::default().error_handler(extractor_error))
        .service(api::health::health)
        .service(api::health::prometheus)
        .service(api::route::routes(context_path));
}

/// Creates and binds the HTTP server.
pub fn main_server(app_state: Arc<AppState>) -> Result<Server, std::io::Error> {
    let context_path = app_state.configuration.server_context_path();
    let address = app_state.configuration.server_address();
    let port = app_state.configuration.server_port();
    let shutdown_timeout = app_state.configuration.shutdown_timeout();

    tracing::info!(
        address = %address,
        port,
        context_path = %context_path,
        "Starting HTTP server"
    );

    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Authentication)
            .wrap(Logger::default())
            .wrap_fn(|req, srv| {
                let started = Instant::now();
                let method = req.method().to_string();
                let fut = srv.call(req);
                async move {
                    let res = fut.await?;
                    let path = res
                        .request()
                        .match_pattern()
                        .unwrap_or_else(|| "unmatched".to_string());
                    metrics::record_http_request(&method, &path, res.status().as_u16(), started);
                    Ok(res)
                }
            })
            .app_data(web::Data::from(app_state.clone()))
            .configure(|cfg| configure(cfg, &context_path))
    })
    .shutdown_timeout(shutdown_timeout)
    .disable_signals()
    .bind((address, port))?
    .run())
}
