// Shared setup for the HTTP tests: an AppState over the in-memory backend
// with a fixed clock and a seeded admin account.

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    test,
};
use chrono::{NaiveDate, NaiveDateTime};
use config::Config;
use serde_json::{Value, json};

use cho_common::FixedClock;
use cho_persistence::model::NewUser;
use cho_persistence::{MemoryPersistService, PersistenceService, Role, UserPersistence};
use cho_server::model::{AppState, Configuration};

pub const TOKEN_SECRET: &str = "Y2hvLWludGVncmF0aW9uLXRlc3Qtc2VjcmV0LTAxMjM0NTY3ODlhYmNkZWY=";
pub const ADMIN_EMAIL: &str = "admin@cho.gov.ph";
pub const ADMIN_PASSWORD: &str = "admin-password-1";
pub const ENCODER_PASSWORD: &str = "encoder-password-1";

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

pub struct TestContext {
    pub state: Arc<AppState>,
    pub clock: Arc<FixedClock>,
    pub persistence: Arc<dyn PersistenceService>,
}

impl TestContext {
    pub async fn new(now: NaiveDateTime) -> Self {
        let config = Config::builder()
            .set_override("cho.storage", "memory")
            .unwrap()
            .set_override("cho.auth.token.secret", TOKEN_SECRET)
            .unwrap()
            .set_override("cho.notice.scheduler.enabled", false)
            .unwrap()
            .build()
            .unwrap();

        let clock = Arc::new(FixedClock::new(now));
        let persistence: Arc<dyn PersistenceService> = Arc::new(MemoryPersistService::seeded(now));
        let state = AppState::new(
            Configuration::from_config(config),
            persistence.clone(),
            clock.clone(),
        )
        .unwrap();
        state
            .users
            .seed_admin("Administrator", ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .unwrap();

        Self {
            state: Arc::new(state),
            clock,
            persistence,
        }
    }

    /// Account stored directly, bypassing the rule that encoders need a barangay
    pub async fn insert_user(&self, email: &str, role: Role, barangay_id: Option<i64>) {
        let password_hash = cho_auth::service::password::hash_password(ENCODER_PASSWORD).unwrap();
        self.persistence
            .user_create(
                NewUser {
                    name: email.to_string(),
                    email: email.to_string(),
                    password_hash,
                    role,
                    barangay_id,
                },
                at(2024, 1, 1, 0),
            )
            .await
            .unwrap();
    }
}

/// Builds the application the way the server does, with the API under `/api`.
macro_rules! init_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(cho_server::middleware::Authentication)
                .app_data(actix_web::web::Data::from($ctx.state.clone()))
                .configure(|cfg| cho_server::startup::configure(cfg, "/api")),
        )
        .await
    };
}

/// Sends a request and returns status and JSON body.
pub async fn send<S, B>(app: &S, req: actix_http::Request) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub async fn login<S, B>(app: &S, email: &str, password: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({"email": email, "password": password}))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, 200, "login failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

/// Creates an encoder of `barangay_id` through the admin API and logs it in.
pub async fn encoder_token<S, B>(app: &S, admin: &str, email: &str, barangay_id: i64) -> (i64, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/users")
        .insert_header(bearer(admin))
        .set_json(json!({
            "name": "Barangay Encoder",
            "email": email,
            "password": ENCODER_PASSWORD,
            "role": "encoder",
            "barangay_id": barangay_id,
        }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, 201, "user create failed: {body}");
    let id = body["data"]["id"].as_i64().unwrap();
    (id, login(app, email, ENCODER_PASSWORD).await)
}

/// Creates the submissions of a period through the admin API.
pub async fn create_period<S, B>(app: &S, admin: &str, year: i32, month: u32, due_date: &str) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/submissions")
        .insert_header(bearer(admin))
        .set_json(json!({"report_year": year, "report_month": month, "due_date": due_date}))
        .to_request();
    send(app, req).await
}

/// Id of the submission of `barangay_id` and `report_type` in a period.
pub async fn submission_id<S, B>(
    app: &S,
    token: &str,
    year: i32,
    month: u32,
    barangay_id: i64,
    report_type: &str,
) -> i64
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/submissions/month-year")
        .insert_header(bearer(token))
        .set_json(json!({"year": year, "month": month, "barangay_id": barangay_id}))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, 200, "submission filter failed: {body}");
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["report_type"] == report_type)
        .and_then(|row| row["id"].as_i64())
        .unwrap()
}

pub fn m1_body(submission_id: i64) -> Value {
    json!({
        "m1ReportId": submission_id,
        "m1Report": {
            "wra": [{"age_category": "15-19", "population": 120, "with_mfp_unmet_need": 7}],
            "familyPlanning": [{"age_category": "20-24", "fp_method": "Condom", "current_users_end": 4}],
            "serviceData": [{"service_name": "Immunization", "indicator": "BCG", "male": 3, "female": 2}]
        }
    })
}
