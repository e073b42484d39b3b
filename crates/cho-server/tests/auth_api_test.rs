// HTTP tests of login, session cookies, role checks and account disabling

#[macro_use]
mod common;

use actix_web::test;
use serde_json::json;

use cho_persistence::Role;
use common::*;

#[actix_web::test]
async fn test_login_returns_token_and_user() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}))
        .to_request();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, 200);
    assert_eq!(body["code"], "SUCCESS");
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["user"]["role"], "admin");
    assert!(body["data"]["user"].get("password").is_none());
}

#[actix_web::test]
async fn test_login_with_wrong_password_is_401() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({"email": ADMIN_EMAIL, "password": "not-the-password"}))
        .to_request();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, 401);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

#[actix_web::test]
async fn test_blank_login_fields_are_422() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({"email": "", "password": ""}))
        .to_request();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, 422);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert!(body["data"]["email"].is_array());
}

#[actix_web::test]
async fn test_requests_without_token_are_401() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/api/user").to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 401);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let req = test::TestRequest::get()
        .uri("/api/user")
        .insert_header(bearer("not-a-jwt"))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 401);
}

#[actix_web::test]
async fn test_session_cookie_authenticates() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "cho_session")
        .map(|c| c.into_owned())
        .unwrap();
    assert!(cookie.http_only().unwrap_or(false));
    assert_eq!(cookie.path(), Some("/"));

    let req = test::TestRequest::get()
        .uri("/api/user")
        .cookie(cookie.clone())
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["email"], ADMIN_EMAIL);

    // a tampered cookie is ignored
    let mut tampered = cookie;
    tampered.set_value("garbage");
    let req = test::TestRequest::get()
        .uri("/api/user")
        .cookie(tampered)
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 401);
}

#[actix_web::test]
async fn test_auth_check_never_401() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/api/auth/check").to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["authenticated"], false);

    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let req = test::TestRequest::get()
        .uri("/api/auth/check")
        .insert_header(bearer(&token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["authenticated"], true);
    assert_eq!(body["data"]["user"]["email"], ADMIN_EMAIL);
}

#[actix_web::test]
async fn test_logout_revokes_token() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let req = test::TestRequest::post()
        .uri("/api/logout")
        .insert_header(bearer(&token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 200);

    let req = test::TestRequest::get()
        .uri("/api/user")
        .insert_header(bearer(&token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 401);
}

#[actix_web::test]
async fn test_expired_token_row_is_401() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    ctx.clock.advance(chrono::Duration::hours(9));
    let req = test::TestRequest::get()
        .uri("/api/user")
        .insert_header(bearer(&token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 401);
}

#[actix_web::test]
async fn test_disabled_user_loses_access() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (encoder_id, encoder) = encoder_token(&app, &admin, "encoder@cho.gov.ph", 1).await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/users/disable/{encoder_id}"))
        .insert_header(bearer(&admin))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "disabled");

    let req = test::TestRequest::get()
        .uri("/api/user")
        .insert_header(bearer(&encoder))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 401);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    // and cannot sign in again
    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_json(json!({"email": "encoder@cho.gov.ph", "password": ENCODER_PASSWORD}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "ACCOUNT_DISABLED");
}

#[actix_web::test]
async fn test_encoder_cannot_use_admin_endpoints() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (_, encoder) = encoder_token(&app, &admin, "encoder@cho.gov.ph", 2).await;

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(bearer(&encoder))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "UNAUTHORIZED_ROLE");

    let req = test::TestRequest::post()
        .uri("/api/barangays")
        .insert_header(bearer(&encoder))
        .set_json(json!({"name": "Poblacion"}))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 403);
}

#[actix_web::test]
async fn test_user_admin_lifecycle() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    // encoders need a barangay
    let req = test::TestRequest::post()
        .uri("/api/users")
        .insert_header(bearer(&admin))
        .set_json(json!({
            "name": "No Barangay",
            "email": "nobarangay@cho.gov.ph",
            "password": ENCODER_PASSWORD,
            "role": "encoder"
        }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 422);
    assert!(body["data"]["barangay_id"].is_array());

    let (encoder_id, _) = encoder_token(&app, &admin, "encoder@cho.gov.ph", 3).await;

    // email is unique
    let req = test::TestRequest::post()
        .uri("/api/users")
        .insert_header(bearer(&admin))
        .set_json(json!({
            "name": "Copy",
            "email": "encoder@cho.gov.ph",
            "password": ENCODER_PASSWORD,
            "role": "encoder",
            "barangay_id": 3
        }))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 422);

    let req = test::TestRequest::get()
        .uri("/api/users?role=encoder")
        .insert_header(bearer(&admin))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["totalCount"], 1);
    assert_eq!(body["data"]["pageItems"][0]["id"], encoder_id);

    let req = test::TestRequest::get()
        .uri("/api/users/999")
        .insert_header(bearer(&admin))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "RESOURCE_NOT_FOUND");
}

#[actix_web::test]
async fn test_encoder_without_barangay_can_sign_in() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    ctx.insert_user("orphan@cho.gov.ph", Role::Encoder, None).await;
    let app = init_app!(ctx);

    let token = login(&app, "orphan@cho.gov.ph", ENCODER_PASSWORD).await;
    let req = test::TestRequest::get()
        .uri("/api/user")
        .insert_header(bearer(&token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert!(body["data"]["barangay_id"].is_null());
}
