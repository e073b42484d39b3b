// HTTP tests of the monthly reporting cycle: periods, submissions and reports

#[macro_use]
mod common;

use actix_web::test;
use serde_json::json;

use cho_persistence::Role;
use common::*;

#[actix_web::test]
async fn test_late_submission_shows_tardy_days() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, body) = create_period(&app, &admin, 2024, 6, "2024-06-10").await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["data"]["submissions_created"], 18);

    let (_, encoder) = encoder_token(&app, &admin, "encoder@cho.gov.ph", 1).await;
    let m1 = submission_id(&app, &encoder, 2024, 6, 1, "m1").await;

    ctx.clock.set(at(2024, 6, 15, 9));
    let req = test::TestRequest::post()
        .uri("/api/statuses/submit/report")
        .insert_header(bearer(&encoder))
        .set_json(m1_body(m1))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["data"][0]["status"], "submitted late");

    let req = test::TestRequest::post()
        .uri("/api/submissions/month-year")
        .insert_header(bearer(&encoder))
        .set_json(json!({"year": 2024, "month": 6}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    let rows = body["data"].as_array().unwrap();
    // the encoder only sees its own barangay
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row["barangay_id"] == 1));

    let row = rows.iter().find(|row| row["id"] == m1).unwrap();
    assert_eq!(row["status"], "submitted late");
    assert_eq!(row["tardy_days"], 5);

    let m2 = rows.iter().find(|row| row["report_type"] == "m2").unwrap();
    assert_eq!(m2["status"], "pending");
    assert!(m2["tardy_days"].is_null());
}

#[actix_web::test]
async fn test_duplicate_period_is_rejected() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, _) = create_period(&app, &admin, 2024, 6, "2024-06-10").await;
    assert_eq!(status, 201);

    let (status, body) = create_period(&app, &admin, 2024, 6, "2024-06-20").await;
    assert_eq!(status, 422);
    assert_eq!(body["code"], "DUPLICATE_TEMPLATE");
}

#[actix_web::test]
async fn test_period_validation() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, body) = create_period(&app, &admin, 2024, 13, "2024-06-10").await;
    assert_eq!(status, 422);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, _) = create_period(&app, &admin, 2024, 6, "June tenth").await;
    assert_eq!(status, 422);

    // a body that does not deserialize
    let req = test::TestRequest::post()
        .uri("/api/submissions")
        .insert_header(bearer(&admin))
        .set_json(json!({"report_year": "twenty", "report_month": 6, "due_date": "2024-06-10"}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 422);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[actix_web::test]
async fn test_encoder_cannot_create_period() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (_, encoder) = encoder_token(&app, &admin, "encoder@cho.gov.ph", 1).await;

    let (status, body) = create_period(&app, &encoder, 2024, 6, "2024-06-10").await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "UNAUTHORIZED_ROLE");
}

#[actix_web::test]
async fn test_resubmission_is_rejected() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    create_period(&app, &admin, 2024, 6, "2024-06-10").await;
    let (_, encoder) = encoder_token(&app, &admin, "encoder@cho.gov.ph", 1).await;
    let m1 = submission_id(&app, &encoder, 2024, 6, 1, "m1").await;

    let submit = || {
        test::TestRequest::post()
            .uri("/api/statuses/submit/report")
            .insert_header(bearer(&encoder))
            .set_json(m1_body(m1))
            .to_request()
    };
    let (status, _) = send(&app, submit()).await;
    assert_eq!(status, 201);

    let (status, body) = send(&app, submit()).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "ALREADY_SUBMITTED");

    let req = test::TestRequest::post()
        .uri("/api/statuses/report-status")
        .insert_header(bearer(&encoder))
        .set_json(json!({}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_encoder_cannot_submit_for_another_barangay() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    create_period(&app, &admin, 2024, 6, "2024-06-10").await;
    let (_, encoder) = encoder_token(&app, &admin, "encoder@cho.gov.ph", 1).await;
    let other = submission_id(&app, &admin, 2024, 6, 4, "m1").await;

    let req = test::TestRequest::post()
        .uri("/api/statuses/submit/report")
        .insert_header(bearer(&encoder))
        .set_json(m1_body(other))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "UNAUTHORIZED_BARANGAY");
}

#[actix_web::test]
async fn test_filtered_reports_aggregate_submitted_rows() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    create_period(&app, &admin, 2024, 6, "2024-06-10").await;
    let (_, encoder) = encoder_token(&app, &admin, "encoder@cho.gov.ph", 1).await;
    let m2 = submission_id(&app, &encoder, 2024, 6, 1, "m2").await;

    let req = test::TestRequest::post()
        .uri("/api/statuses/submit/report")
        .insert_header(bearer(&encoder))
        .set_json(json!({
            "m2ReportId": m2,
            "m2Report": {"morbidity": [
                {"age_category": "1-4", "disease_name": "Dengue", "male": 1, "female": 2},
                {"age_category": "5-9", "disease_name": "Dengue", "male": 3, "female": 0}
            ]}
        }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 201, "{body}");

    let req = test::TestRequest::post()
        .uri("/api/morbidity-reports/filtered")
        .insert_header(bearer(&encoder))
        .set_json(json!({"year": 2024, "month": 6}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["data"]["barangay_id"], 1);
    let dengue = &body["data"]["periods"]["2024-06"]["Dengue"];
    assert_eq!(dengue["male"], 4);
    assert_eq!(dengue["female"], 2);
    assert_eq!(dengue["total"], 6);

    let req = test::TestRequest::post()
        .uri("/api/morbidity-reports")
        .insert_header(bearer(&admin))
        .set_json(json!({"year": 2024}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_filtered_report_requires_month() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let req = test::TestRequest::post()
        .uri("/api/wra-reports/filtered")
        .insert_header(bearer(&admin))
        .set_json(json!({"year": 2024}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "PARAMETER_MISSING");
}

#[actix_web::test]
async fn test_encoder_without_barangay_is_forbidden_from_reports() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    ctx.insert_user("orphan@cho.gov.ph", Role::Encoder, None).await;
    let app = init_app!(ctx);
    let token = login(&app, "orphan@cho.gov.ph", ENCODER_PASSWORD).await;

    let req = test::TestRequest::post()
        .uri("/api/morbidity-reports/filtered")
        .insert_header(bearer(&token))
        .set_json(json!({"year": 2024, "month": 6}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 403);
    assert_eq!(body["code"], "NO_AFFILIATED_BARANGAY");
    assert_eq!(body["message"], "Encoder does not have an affiliated barangay.");
}

#[actix_web::test]
async fn test_pending_lists_unsubmitted_rows() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    create_period(&app, &admin, 2024, 6, "2024-06-10").await;
    let (_, encoder) = encoder_token(&app, &admin, "encoder@cho.gov.ph", 2).await;
    let m1 = submission_id(&app, &encoder, 2024, 6, 2, "m1").await;

    let req = test::TestRequest::post()
        .uri("/api/statuses/submit/report")
        .insert_header(bearer(&encoder))
        .set_json(m1_body(m1))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, 201);

    let req = test::TestRequest::get()
        .uri("/api/submissions/pending")
        .insert_header(bearer(&encoder))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, 200);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["report_type"], "m2");

    let req = test::TestRequest::get()
        .uri("/api/submissions/pending")
        .insert_header(bearer(&admin))
        .to_request();
    let (_, body) = send(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 17);
}

#[actix_web::test]
async fn test_min_max_are_stable() {
    let ctx = TestContext::new(at(2024, 6, 1, 8)).await;
    let app = init_app!(ctx);
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    create_period(&app, &admin, 2024, 5, "2024-05-10").await;
    create_period(&app, &admin, 2024, 6, "2024-06-10").await;

    let min_max = || {
        test::TestRequest::get()
            .uri("/api/submissions/min-max")
            .insert_header(bearer(&admin))
            .to_request()
    };
    let (status, first) = send(&app, min_max()).await;
    assert_eq!(status, 200);
    let (_, second) = send(&app, min_max()).await;
    assert_eq!(first, second);
}
