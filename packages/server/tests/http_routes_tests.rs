//! Router-level tests: envelopes, status codes, bearer auth and CORS.

mod common;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use common::{fixtures, send, TestHarness};
use portal_core::common::Role;
use serde_json::json;
use std::net::SocketAddr;
use test_context::test_context;
use tower::ServiceExt;

#[test_context(TestHarness)]
#[tokio::test]
async fn test_send_otp_envelope(ctx: &TestHarness) {
    let (status, body) = ctx
        .post_json(
            "/sendOtp",
            json!({"data": {"email": "a@x.com", "role": "patient"}}),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["expiresInMinutes"], 10);
    assert!(body["result"]["rid"].is_string());
    assert!(body["result"].get("otp").is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_callable_error_envelope(ctx: &TestHarness) {
    let (status, body) = ctx
        .post_json("/sendOtp", json!({"data": {"role": "patient"}}), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["status"], "INVALID_ARGUMENT");
    assert_eq!(body["error"]["message"], "Email is required.");

    let (status, body) = ctx
        .post_json(
            "/verifyOtpAndCreateUser",
            json!({"data": {"rid": "nope", "otp": "123456", "email": "a@x.com", "password": "pw"}}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["status"], "NOT_FOUND");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_signup_sign_in_and_me(ctx: &TestHarness) {
    let (status, body) = ctx
        .post_json(
            "/sendOtp",
            json!({"data": {"email": "doc@x.com", "role": "doctor"}}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let rid = body["result"]["rid"].as_str().unwrap().to_string();
    let code = ctx.test_deps.email.last_code_for("doc@x.com").unwrap();

    let (status, body) = ctx
        .post_json(
            "/verifyOtpAndCreateUser",
            json!({"data": {"rid": rid, "otp": code, "email": "doc@x.com", "password": "pw123456"}}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["role"], "doctor");
    let uid = body["result"]["uid"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .post_json(
            "/signIn",
            json!({"data": {"email": "doc@x.com", "password": "pw123456"}}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["uid"], uid.as_str());
    let token = body["result"]["token"].as_str().unwrap().to_string();

    let (status, body) = ctx.post_json("/me", json!({}), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["role"], "doctor");
    assert_eq!(body["result"]["email"], "doc@x.com");

    // Replaying the verification conflicts on the spent request
    let (status, body) = ctx
        .post_json(
            "/verifyOtpAndCreateUser",
            json!({"data": {"rid": rid, "otp": code, "email": "doc@x.com", "password": "pw123456"}}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["status"], "FAILED_PRECONDITION");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_directory_callables_require_auth(ctx: &TestHarness) {
    let (status, body) = ctx.post_json("/listDoctors", json!({"data": null}), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["status"], "UNAUTHENTICATED");
    assert_eq!(body["error"]["message"], "Not signed in.");

    // A bad token is the same as no token
    let (status, _) = ctx
        .post_json("/listDoctors", json!({}), Some("not-a-token"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_list_patients_callable(ctx: &TestHarness) {
    let doctor = fixtures::profile("doc@x.com", Role::Doctor);
    let patient = fixtures::patient_assigned_to("p@x.com", &doctor);
    let caregiver = fixtures::profile("c@x.com", Role::Caregiver);
    ctx.seed(vec![doctor.clone(), patient.clone(), caregiver.clone()])
        .await;

    let token = ctx.token_for(doctor.id, "doc@x.com");
    let (status, body) = ctx
        .post_json("/listPatientsForDoctor", json!({"data": {}}), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["result"],
        json!([{"id": patient.id.to_string(), "name": "p@x.com", "role": "patient"}])
    );

    let token = ctx.token_for(caregiver.id, "c@x.com");
    let (status, body) = ctx
        .post_json("/listPatientsForDoctor", json!({"data": {}}), Some(&token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["status"], "PERMISSION_DENIED");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_http_directory_endpoints(ctx: &TestHarness) {
    let doctor = fixtures::profile("doc@x.com", Role::Doctor);
    ctx.seed(vec![doctor.clone(), fixtures::untagged_profile("Walk-in")])
        .await;
    let token = ctx.token_for(doctor.id, "doc@x.com");

    let request = Request::builder()
        .method("GET")
        .uri("/listDoctorsHttp")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(ctx.app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"id": doctor.id.to_string(), "name": "doc@x.com", "role": "doctor"}])
    );

    let (status, body) = ctx
        .post_json("/listPatientsForDoctorHttp", json!({}), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Walk-in");
    assert!(body[0]["role"].is_null());

    let (status, body) = ctx
        .post_json("/listPatientsForDoctorHttp", json!({}), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_cors_preflight_mirrors_origin(ctx: &TestHarness) {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/listPatientsForDoctorHttp")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization,content-type")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app().oneshot(request).await.unwrap();
    assert!(response.status().is_success());

    let headers = response.headers();
    assert_eq!(
        headers["access-control-allow-origin"],
        "http://localhost:5173"
    );
    assert_eq!(headers["access-control-allow-credentials"], "true");
    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("POST") && methods.contains("OPTIONS"));
    assert!(headers
        .get_all("vary")
        .iter()
        .any(|v| v.to_str().unwrap().to_lowercase().contains("origin")));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_health_without_database(ctx: &TestHarness) {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(ctx.app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"]["status"], "skipped");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_otp_rate_limit_keys_on_peer_address(ctx: &TestHarness) {
    let app = ctx.limited_app();
    let peer: SocketAddr = "203.0.113.7:40000".parse().unwrap();

    let request = |n: usize| {
        let mut request = Request::builder()
            .method("POST")
            .uri("/sendOtp")
            .header("content-type", "application/json")
            // A forwarded-for header must not buy a fresh quota
            .header("x-forwarded-for", format!("198.51.100.{n}"))
            .body(Body::from(
                json!({"data": {"email": format!("u{n}@x.com"), "role": "patient"}}).to_string(),
            ))
            .unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        request
    };

    let first = app.clone().oneshot(request(0)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert!(first.headers().contains_key("x-ratelimit-remaining"));

    for n in 1..5 {
        let response = app.clone().oneshot(request(n)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let limited = app.clone().oneshot(request(5)).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

    // Directory routes are outside the limiter
    let mut directory = Request::builder()
        .method("POST")
        .uri("/listDoctors")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    directory.extensions_mut().insert(ConnectInfo(peer));
    let response = app.oneshot(directory).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
