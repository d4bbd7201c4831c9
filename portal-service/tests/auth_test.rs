mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{body_json, TestApp};
use portal_service::services::SESSION_COOKIE;
use serde_json::{json, Value};

fn signin_request(email: &str, password: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/auth/signin")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(
            json!({ "email": email, "password": password }).to_string(),
        ))
        .unwrap()
}

async fn signup(app: &TestApp, body: Value) -> (StatusCode, Value) {
    let response = app
        .call(Method::POST, "/api/auth/signup", None, Some(body))
        .await;
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn test_intern_signup_then_signin_sets_session_cookie() {
    let app = TestApp::new().await;

    let (status, user) = signup(
        &app,
        json!({ "email": "Ada@Portal.test", "password": "correct-horse", "name": "Ada" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "INTERN");
    assert_eq!(user["is_active"], true);
    assert_eq!(user["email"], "ada@portal.test");
    assert!(user.get("password_hash").is_none());

    let response = app
        .send(signin_request("ada@portal.test", "correct-horse", "10.0.0.1"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));

    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "ada@portal.test");
    let token = body["token"].as_str().unwrap().to_string();

    let response = app.get("/api/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "Ada");
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let app = TestApp::new().await;
    let body = json!({ "email": "dup@portal.test", "password": "password123", "name": "Dup" });

    assert_eq!(signup(&app, body.clone()).await.0, StatusCode::CREATED);

    let (status, error) = signup(&app, body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["kind"], "conflict");
}

#[tokio::test]
async fn test_company_role_signup_needs_a_real_company_and_starts_inactive() {
    let app = TestApp::new().await;

    let (status, _) = signup(
        &app,
        json!({ "email": "m1@portal.test", "password": "password123", "name": "M", "role": "MENTOR" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = signup(
        &app,
        json!({
            "email": "m2@portal.test", "password": "password123", "name": "M",
            "role": "MENTOR", "company_id": uuid::Uuid::new_v4()
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, user) = signup(
        &app,
        json!({
            "email": "m3@portal.test", "password": "password123", "name": "M",
            "role": "MENTOR", "company_id": app.company_a.id
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["is_active"], false);

    // Inactive until an admin enables the account.
    let response = app
        .send(signin_request("m3@portal.test", "password123", "10.0.0.2"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_cannot_self_register() {
    let app = TestApp::new().await;

    let (status, _) = signup(
        &app,
        json!({ "email": "root@portal.test", "password": "password123", "name": "Root", "role": "ADMIN" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_signup_payload_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = signup(
        &app,
        json!({ "email": "not-an-email", "password": "short", "name": "X" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let app = TestApp::new().await;
    signup(
        &app,
        json!({ "email": "grace@portal.test", "password": "password123", "name": "Grace" }),
    )
    .await;

    let wrong = app
        .send(signin_request("grace@portal.test", "password999", "10.0.0.3"))
        .await;
    let unknown = app
        .send(signin_request("nobody@portal.test", "password123", "10.0.0.3"))
        .await;

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong).await, body_json(unknown).await);
}

#[tokio::test]
async fn test_signin_is_rate_limited_per_ip() {
    let app = TestApp::with_signin_limit(2).await;

    for _ in 0..2 {
        let response = app
            .send(signin_request("x@portal.test", "whatever", "192.0.2.7"))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app
        .send(signin_request("x@portal.test", "whatever", "192.0.2.7"))
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["kind"], "rate_limited");

    // Another address still gets through.
    let response = app
        .send(signin_request("x@portal.test", "whatever", "192.0.2.8"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signout_clears_cookie() {
    let app = TestApp::new().await;

    let response = app.call(Method::POST, "/api/auth/signout", None, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = TestApp::new().await;

    let response = app.get("/", None).await;
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("x-content-type-options"));
}
