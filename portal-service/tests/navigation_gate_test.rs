mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{assert_redirect, body_json, TestApp};
use portal_service::{policy::Role, services::SESSION_COOKIE};

#[tokio::test]
async fn test_public_pages_need_no_session() {
    let app = TestApp::new().await;

    for path in ["/", "/auth/signin", "/auth/signup"] {
        let response = app.get(path, None).await;
        assert_eq!(response.status(), StatusCode::OK, "path {}", path);
    }
}

#[tokio::test]
async fn test_anonymous_dashboard_redirects_to_signin() {
    let app = TestApp::new().await;

    let response = app.get("/dashboard", None).await;
    assert_redirect(&response, "/auth/signin");

    // Unknown pages are gated too.
    let response = app.get("/settings/profile", None).await;
    assert_redirect(&response, "/auth/signin");
}

#[tokio::test]
async fn test_inactive_session_redirects_to_signin_for_every_role() {
    let app = TestApp::new().await;

    for role in Role::ALL {
        let company = role.requires_company().then_some(app.company_a.id);
        let user = app.user(role, company, false).await;
        let token = app.token_for(&user);

        for path in ["/dashboard", "/dashboard/admin", "/dashboard/mentor", "/dashboard/intern"] {
            let response = app.get(path, Some(&token)).await;
            assert_redirect(&response, "/auth/signin");
        }
    }
}

#[tokio::test]
async fn test_intern_on_admin_paths_redirects_to_dashboard() {
    let app = TestApp::new().await;
    let intern = app.user(Role::Intern, None, true).await;
    let token = app.token_for(&intern);

    for path in ["/admin", "/dashboard/admin", "/admin/users", "/dashboard/../admin"] {
        let response = app.get(path, Some(&token)).await;
        assert_redirect(&response, "/dashboard");
    }
}

#[tokio::test]
async fn test_prefixes_match_whole_segments() {
    let app = TestApp::new().await;
    let intern = app.user(Role::Intern, None, true).await;
    let token = app.token_for(&intern);

    // Not an admin area: passes the gate and falls through to the page 404.
    let response = app.get("/dashboard/administrator", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_area_precedence_per_role() {
    let app = TestApp::new().await;
    let admin = app.user(Role::Admin, None, true).await;
    let mentor = app.user(Role::Mentor, Some(app.company_a.id), true).await;
    let intern = app.user(Role::Intern, None, true).await;
    let hr = app.user(Role::HrManager, Some(app.company_a.id), true).await;

    let cases = [
        (&admin, "/dashboard/admin", None),
        (&admin, "/dashboard/mentor", None),
        (&admin, "/dashboard/intern", None),
        (&mentor, "/dashboard/mentor", None),
        (&mentor, "/dashboard/intern", Some("/dashboard")),
        (&mentor, "/dashboard/admin", Some("/dashboard")),
        (&intern, "/dashboard/intern", None),
        (&intern, "/dashboard/mentor", Some("/dashboard")),
        (&hr, "/dashboard", None),
        (&hr, "/dashboard/mentor", Some("/dashboard")),
        (&hr, "/dashboard/intern", Some("/dashboard")),
    ];

    for (user, path, redirect) in cases {
        let response = app.get(path, Some(&app.token_for(user))).await;
        match redirect {
            Some(target) => assert_redirect(&response, target),
            None => assert_eq!(
                response.status(),
                StatusCode::OK,
                "{} on {}",
                user.role,
                path
            ),
        }
    }
}

#[tokio::test]
async fn test_same_session_same_decision() {
    let app = TestApp::new().await;
    let intern = app.user(Role::Intern, None, true).await;
    let token = app.token_for(&intern);

    let first = app.get("/dashboard/admin", Some(&token)).await;
    let second = app.get("/dashboard/admin", Some(&token)).await;
    assert_eq!(first.status(), second.status());
    assert_eq!(common::location(&first), common::location(&second));
}

#[tokio::test]
async fn test_deactivation_applies_on_next_request() {
    let app = TestApp::new().await;
    let mentor = app.user(Role::Mentor, Some(app.company_a.id), true).await;
    let token = app.token_for(&mentor);

    let response = app.get("/dashboard/mentor", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.store.set_user_active(mentor.id, false).await.unwrap();

    let response = app.get("/dashboard/mentor", Some(&token)).await;
    assert_redirect(&response, "/auth/signin");
}

#[tokio::test]
async fn test_cookie_session_reaches_dashboard() {
    let app = TestApp::new().await;
    let intern = app.user(Role::Intern, None, true).await;

    let request = Request::builder()
        .uri("/dashboard")
        .header(
            header::COOKIE,
            format!("{}={}", SESSION_COOKIE, app.token_for(&intern)),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["home"], "/dashboard/intern");
    assert_eq!(body["user"]["role"], "INTERN");
}

#[tokio::test]
async fn test_admin_dashboard_counts_users() {
    let app = TestApp::new().await;
    let admin = app.user(Role::Admin, None, true).await;
    app.user(Role::Intern, None, true).await;
    app.user(Role::Mentor, Some(app.company_a.id), false).await;

    let response = app.get("/dashboard/admin", Some(&app.token_for(&admin))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["total_users"], 3);
    assert_eq!(body["inactive_users"], 1);
    assert_eq!(body["users_by_role"]["MENTOR"], 1);
}

#[tokio::test]
async fn test_health_and_metrics_are_not_gated() {
    let app = TestApp::new().await;

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");

    let response = app.get("/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
