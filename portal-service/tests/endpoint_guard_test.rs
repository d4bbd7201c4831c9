mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use portal_service::{
    models::{NewInternship, NewTask, Internship, Task},
    policy::Role,
};
use serde_json::json;
use uuid::Uuid;

async fn internship_in(app: &TestApp, company_id: Uuid, mentor_id: Uuid) -> Internship {
    app.store
        .create_internship(NewInternship {
            company_id,
            mentor_id,
            title: "Backend internship".to_string(),
            description: "Rust services".to_string(),
        })
        .await
        .unwrap()
}

async fn task_in(app: &TestApp, internship: &Internship, assignee_id: Uuid) -> Task {
    app.store
        .create_task(NewTask {
            internship_id: internship.id,
            company_id: internship.company_id,
            mentor_id: internship.mentor_id,
            assignee_id,
            title: "Write the parser".to_string(),
            description: String::new(),
            credits: 5,
            due_utc: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_no_session_is_unauthenticated() {
    let app = TestApp::new().await;

    let response = app.get("/api/internships", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["kind"], "unauthenticated");

    let response = app.get("/api/me", Some("not-a-token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_inactive_principal_is_unauthenticated_for_every_role() {
    let app = TestApp::new().await;

    for role in Role::ALL {
        let company = role.requires_company().then_some(app.company_a.id);
        let user = app.user(role, company, false).await;
        let token = app.token_for(&user);

        for path in ["/api/me", "/api/internships", "/api/tasks", "/api/admin/users"] {
            let response = app.get(path, Some(&token)).await;
            assert_eq!(
                response.status(),
                StatusCode::UNAUTHORIZED,
                "{} on {}",
                role,
                path
            );
        }
    }
}

#[tokio::test]
async fn test_missing_record_is_not_probed_without_session() {
    let app = TestApp::new().await;
    let path = format!("/api/tasks/{}", Uuid::new_v4());

    let response = app.get(&path, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mentor = app.user(Role::Mentor, Some(app.company_a.id), true).await;
    let response = app.get(&path, Some(&app.token_for(&mentor))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_without_rule_is_forbidden_whether_or_not_the_record_exists() {
    let app = TestApp::new().await;
    let intern = app.user(Role::Intern, Some(app.company_a.id), true).await;
    let existing = app.user(Role::Mentor, Some(app.company_a.id), true).await;
    let token = app.token_for(&intern);

    for id in [existing.id, Uuid::new_v4()] {
        let response = app
            .call(
                Method::PATCH,
                &format!("/api/admin/users/{}/status", id),
                Some(&token),
                Some(json!({ "is_active": false })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "user {}", id);
        assert_eq!(body_json(response).await["kind"], "forbidden");
    }

    for id in [app.company_b.id, Uuid::new_v4()] {
        let response = app
            .get(&format!("/api/companies/{}", id), Some(&token))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "company {}", id);
    }

    let response = app
        .call(
            Method::PATCH,
            &format!("/api/submissions/{}/review", Uuid::new_v4()),
            Some(&token),
            Some(json!({ "approved": true })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_intern_reading_other_company_task_is_not_found() {
    let app = TestApp::new().await;
    let intern_a = app.user(Role::Intern, Some(app.company_a.id), true).await;
    let mentor_b = app.user(Role::Mentor, Some(app.company_b.id), true).await;
    let intern_b = app.user(Role::Intern, Some(app.company_b.id), true).await;
    let internship = internship_in(&app, app.company_b.id, mentor_b.id).await;
    let task = task_in(&app, &internship, intern_b.id).await;
    let token = app.token_for(&intern_a);

    let response = app.get(&format!("/api/tasks/{}", task.id), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let concealed = body_json(response).await;

    let response = app
        .get(&format!("/api/tasks/{}", Uuid::new_v4()), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, concealed);

    let response = app
        .get(&format!("/api/tasks/{}/submissions", task.id), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, concealed);
}

#[tokio::test]
async fn test_open_internship_list_is_limited_to_own_company_for_staff() {
    let app = TestApp::new().await;
    let mentor_a = app.user(Role::Mentor, Some(app.company_a.id), true).await;
    let mentor_b = app.user(Role::Mentor, Some(app.company_b.id), true).await;
    let in_a = internship_in(&app, app.company_a.id, mentor_a.id).await;
    let in_b = internship_in(&app, app.company_b.id, mentor_b.id).await;

    let listed_ids = |body: serde_json::Value| -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|i| i["id"].as_str().unwrap().to_string())
            .collect()
    };

    let company_admin = app.user(Role::CompanyAdmin, Some(app.company_a.id), true).await;
    let response = app
        .get("/api/internships", Some(&app.token_for(&company_admin)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(listed_ids(body_json(response).await), vec![in_a.id.to_string()]);

    let response = app
        .get("/api/internships", Some(&app.token_for(&mentor_b)))
        .await;
    assert_eq!(listed_ids(body_json(response).await), vec![in_b.id.to_string()]);

    let intern = app.user(Role::Intern, None, true).await;
    let admin = app.user(Role::Admin, None, true).await;
    for user in [&intern, &admin] {
        let response = app.get("/api/internships", Some(&app.token_for(user))).await;
        let ids = listed_ids(body_json(response).await);
        assert_eq!(ids.len(), 2, "{}", user.role());
        assert!(ids.contains(&in_b.id.to_string()));
    }
}

#[tokio::test]
async fn test_staff_task_list_is_their_company_tasks() {
    let app = TestApp::new().await;
    let mentor_a = app.user(Role::Mentor, Some(app.company_a.id), true).await;
    let mentor_b = app.user(Role::Mentor, Some(app.company_b.id), true).await;
    let intern_a = app.user(Role::Intern, Some(app.company_a.id), true).await;
    let intern_b = app.user(Role::Intern, Some(app.company_b.id), true).await;
    let internship_a = internship_in(&app, app.company_a.id, mentor_a.id).await;
    let internship_b = internship_in(&app, app.company_b.id, mentor_b.id).await;
    let task_a = task_in(&app, &internship_a, intern_a.id).await;
    task_in(&app, &internship_b, intern_b.id).await;

    let coordinator = app
        .user(Role::CompanyCoordinator, Some(app.company_a.id), true)
        .await;
    let response = app.get("/api/tasks", Some(&app.token_for(&coordinator))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let tasks = body_json(response).await;
    assert_eq!(tasks.as_array().map(Vec::len), Some(1));
    assert_eq!(tasks[0]["id"], json!(task_a.id));

    let admin = app.user(Role::Admin, None, true).await;
    let response = app.get("/api/tasks", Some(&app.token_for(&admin))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_company_admin_of_other_tenant_is_forbidden_admin_is_exempt() {
    let app = TestApp::new().await;
    let mentor_a = app.user(Role::Mentor, Some(app.company_a.id), true).await;
    let internship = internship_in(&app, app.company_a.id, mentor_a.id).await;
    let path = format!("/api/internships/{}", internship.id);
    let patch = json!({ "title": "Renamed" });

    let outsider = app.user(Role::CompanyAdmin, Some(app.company_b.id), true).await;
    let response = app
        .call(Method::PATCH, &path, Some(&app.token_for(&outsider)), Some(patch.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["kind"], "forbidden");

    let owner = app.user(Role::CompanyAdmin, Some(app.company_a.id), true).await;
    let response = app
        .call(Method::PATCH, &path, Some(&app.token_for(&owner)), Some(patch.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let admin = app.user(Role::Admin, None, true).await;
    let response = app
        .call(Method::PATCH, &path, Some(&app.token_for(&admin)), Some(patch))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["title"], "Renamed");
}

#[tokio::test]
async fn test_cross_tenant_view_is_not_found() {
    let app = TestApp::new().await;
    let mentor_a = app.user(Role::Mentor, Some(app.company_a.id), true).await;
    let internship = internship_in(&app, app.company_a.id, mentor_a.id).await;

    let outsider = app.user(Role::HrManager, Some(app.company_b.id), true).await;
    let response = app
        .get(
            &format!("/api/internships/{}", internship.id),
            Some(&app.token_for(&outsider)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let concealed = body_json(response).await;
    assert_eq!(concealed["kind"], "not_found");

    // Indistinguishable from a record that does not exist.
    let response = app
        .get(
            &format!("/api/internships/{}", Uuid::new_v4()),
            Some(&app.token_for(&outsider)),
        )
        .await;
    assert_eq!(body_json(response).await, concealed);
}

#[tokio::test]
async fn test_mentor_of_company_a_cannot_update_task_of_company_b() {
    let app = TestApp::new().await;
    let mentor_a = app.user(Role::Mentor, Some(app.company_a.id), true).await;
    let mentor_b = app.user(Role::Mentor, Some(app.company_b.id), true).await;
    let intern_b = app.user(Role::Intern, Some(app.company_b.id), true).await;
    let internship = internship_in(&app, app.company_b.id, mentor_b.id).await;
    let task = task_in(&app, &internship, intern_b.id).await;
    let path = format!("/api/tasks/{}", task.id);

    let response = app
        .call(
            Method::PATCH,
            &path,
            Some(&app.token_for(&mentor_a)),
            Some(json!({ "title": "Hijacked" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .call(
            Method::PATCH,
            &path,
            Some(&app.token_for(&mentor_b)),
            Some(json!({ "title": "Refined" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_mentor_must_own_the_task_within_tenant() {
    let app = TestApp::new().await;
    let owner = app.user(Role::Mentor, Some(app.company_a.id), true).await;
    let colleague = app.user(Role::Mentor, Some(app.company_a.id), true).await;
    let intern = app.user(Role::Intern, Some(app.company_a.id), true).await;
    let internship = internship_in(&app, app.company_a.id, owner.id).await;
    let task = task_in(&app, &internship, intern.id).await;

    let response = app
        .call(
            Method::DELETE,
            &format!("/api/tasks/{}", task.id),
            Some(&app.token_for(&colleague)),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .call(
            Method::DELETE,
            &format!("/api/tasks/{}", task.id),
            Some(&app.token_for(&owner)),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(app.store.get_task(task.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_intern_sees_only_assigned_tasks() {
    let app = TestApp::new().await;
    let mentor = app.user(Role::Mentor, Some(app.company_a.id), true).await;
    let intern = app.user(Role::Intern, Some(app.company_a.id), true).await;
    let other = app.user(Role::Intern, Some(app.company_a.id), true).await;
    let internship = internship_in(&app, app.company_a.id, mentor.id).await;
    let task = task_in(&app, &internship, intern.id).await;
    let path = format!("/api/tasks/{}", task.id);

    let response = app.get(&path, Some(&app.token_for(&intern))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get(&path, Some(&app.token_for(&other))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get("/api/tasks", Some(&app.token_for(&other))).await;
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_admin_lists_any_company_internships() {
    let app = TestApp::new().await;
    let mentor_b = app.user(Role::Mentor, Some(app.company_b.id), true).await;
    internship_in(&app, app.company_b.id, mentor_b.id).await;
    let path = format!("/api/companies/{}/internships", app.company_b.id);

    let admin = app.user(Role::Admin, None, true).await;
    let response = app.get(&path, Some(&app.token_for(&admin))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(1));

    let coordinator_a = app
        .user(Role::CompanyCoordinator, Some(app.company_a.id), true)
        .await;
    let response = app.get(&path, Some(&app.token_for(&coordinator_a))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_admin_manages_users() {
    let app = TestApp::new().await;
    let intern = app.user(Role::Intern, None, true).await;
    let company_admin = app.user(Role::CompanyAdmin, Some(app.company_a.id), true).await;
    let admin = app.user(Role::Admin, None, true).await;

    for user in [&intern, &company_admin] {
        let response = app.get("/api/admin/users", Some(&app.token_for(user))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    let response = app.get("/api/admin/users", Some(&app.token_for(&admin))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let path = format!("/api/admin/users/{}/status", intern.id);
    let response = app
        .call(
            Method::PATCH,
            &path,
            Some(&app.token_for(&company_admin)),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .call(
            Method::PATCH,
            &path,
            Some(&app.token_for(&admin)),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The deactivated intern's existing token stops working immediately.
    let response = app.get("/api/me", Some(&app.token_for(&intern))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_change_requires_company_for_company_roles() {
    let app = TestApp::new().await;
    let admin = app.user(Role::Admin, None, true).await;
    let user = app.user(Role::Intern, None, true).await;
    let path = format!("/api/admin/users/{}/role", user.id);
    let token = app.token_for(&admin);

    let response = app
        .call(Method::PATCH, &path, Some(&token), Some(json!({ "role": "MENTOR" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .call(
            Method::PATCH,
            &path,
            Some(&token),
            Some(json!({ "role": "MENTOR", "company_id": app.company_a.id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["role"], "MENTOR");
    assert_eq!(body["company_id"], json!(app.company_a.id));
}

async fn send_message(app: &TestApp, token: &str, recipient: Uuid) -> StatusCode {
    app.call(
        Method::POST,
        "/api/messages",
        Some(token),
        Some(json!({ "recipient_id": recipient, "body": "Hello" })),
    )
    .await
    .status()
}

#[tokio::test]
async fn test_messaging_follows_table_and_tenant() {
    let app = TestApp::new().await;
    let intern = app.user(Role::Intern, Some(app.company_a.id), true).await;
    let mentor_a = app.user(Role::Mentor, Some(app.company_a.id), true).await;
    let mentor_b = app.user(Role::Mentor, Some(app.company_b.id), true).await;
    let other_intern = app.user(Role::Intern, Some(app.company_a.id), true).await;
    let token = app.token_for(&intern);

    assert_eq!(send_message(&app, &token, mentor_a.id).await, StatusCode::CREATED);
    assert_eq!(send_message(&app, &token, mentor_b.id).await, StatusCode::FORBIDDEN);
    assert_eq!(send_message(&app, &token, other_intern.id).await, StatusCode::FORBIDDEN);
    assert_eq!(send_message(&app, &token, Uuid::new_v4()).await, StatusCode::NOT_FOUND);

    let response = app.get("/api/messages", Some(&app.token_for(&mentor_a))).await;
    let inbox = body_json(response).await;
    assert_eq!(inbox.as_array().map(Vec::len), Some(1));
    assert_eq!(inbox[0]["sender_id"], json!(intern.id));
}

#[tokio::test]
async fn test_unknown_api_route_is_json_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/api/does-not-exist", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["kind"], "not_found");
}
