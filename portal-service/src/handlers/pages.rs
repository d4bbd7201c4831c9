//! Page routes. Rendering is out of scope, so every page answers with its
//! view model as JSON. All of these sit behind the navigation gate.

use axum::{extract::State, http::StatusCode, http::Uri, Json};
use serde::Serialize;
use serde_json::{json, Value};
use service_core::error::AppError;
use std::collections::BTreeMap;

use crate::{
    middleware::Session,
    models::{Internship, SanitizedUser, Submission, Task},
    policy::{navigation, Principal, Role},
    services::store::not_found,
    AppState,
};

pub async fn index() -> Json<Value> {
    Json(json!({
        "page": "home",
        "title": "Internship Portal",
        "links": { "signin": navigation::SIGN_IN_PATH, "signup": "/auth/signup" },
    }))
}

pub async fn signin_page() -> Json<Value> {
    Json(json!({
        "page": "signin",
        "action": "/api/auth/signin",
        "fields": ["email", "password"],
    }))
}

pub async fn signup_page() -> Json<Value> {
    let roles: Vec<&str> = Role::ALL
        .iter()
        .filter(|r| **r != Role::Admin)
        .map(|r| r.as_str())
        .collect();

    Json(json!({
        "page": "signup",
        "action": "/api/auth/signup",
        "fields": ["email", "password", "name", "role", "company_id"],
        "roles": roles,
    }))
}

fn home_for(role: Role) -> &'static str {
    match role {
        Role::Admin => "/dashboard/admin",
        Role::Mentor => "/dashboard/mentor",
        Role::Intern => "/dashboard/intern",
        _ => navigation::DASHBOARD_PATH,
    }
}

async fn current_user(state: &AppState, principal: &Principal) -> Result<SanitizedUser, AppError> {
    state
        .store
        .get_user(principal.id)
        .await?
        .map(|u| u.sanitized())
        .ok_or_else(|| not_found("User", principal.id))
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub page: &'static str,
    pub user: SanitizedUser,
    pub home: &'static str,
}

pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<DashboardView>, AppError> {
    let principal = session.authenticated()?;
    let user = current_user(&state, principal).await?;

    Ok(Json(DashboardView {
        page: "dashboard",
        home: home_for(user.role),
        user,
    }))
}

#[derive(Debug, Serialize)]
pub struct AdminDashboardView {
    pub page: &'static str,
    pub total_users: usize,
    pub inactive_users: usize,
    pub users_by_role: BTreeMap<&'static str, usize>,
}

pub async fn admin_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<AdminDashboardView>, AppError> {
    session.authenticated()?;
    let users = state.store.list_users().await?;

    let mut users_by_role = BTreeMap::new();
    for user in &users {
        *users_by_role.entry(user.role().as_str()).or_insert(0) += 1;
    }

    Ok(Json(AdminDashboardView {
        page: "admin_dashboard",
        total_users: users.len(),
        inactive_users: users.iter().filter(|u| !u.is_active).count(),
        users_by_role,
    }))
}

#[derive(Debug, Serialize)]
pub struct MentorDashboardView {
    pub page: &'static str,
    pub internships: Vec<Internship>,
    pub pending_submissions: Vec<Submission>,
}

pub async fn mentor_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<MentorDashboardView>, AppError> {
    let principal = session.authenticated()?;

    Ok(Json(MentorDashboardView {
        page: "mentor_dashboard",
        internships: state.store.list_internships_for_mentor(principal.id).await?,
        pending_submissions: state
            .store
            .list_pending_submissions_for_mentor(principal.id)
            .await?,
    }))
}

#[derive(Debug, Serialize)]
pub struct InternDashboardView {
    pub page: &'static str,
    pub credits: i32,
    pub company_id: Option<uuid::Uuid>,
    pub tasks: Vec<Task>,
}

pub async fn intern_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<InternDashboardView>, AppError> {
    let principal = session.authenticated()?;
    let user = current_user(&state, principal).await?;

    Ok(Json(InternDashboardView {
        page: "intern_dashboard",
        credits: user.credits,
        company_id: user.company_id,
        tasks: state.store.list_tasks_for_assignee(principal.id).await?,
    }))
}

pub async fn page_not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "page": "not_found", "path": uri.path() })),
    )
}
