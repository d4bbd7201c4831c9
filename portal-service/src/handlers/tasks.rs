use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::portal::{CreateTaskRequest, UpdateTaskRequest},
    middleware::Session,
    models::{NewTask, Task, TaskUpdate},
    policy::{endpoint, Action, Principal, ResourceKind, Role},
    services::store::not_found,
    utils::ValidatedJson,
    AppState,
};

/// Role check, then the lookup.
async fn load_task(
    state: &AppState,
    principal: &Principal,
    action: Action,
    id: Uuid,
) -> Result<Task, AppError> {
    endpoint::require_rule(principal, ResourceKind::Task, action)?;

    state
        .store
        .get_task(id)
        .await?
        .ok_or_else(|| not_found("Task", id))
}

/// The task belongs to the internship's mentor; the assignee must be an
/// active intern enrolled in the same company.
#[tracing::instrument(skip(state, session, req))]
pub async fn create_task(
    State(state): State<AppState>,
    session: Session,
    Path(internship_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Task, Action::Create)?;

    let internship = state
        .store
        .get_internship(internship_id)
        .await?
        .ok_or_else(|| not_found("Internship", internship_id))?;

    endpoint::authorize(
        Some(principal),
        Action::Create,
        &internship.task_descriptor().assigned_to(req.assignee_id),
    )?;

    let enrolled = state
        .store
        .get_user(req.assignee_id)
        .await?
        .map(|u| {
            u.role() == Role::Intern && u.is_active && u.company_id == Some(internship.company_id)
        })
        .unwrap_or(false);
    if !enrolled {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Assignee must be an active intern enrolled in the internship's company"
        )));
    }

    let task = state
        .store
        .create_task(NewTask {
            internship_id: internship.id,
            company_id: internship.company_id,
            mentor_id: internship.mentor_id,
            assignee_id: req.assignee_id,
            title: req.title.trim().to_string(),
            description: req.description,
            credits: req.credits,
            due_utc: req.due_utc,
        })
        .await?;

    tracing::info!(
        task_id = %task.id,
        assignee_id = %task.assignee_id,
        credits = task.credits,
        "Task assigned"
    );

    Ok((StatusCode::CREATED, Json(task)))
}

/// The caller's tasks: assigned to an intern, created by a mentor, or in
/// the company of other staff. Admins read tasks by id.
pub async fn list_my_tasks(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Task>>, AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Task, Action::View)?;

    let tasks = match (principal.role, principal.company_id) {
        (Role::Intern, _) => state.store.list_tasks_for_assignee(principal.id).await?,
        (Role::Mentor, _) => state.store.list_tasks_for_mentor(principal.id).await?,
        (Role::Admin, _) => {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "Admins have no task list of their own"
            )));
        }
        (_, Some(company_id)) => state.store.list_tasks_for_company(company_id).await?,
        (_, None) => Vec::new(),
    };

    let visible = tasks
        .into_iter()
        .filter(|task| endpoint::permits(principal, Action::View, &task.descriptor()))
        .collect();
    Ok(Json(visible))
}

pub async fn get_task(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, AppError> {
    let principal = session.authenticated()?;
    let task = load_task(&state, principal, Action::View, id).await?;

    endpoint::authorize(Some(principal), Action::View, &task.descriptor())?;
    Ok(Json(task))
}

#[tracing::instrument(skip(state, session, req))]
pub async fn update_task(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    let principal = session.authenticated()?;
    let task = load_task(&state, principal, Action::Update, id).await?;

    endpoint::authorize(Some(principal), Action::Update, &task.descriptor())?;

    let updated = state
        .store
        .update_task(
            task.id,
            TaskUpdate {
                title: req.title.map(|t| t.trim().to_string()),
                description: req.description,
                credits: req.credits,
                due_utc: req.due_utc,
            },
        )
        .await?;

    tracing::info!(task_id = %updated.id, updated_by = %principal.id, "Task updated");
    Ok(Json(updated))
}

#[tracing::instrument(skip(state, session))]
pub async fn delete_task(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let principal = session.authenticated()?;
    let task = load_task(&state, principal, Action::Delete, id).await?;

    endpoint::authorize(Some(principal), Action::Delete, &task.descriptor())?;

    state.store.delete_task(task.id).await?;
    tracing::info!(task_id = %task.id, deleted_by = %principal.id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}
