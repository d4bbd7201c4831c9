use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::portal::{CreateSubmissionRequest, ReviewSubmissionRequest},
    middleware::Session,
    models::{NewSubmission, ReviewOutcome, Submission, SubmissionStatus},
    policy::{endpoint, Action, ResourceKind},
    services::store::not_found,
    utils::ValidatedJson,
    AppState,
};

#[tracing::instrument(skip(state, session, req))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Path(task_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Submission, Action::Create)?;

    let task = state
        .store
        .get_task(task_id)
        .await?
        .ok_or_else(|| not_found("Task", task_id))?;

    endpoint::authorize(Some(principal), Action::Create, &task.submission_descriptor())?;

    // Work is submitted by the assignee, never on their behalf.
    if task.assignee_id != principal.id {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Only the assignee can submit work for this task"
        )));
    }

    let submission = state
        .store
        .create_submission(NewSubmission {
            task_id: task.id,
            intern_id: principal.id,
            content: req.content,
        })
        .await?;

    tracing::info!(submission_id = %submission.id, task_id = %task.id, "Work submitted");
    Ok((StatusCode::CREATED, Json(submission)))
}

pub async fn list_task_submissions(
    State(state): State<AppState>,
    session: Session,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<Submission>>, AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Submission, Action::View)?;

    let task = state
        .store
        .get_task(task_id)
        .await?
        .ok_or_else(|| not_found("Task", task_id))?;

    endpoint::authorize(Some(principal), Action::View, &task.submission_descriptor())?;

    let submissions = state
        .store
        .list_submissions_for_task(task.id)
        .await?
        .into_iter()
        .filter(|s| endpoint::permits(principal, Action::View, &s.descriptor()))
        .collect();
    Ok(Json(submissions))
}

/// Approval completes the task and awards its credits in one store
/// transaction; rejection sends the task back to the intern.
#[tracing::instrument(skip(state, session, req))]
pub async fn review_submission(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ReviewSubmissionRequest>,
) -> Result<Json<Submission>, AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Submission, Action::Review)?;

    let submission = state
        .store
        .get_submission(id)
        .await?
        .ok_or_else(|| not_found("Submission", id))?;

    endpoint::authorize(Some(principal), Action::Review, &submission.descriptor())?;

    let reviewed = state
        .store
        .record_review(
            submission.id,
            ReviewOutcome {
                approved: req.approved,
                feedback: req.feedback,
            },
        )
        .await?;

    if reviewed.status() == SubmissionStatus::Approved {
        metrics::counter!("submissions_approved_total").increment(1);
    }

    tracing::info!(
        submission_id = %reviewed.id,
        intern_id = %reviewed.intern_id,
        status = %reviewed.status,
        reviewed_by = %principal.id,
        "Submission reviewed"
    );

    Ok(Json(reviewed))
}
