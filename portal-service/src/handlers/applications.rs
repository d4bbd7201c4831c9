use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::portal::{ApplicationDecision, CreateApplicationRequest, ReviewApplicationRequest},
    middleware::Session,
    models::{Application, InternshipStatus, NewApplication},
    policy::{endpoint, Action, ResourceKind, Role},
    services::store::not_found,
    utils::ValidatedJson,
    AppState,
};

#[tracing::instrument(skip(state, session, req))]
pub async fn apply(
    State(state): State<AppState>,
    session: Session,
    Path(internship_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Application, Action::Create)?;

    let internship = state
        .store
        .get_internship(internship_id)
        .await?
        .ok_or_else(|| not_found("Internship", internship_id))?;

    endpoint::authorize(
        Some(principal),
        Action::Create,
        &internship
            .application_descriptor()
            .assigned_to(principal.id),
    )?;

    if principal.role != Role::Intern {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Only interns can apply to internships"
        )));
    }
    if internship.status() != InternshipStatus::Open {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Internship {} is not open for applications",
            internship.id
        )));
    }

    let application = state
        .store
        .create_application(NewApplication {
            internship_id: internship.id,
            intern_id: principal.id,
            company_id: internship.company_id,
            mentor_id: internship.mentor_id,
            cover_letter: req.cover_letter,
        })
        .await?;

    tracing::info!(
        application_id = %application.id,
        internship_id = %internship.id,
        intern_id = %principal.id,
        "Application submitted"
    );

    Ok((StatusCode::CREATED, Json(application)))
}

/// Applications to one internship, narrowed to those the caller may read:
/// an intern sees their own, a mentor those for internships they run.
pub async fn list_applications(
    State(state): State<AppState>,
    session: Session,
    Path(internship_id): Path<Uuid>,
) -> Result<Json<Vec<Application>>, AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Application, Action::View)?;

    let internship = state
        .store
        .get_internship(internship_id)
        .await?
        .ok_or_else(|| not_found("Internship", internship_id))?;

    endpoint::authorize(Some(principal), Action::View, &internship.descriptor())?;

    let applications = state
        .store
        .list_applications_for_internship(internship.id)
        .await?
        .into_iter()
        .filter(|a| endpoint::permits(principal, Action::View, &a.descriptor()))
        .collect();
    Ok(Json(applications))
}

/// Accepting enrols the intern into the internship's company.
#[tracing::instrument(skip(state, session, req))]
pub async fn review_application(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ReviewApplicationRequest>,
) -> Result<Json<Application>, AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Application, Action::Review)?;

    let application = state
        .store
        .get_application(id)
        .await?
        .ok_or_else(|| not_found("Application", id))?;

    endpoint::authorize(Some(principal), Action::Review, &application.descriptor())?;

    let reviewed = match req.decision {
        ApplicationDecision::Accept => state.store.accept_application(application.id).await?,
        ApplicationDecision::Reject => state.store.reject_application(application.id).await?,
    };

    tracing::info!(
        application_id = %reviewed.id,
        intern_id = %reviewed.intern_id,
        status = %reviewed.status,
        reviewed_by = %principal.id,
        "Application reviewed"
    );

    Ok(Json(reviewed))
}
