use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::portal::UpdateInternshipRequest,
    middleware::Session,
    models::{Internship, InternshipUpdate},
    policy::{endpoint, Action, ResourceKind},
    services::store::not_found,
    utils::ValidatedJson,
    AppState,
};

/// Open internships the caller may read: every company's for interns and
/// admins, the caller's own company's for staff.
pub async fn list_open_internships(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Internship>>, AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Internship, Action::View)?;

    let internships = state
        .store
        .list_open_internships()
        .await?
        .into_iter()
        .filter(|i| endpoint::permits(principal, Action::View, &i.descriptor()))
        .collect();
    Ok(Json(internships))
}

pub async fn get_internship(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Internship>, AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Internship, Action::View)?;

    let internship = state
        .store
        .get_internship(id)
        .await?
        .ok_or_else(|| not_found("Internship", id))?;

    endpoint::authorize(Some(principal), Action::View, &internship.descriptor())?;
    Ok(Json(internship))
}

#[tracing::instrument(skip(state, session, req))]
pub async fn update_internship(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateInternshipRequest>,
) -> Result<Json<Internship>, AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Internship, Action::Update)?;

    let internship = state
        .store
        .get_internship(id)
        .await?
        .ok_or_else(|| not_found("Internship", id))?;

    endpoint::authorize(Some(principal), Action::Update, &internship.descriptor())?;

    let updated = state
        .store
        .update_internship(
            internship.id,
            InternshipUpdate {
                title: req.title.map(|t| t.trim().to_string()),
                description: req.description,
                status: req.status,
            },
        )
        .await?;

    tracing::info!(internship_id = %updated.id, updated_by = %principal.id, "Internship updated");
    Ok(Json(updated))
}
