use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::portal::{CreateCompanyRequest, CreateInternshipRequest},
    middleware::Session,
    models::{Company, Internship, NewInternship},
    policy::{endpoint, Action, ResourceDescriptor, ResourceKind, Role},
    services::store::not_found,
    utils::ValidatedJson,
    AppState,
};

#[tracing::instrument(skip_all)]
pub async fn create_company(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    let principal = session.authenticated()?;
    endpoint::authorize(
        Some(principal),
        Action::Create,
        &ResourceDescriptor::new(ResourceKind::Company),
    )?;

    let company = state.store.create_company(req.name.trim()).await?;
    tracing::info!(company_id = %company.id, created_by = %principal.id, "Company created");

    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn get_company(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Company, Action::View)?;

    let company = state
        .store
        .get_company(id)
        .await?
        .ok_or_else(|| not_found("Company", id))?;

    endpoint::authorize(Some(principal), Action::View, &company.descriptor())?;
    Ok(Json(company))
}

/// The path's company is the tenant checked against the caller.
pub async fn list_company_internships(
    State(state): State<AppState>,
    session: Session,
    Path(company_id): Path<Uuid>,
) -> Result<Json<Vec<Internship>>, AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Internship, Action::View)?;

    if state.store.get_company(company_id).await?.is_none() {
        return Err(not_found("Company", company_id));
    }

    endpoint::authorize(
        Some(principal),
        Action::View,
        &ResourceDescriptor::new(ResourceKind::Internship).in_company(Some(company_id)),
    )?;

    let internships = state.store.list_internships_for_company(company_id).await?;
    Ok(Json(internships))
}

#[tracing::instrument(skip(state, session, req))]
pub async fn create_company_internship(
    State(state): State<AppState>,
    session: Session,
    Path(company_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateInternshipRequest>,
) -> Result<(StatusCode, Json<Internship>), AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Internship, Action::Create)?;

    if state.store.get_company(company_id).await?.is_none() {
        return Err(not_found("Company", company_id));
    }

    let mentor_id = match (req.mentor_id, principal.role) {
        (Some(id), _) => id,
        (None, Role::Mentor) => principal.id,
        (None, _) => {
            return Err(AppError::BadRequest(anyhow::anyhow!("mentor_id is required")));
        }
    };

    endpoint::authorize(
        Some(principal),
        Action::Create,
        &ResourceDescriptor::new(ResourceKind::Internship)
            .owned_by(mentor_id)
            .in_company(Some(company_id)),
    )?;

    let mentor_ok = state
        .store
        .get_user(mentor_id)
        .await?
        .map(|m| m.role() == Role::Mentor && m.is_active && m.company_id == Some(company_id))
        .unwrap_or(false);
    if !mentor_ok {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Mentor must be an active mentor of company {}",
            company_id
        )));
    }

    let internship = state
        .store
        .create_internship(NewInternship {
            company_id,
            mentor_id,
            title: req.title.trim().to_string(),
            description: req.description,
        })
        .await?;

    tracing::info!(
        internship_id = %internship.id,
        mentor_id = %mentor_id,
        created_by = %principal.id,
        "Internship created"
    );

    Ok((StatusCode::CREATED, Json(internship)))
}
