use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::portal::{UpdateUserRoleRequest, UpdateUserStatusRequest},
    middleware::Session,
    models::{SanitizedUser, User},
    policy::{endpoint, Action, ResourceDescriptor, ResourceKind},
    services::store::not_found,
    utils::ValidatedJson,
    AppState,
};

pub async fn get_me(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<SanitizedUser>, AppError> {
    let principal = session.authenticated()?;

    let user = state
        .store
        .get_user(principal.id)
        .await?
        .ok_or_else(|| not_found("User", principal.id))?;

    endpoint::authorize(Some(principal), Action::View, &user.descriptor())?;

    Ok(Json(user.sanitized()))
}

pub async fn list_users(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<SanitizedUser>>, AppError> {
    let principal = session.authenticated()?;

    // No owner and no tenant: only an unscoped rule admits this.
    endpoint::authorize(
        Some(principal),
        Action::View,
        &ResourceDescriptor::new(ResourceKind::User),
    )?;

    let users = state.store.list_users().await?;
    Ok(Json(users.iter().map(User::sanitized).collect()))
}

async fn target_user(state: &AppState, session: &Session, id: Uuid) -> Result<User, AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::User, Action::Update)?;

    let user = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| not_found("User", id))?;

    endpoint::authorize(Some(principal), Action::Update, &user.descriptor())?;
    Ok(user)
}

#[tracing::instrument(skip(state, session, req))]
pub async fn set_user_status(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserStatusRequest>,
) -> Result<Json<SanitizedUser>, AppError> {
    let user = target_user(&state, &session, id).await?;

    if session.principal().map(|p| p.id) == Some(user.id) && !req.is_active {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Admins cannot deactivate their own account"
        )));
    }

    let user = state.store.set_user_active(user.id, req.is_active).await?;

    tracing::info!(
        user_id = %user.id,
        is_active = user.is_active,
        changed_by = ?session.principal().map(|p| p.id),
        "User status changed"
    );

    Ok(Json(user.sanitized()))
}

#[tracing::instrument(skip(state, session, req))]
pub async fn set_user_role(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRoleRequest>,
) -> Result<Json<SanitizedUser>, AppError> {
    let user = target_user(&state, &session, id).await?;

    if req.role.requires_company() && req.company_id.is_none() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "company_id is required for {}",
            req.role
        )));
    }
    if let Some(company_id) = req.company_id {
        if state.store.get_company(company_id).await?.is_none() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Company {} does not exist",
                company_id
            )));
        }
    }

    let user = state
        .store
        .set_user_role(user.id, req.role, req.company_id)
        .await?;

    tracing::info!(
        user_id = %user.id,
        role = %req.role,
        company_id = ?user.company_id,
        changed_by = ?session.principal().map(|p| p.id),
        "User role changed"
    );

    Ok(Json(user.sanitized()))
}
