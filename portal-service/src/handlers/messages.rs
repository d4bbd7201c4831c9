use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;

use crate::{
    dtos::portal::SendMessageRequest,
    middleware::Session,
    models::{Message, NewMessage},
    policy::{endpoint, Action, ResourceKind},
    services::store::not_found,
    utils::ValidatedJson,
    AppState,
};

#[tracing::instrument(skip_all)]
pub async fn send_message(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let sender = session.authenticated()?;
    endpoint::require_rule(sender, ResourceKind::Message, Action::Create)?;

    if req.recipient_id == sender.id {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Cannot send a message to yourself"
        )));
    }

    let recipient = state
        .store
        .get_user(req.recipient_id)
        .await?
        .ok_or_else(|| not_found("User", req.recipient_id))?;

    endpoint::authorize_message(Some(sender), &recipient.principal())?;

    let message = state
        .store
        .create_message(NewMessage {
            sender_id: sender.id,
            recipient_id: recipient.id,
            body: req.body,
        })
        .await?;

    tracing::info!(
        message_id = %message.id,
        sender_id = %sender.id,
        recipient_id = %recipient.id,
        "Message sent"
    );

    Ok((StatusCode::CREATED, Json(message)))
}

/// Inbox and sent items, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Message>>, AppError> {
    let principal = session.authenticated()?;
    endpoint::require_rule(principal, ResourceKind::Message, Action::View)?;

    let messages = state
        .store
        .list_messages_for_user(principal.id)
        .await?
        .into_iter()
        .filter(|m| endpoint::permits(principal, Action::View, &m.descriptor()))
        .collect();
    Ok(Json(messages))
}
