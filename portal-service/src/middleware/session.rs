use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{
    policy::{endpoint, Principal},
    AppState,
};

/// The caller's session for this request, possibly empty. Inserted by
/// [`session_middleware`] and passed explicitly to handlers.
#[derive(Debug, Clone, Default)]
pub struct Session(pub Option<Principal>);

impl Session {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }

    /// The principal, provided it is present and active.
    pub fn authenticated(&self) -> Result<&Principal, AppError> {
        Ok(endpoint::authenticate(self.principal())?)
    }
}

/// Resolve the session once per request and expose it as an extension.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let headers = req.headers().clone();
    let principal = state.sessions.resolve(&headers).await?;

    if let Some(p) = &principal {
        tracing::Span::current().record("user_id", tracing::field::display(p.id));
    }

    req.extensions_mut().insert(Session(principal));
    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Session missing from request extensions"
            ))
        })
    }
}
