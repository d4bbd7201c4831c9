use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::Session;
use crate::policy::{navigation, Decision};

/// Page gate. Must sit inside [`super::session_middleware`].
pub async fn navigation_gate(session: Session, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();

    match navigation::decide(&path, session.principal()) {
        Decision::Allow => next.run(req).await,
        Decision::Redirect(target) => {
            tracing::info!(
                path = %path,
                user_id = ?session.principal().map(|p| p.id),
                target = target,
                "Page request redirected"
            );
            Redirect::to(target).into_response()
        }
        Decision::Deny(reason) => {
            tracing::warn!(path = %path, reason = %reason, "Page request denied");
            Redirect::to(navigation::SIGN_IN_PATH).into_response()
        }
    }
}
