use axum::{extract::State, http::Uri, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{dtos::portal::HealthResponse, AppState};

pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    state.store.health_check().await?;

    Ok(Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn metrics() -> impl IntoResponse {
    crate::services::metrics::get_metrics()
}

/// Unknown `/api` routes answer with the JSON error body, never a page.
pub async fn api_not_found(uri: Uri) -> AppError {
    AppError::NotFound(anyhow::anyhow!("No API route for {}", uri.path()))
}
