use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::common::di::AppState;
use crate::common::errors::DomainError;
use crate::domain::entities::upload::StyleChoice;
use crate::interfaces::api::handlers::ApiResult;

#[derive(Debug, Deserialize)]
pub struct StyleSelectionRequest {
    pub style: StyleChoice,
}

/// Elección de estilo pendiente (204 si no hay ninguna)
pub async fn pending_upload(State(state): State<AppState>) -> impl IntoResponse {
    match state.applications.style_selector.pending() {
        Some(pending) => (StatusCode::OK, Json(pending)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[instrument(skip(state, request))]
pub async fn choose_style(
    State(state): State<AppState>,
    Path(upload_id): Path<Uuid>,
    Json(request): Json<StyleSelectionRequest>,
) -> ApiResult<impl IntoResponse> {
    state.applications.style_selector.resolve(upload_id, request.style)?;
    Ok(StatusCode::ACCEPTED)
}

/// Abandona la subida que espera estilo; la petición de subida responde 409
#[instrument(skip(state))]
pub async fn cancel_upload(
    State(state): State<AppState>,
    Path(upload_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if !state.applications.style_selector.cancel(upload_id) {
        return Err(DomainError::not_found("Upload", upload_id.to_string()).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Disponibilidad del servicio de transformación
pub async fn transform_health(State(state): State<AppState>) -> impl IntoResponse {
    let (enabled, available) = match &state.applications.transformer {
        Some(transformer) => (true, transformer.is_available().await),
        None => (false, false),
    };
    Json(json!({
        "enabled": enabled,
        "available": available,
    }))
}
