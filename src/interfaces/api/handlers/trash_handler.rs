use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{debug, instrument};

use crate::common::di::AppState;
use crate::interfaces::api::handlers::{item_key, ApiResult};

/// Obtiene los elementos en la papelera del propietario actual
#[instrument(skip(state))]
pub async fn get_trash_items(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let items = state.applications.trash_service.trash_items().await?;
    debug!("Papelera con {} elementos", items.len());
    Ok((StatusCode::OK, Json(items)))
}

/// Mueve una prenda a la papelera
#[instrument(skip(state))]
pub async fn move_to_trash(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    debug!("Solicitud para mover a papelera: tipo={}, id={}", kind, id);
    let key = item_key(&kind, &id)?;
    let outcome = state.applications.trash_service.move_to_trash(&key).await?;
    Ok((StatusCode::OK, Json(outcome)))
}

/// Restaura una prenda desde la papelera; `data` es null si ya no estaba
#[instrument(skip(state))]
pub async fn restore_from_trash(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let key = item_key(&kind, &id)?;
    let outcome = state.applications.trash_service.restore_item(&key).await?;
    Ok((StatusCode::OK, Json(outcome)))
}

/// Elimina permanentemente un elemento de la papelera
#[instrument(skip(state))]
pub async fn delete_permanently(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let key = item_key(&kind, &id)?;
    state.applications.trash_service.permanently_delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Vacía la papelera completamente
#[instrument(skip(state))]
pub async fn empty_trash(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let outcome = state.applications.trash_service.clear_trash().await?;
    debug!("Papelera vaciada: {} elementos", outcome.data);
    Ok((StatusCode::OK, Json(outcome)))
}
