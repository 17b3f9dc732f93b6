use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::application::dtos::session_dto::SessionRequest;
use crate::common::di::AppState;
use crate::domain::entities::item::OwnerId;
use crate::domain::entities::session::Session;
use crate::interfaces::api::handlers::ApiResult;

pub async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.applications.wardrobe_service.session().await)
}

/// El proveedor de autenticación entrega una sesión nueva
#[instrument(skip(state, request), fields(owner = %request.owner_id))]
pub async fn put_session(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = Session::new(OwnerId::new(request.owner_id), request.token);
    let outcome = state.applications.wardrobe_service.switch_session(Some(session)).await?;
    Ok((StatusCode::OK, Json(outcome)))
}

/// Cierre de sesión: vuelve al armario anónimo del dispositivo
#[instrument(skip(state))]
pub async fn delete_session(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let outcome = state.applications.wardrobe_service.switch_session(None).await?;
    info!("Logged out, now {}", outcome.data.owner_id);
    Ok((StatusCode::OK, Json(outcome)))
}

pub async fn reload(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let outcome = state.applications.wardrobe_service.reload().await?;
    Ok((StatusCode::OK, Json(outcome)))
}
