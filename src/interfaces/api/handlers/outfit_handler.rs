use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::instrument;

use crate::application::dtos::outfit_dto::SaveOutfitRequest;
use crate::common::di::AppState;
use crate::interfaces::api::handlers::ApiResult;

pub async fn list_outfits(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let outfits = state.applications.wardrobe_service.outfits().await?;
    Ok(Json(outfits))
}

#[instrument(skip(state, request))]
pub async fn save_outfit(
    State(state): State<AppState>,
    Json(request): Json<SaveOutfitRequest>,
) -> ApiResult<impl IntoResponse> {
    let outfit = state.applications.wardrobe_service.save_outfit(request).await?;
    Ok((StatusCode::CREATED, Json(outfit)))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let stats = state.applications.wardrobe_service.stats().await?;
    Ok(Json(stats))
}
