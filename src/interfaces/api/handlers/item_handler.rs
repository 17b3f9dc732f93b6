use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::application::dtos::upload_dto::AddItemRequest;
use crate::common::di::AppState;
use crate::common::errors::AppError;
use crate::domain::entities::item::Category;
use crate::domain::entities::upload::{ImagePayload, StyleChoice};
use crate::domain::services::item_query::{ItemQuery, SortOrder};
use crate::interfaces::api::handlers::{item_key, ApiResult};

/// Parámetros de listado: `?category=upper&q=blue&sort=name`
#[derive(Debug, Default, Deserialize)]
pub struct ItemListParams {
    pub category: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
}

impl ItemListParams {
    fn into_query(self) -> ApiResult<ItemQuery> {
        let mut query = ItemQuery::all();
        if let Some(raw) = self.category.filter(|c| !c.trim().is_empty()) {
            let category = Category::recognize(&raw)
                .ok_or_else(|| AppError::bad_request(format!("Unknown category: {}", raw)))?;
            query = ItemQuery::category(category);
        }
        if let Some(search) = self.q {
            query = query.with_search(search);
        }
        if let Some(sort) = self.sort {
            query = query.with_sort(sort.parse::<SortOrder>()?);
        }
        Ok(query)
    }
}

pub async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<ItemListParams>,
) -> ApiResult<impl IntoResponse> {
    let query = params.into_query()?;
    let items = state.applications.wardrobe_service.items(&query).await;
    Ok(Json(items))
}

pub async fn list_favorites(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.applications.wardrobe_service.favorites().await)
}

/// Sube una prenda (multipart: `image` o `imageUrl`, `category`, `name`, `style`, `tags`).
///
/// Without a `style` field the request stays open until the choice arrives on
/// `POST /api/uploads/{id}/style`.
#[instrument(skip(state, multipart))]
pub async fn upload_item(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<impl IntoResponse> {
    let mut image = None;
    let mut file_name = None;
    let mut category = None;
    let mut name = None;
    let mut style = None;
    let mut tags = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "image" => {
                file_name = field.file_name().map(str::to_string);
                let mime = field.content_type().map(str::to_string);
                let data: Bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(format!("Could not read image: {}", e)))?;
                image = Some(ImagePayload::Binary { data, mime });
            }
            other => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request(format!("Could not read field {}: {}", other, e)))?;
                match other {
                    "imageUrl" if image.is_none() => {
                        image = Some(if value.starts_with("data:") {
                            ImagePayload::DataUrl(value)
                        } else {
                            ImagePayload::Url(value)
                        });
                    }
                    "category" => {
                        category = Some(
                            Category::recognize(&value)
                                .ok_or_else(|| AppError::bad_request(format!("Unknown category: {}", value)))?,
                        );
                    }
                    "name" => name = Some(value),
                    "style" if !value.trim().is_empty() => style = Some(value.parse::<StyleChoice>()?),
                    "tags" => tags.extend(value.split(',').map(|tag| tag.trim().to_string())),
                    _ => debug!("Ignoring multipart field {}", other),
                }
            }
        }
    }

    let image = image.ok_or_else(|| AppError::bad_request("No image provided"))?;
    let category = category.ok_or_else(|| AppError::bad_request("No category provided"))?;

    let mut request = AddItemRequest::new(category, image, name).with_tags(tags);
    if let Some(file_name) = file_name {
        request = request.with_file_name(file_name);
    }
    if let Some(style) = style {
        request = request.with_style(style);
    }

    let outcome = state.applications.wardrobe_service.add_item(request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

#[instrument(skip(state))]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let key = item_key(&kind, &id)?;
    let outcome = state.applications.wardrobe_service.toggle_favorite(&key).await?;
    Ok(Json(outcome))
}
