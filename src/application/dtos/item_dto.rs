use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::item::{Category, Item};
use crate::domain::repositories::item_repository::StoreMode;

/// Vista de una prenda tal y como la consume la interfaz
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDto {
    /// Clave textual (`server:<id>` o `local:<id>`)
    pub key: String,
    pub kind: &'static str,
    pub id: String,
    pub owner_id: String,
    pub category: Category,
    pub name: String,
    /// Utilizable directamente como `src` de una imagen
    pub image_url: String,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Item> for ItemDto {
    fn from(item: Item) -> Self {
        Self {
            key: item.key.to_string(),
            kind: item.key.kind(),
            id: item.key.id().to_string(),
            owner_id: item.owner_id.to_string(),
            category: item.category,
            name: item.name,
            image_url: item.image.to_src(),
            tags: item.tags.into_iter().collect(),
            is_favorite: item.is_favorite,
            created_at: item.created_at,
        }
    }
}

/// Resumen del armario del propietario actual
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WardrobeStatsDto {
    pub owner_id: String,
    pub mode: StoreMode,
    pub total_items: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub favorites: usize,
    pub outfits: usize,
    pub trashed: usize,
}
