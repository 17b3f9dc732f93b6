use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::outfit::Outfit;

/// Petición para guardar un conjunto; cada hueco es una clave textual de prenda
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveOutfitRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub upper: Option<String>,
    #[serde(default)]
    pub lower: Option<String>,
    #[serde(default)]
    pub bottom: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitDto {
    pub id: String,
    pub name: Option<String>,
    pub upper: Option<String>,
    pub lower: Option<String>,
    pub bottom: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Outfit> for OutfitDto {
    fn from(outfit: Outfit) -> Self {
        Self {
            id: outfit.id,
            name: outfit.name,
            upper: outfit.items.upper.map(|k| k.to_string()),
            lower: outfit.items.lower.map(|k| k.to_string()),
            bottom: outfit.items.bottom.map(|k| k.to_string()),
            created_at: outfit.created_at,
        }
    }
}
