use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::errors::DomainError;
use crate::domain::entities::item::ItemKey;

/// Piezas elegidas para un conjunto (una por hueco)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutfitSlots {
    pub upper: Option<ItemKey>,
    pub lower: Option<ItemKey>,
    pub bottom: Option<ItemKey>,
}

impl OutfitSlots {
    pub fn is_empty(&self) -> bool {
        self.upper.is_none() && self.lower.is_none() && self.bottom.is_none()
    }
}

/// Conjunto guardado: referencias a prendas, nunca copias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outfit {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub items: OutfitSlots,
    pub created_at: DateTime<Utc>,
}

impl Outfit {
    pub fn new(name: Option<String>, items: OutfitSlots) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::validation_error("Outfit", "Add items to create an outfit"));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.filter(|n| !n.trim().is_empty()),
            items,
            created_at: Utc::now(),
        })
    }
}
