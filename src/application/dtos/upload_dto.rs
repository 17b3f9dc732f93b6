use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::item::Category;
use crate::domain::entities::upload::{ImagePayload, StyleChoice};

/// Petición para añadir una prenda nueva
#[derive(Debug, Clone)]
pub struct AddItemRequest {
    pub category: Category,
    pub image: ImagePayload,
    /// Nombre visible; si falta se deriva de la categoría y el fichero
    pub name: Option<String>,
    pub file_name: Option<String>,
    /// Estilo ya elegido. Sin él, la subida espera la elección del usuario
    pub style: Option<StyleChoice>,
    pub tags: Vec<String>,
}

impl AddItemRequest {
    pub fn new(category: Category, image: ImagePayload, name: Option<String>) -> Self {
        Self {
            category,
            image,
            name,
            file_name: None,
            style: None,
            tags: Vec::new(),
        }
    }

    pub fn with_style(mut self, style: StyleChoice) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_file_name<S: Into<String>>(mut self, file_name: S) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Elección de estilo pendiente, tal y como se muestra al usuario
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingUploadDto {
    pub upload_id: Uuid,
    pub category: Category,
    pub file_name: Option<String>,
    pub choices: Vec<StyleChoice>,
    pub requested_at: DateTime<Utc>,
}
