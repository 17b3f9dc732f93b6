use serde::{Deserialize, Serialize};

use crate::domain::entities::session::SessionStatus;
use crate::domain::repositories::item_repository::StoreMode;

/// Petición de cambio de sesión enviada por el proveedor de autenticación
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub owner_id: String,
    pub token: String,
}

/// Estado actual de la sesión y del almacén activo
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub status: SessionStatus,
    pub owner_id: String,
    pub mode: StoreMode,
}
