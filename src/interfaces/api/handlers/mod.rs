pub mod item_handler;
pub mod outfit_handler;
pub mod session_handler;
pub mod trash_handler;
pub mod upload_handler;

use crate::common::errors::AppError;
use crate::domain::entities::item::ItemKey;

/// Tipo de resultado para controladores de API
pub type ApiResult<T> = Result<T, AppError>;

/// Clave de prenda a partir de los segmentos `/{kind}/{id}` de la ruta
pub(crate) fn item_key(kind: &str, id: &str) -> ApiResult<ItemKey> {
    Ok(ItemKey::from_parts(kind, id)?)
}
