use async_trait::async_trait;

use crate::common::errors::Result;
use crate::domain::entities::item::{ItemKey, OwnerId};
use crate::domain::entities::trash_record::TrashRecord;

/// Ledger de papelera, con clave por propietario.
///
/// Todas las operaciones convergen al mismo estado si se reintentan tras un fallo parcial.
#[async_trait]
pub trait TrashRepository: Send + Sync {
    /// Añade (o reemplaza) el registro de la prenda
    async fn add_to_trash(&self, owner: &OwnerId, record: &TrashRecord) -> Result<()>;
    async fn get_trash_items(&self, owner: &OwnerId) -> Result<Vec<TrashRecord>>;
    async fn get_trash_item(&self, owner: &OwnerId, key: &ItemKey) -> Result<Option<TrashRecord>>;
    /// Quita el registro; devuelve el registro eliminado si existía
    async fn remove_from_trash(&self, owner: &OwnerId, key: &ItemKey) -> Result<Option<TrashRecord>>;
    async fn clear_trash(&self, owner: &OwnerId) -> Result<()>;

    /// Claves de servidor borradas definitivamente cuyo `DELETE` remoto sigue pendiente
    async fn mark_purge_pending(&self, owner: &OwnerId, keys: &[ItemKey]) -> Result<()>;
    async fn get_purge_pending(&self, owner: &OwnerId) -> Result<Vec<ItemKey>>;
    async fn clear_purge_pending(&self, owner: &OwnerId, keys: &[ItemKey]) -> Result<()>;
}
