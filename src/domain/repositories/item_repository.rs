use async_trait::async_trait;

use crate::common::errors::Result;
use crate::domain::entities::item::{Item, ItemDraft, ItemKey};
use crate::domain::services::item_query::ItemQuery;

/// Backend que respalda una colección de prendas
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    Local,
    Remote,
}

/// Uniform read/write interface over the local and remote item backends.
///
/// Adapters normalize their backend's item shape into [`Item`]; callers never branch on which
/// backend produced an item.
#[async_trait]
pub trait ItemStore: Send + Sync {
    fn mode(&self) -> StoreMode;

    /// Lista las prendas del propietario filtradas por la consulta
    async fn list(&self, query: &ItemQuery) -> Result<Vec<Item>>;

    /// Persiste una prenda nueva y devuelve el identificador asignado por el backend
    async fn add(&self, draft: ItemDraft) -> Result<Item>;

    /// Vuelve a insertar una prenda que ya tiene identificador (restauración)
    async fn reinsert(&self, item: Item) -> Result<Item>;

    /// Elimina por clave; una clave inexistente no es un error
    async fn remove(&self, key: &ItemKey) -> Result<()>;

    /// Reemplaza los metadatos de una prenda existente
    async fn update(&self, item: &Item) -> Result<Item>;

    /// Borrado definitivo en el backend. Sólo tiene efecto en el remoto
    async fn purge(&self, _key: &ItemKey) -> Result<()> {
        Ok(())
    }
}
