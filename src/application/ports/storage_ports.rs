use std::sync::Arc;

use async_trait::async_trait;

use crate::common::errors::Result;
use crate::domain::entities::item::OwnerId;
use crate::domain::entities::session::Session;
use crate::domain::repositories::item_repository::ItemStore;

/// Puerto secundario para el almacenamiento duradero clave→cadena.
///
/// No ofrece transacciones: quien lo use debe diseñar operaciones idempotentes.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Obtiene el valor asociado a la clave, si existe
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Guarda (o reemplaza) el valor de la clave
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Elimina la clave; no es un error si no existe
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Construye el almacén de prendas adecuado para cada contexto de sesión
pub trait ItemStoreFactory: Send + Sync + 'static {
    /// Almacén local del propietario (siempre disponible)
    fn local_store(&self, owner: &OwnerId) -> Arc<dyn ItemStore>;

    /// Almacén remoto autenticado con la credencial de la sesión
    fn remote_store(&self, session: &Session) -> Arc<dyn ItemStore>;
}
