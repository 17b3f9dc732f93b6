use std::sync::Arc;

use reqwest::Client;

use crate::application::ports::storage_ports::{ItemStoreFactory, KeyValueStore};
use crate::domain::entities::item::OwnerId;
use crate::domain::entities::session::Session;
use crate::domain::repositories::item_repository::ItemStore;
use crate::infrastructure::repositories::local_item_repository::LocalItemStore;
use crate::infrastructure::repositories::remote_item_repository::RemoteItemStore;

/// Crea los almacenes reales: local sobre el almacén clave→cadena, remoto sobre la API HTTP
pub struct WardrobeStoreFactory {
    kv: Arc<dyn KeyValueStore>,
    client: Client,
    api_base_url: String,
}

impl WardrobeStoreFactory {
    pub fn new(kv: Arc<dyn KeyValueStore>, client: Client, api_base_url: impl Into<String>) -> Self {
        Self {
            kv,
            client,
            api_base_url: api_base_url.into(),
        }
    }
}

impl ItemStoreFactory for WardrobeStoreFactory {
    fn local_store(&self, owner: &OwnerId) -> Arc<dyn ItemStore> {
        Arc::new(LocalItemStore::new(self.kv.clone(), owner.clone()))
    }

    fn remote_store(&self, session: &Session) -> Arc<dyn ItemStore> {
        Arc::new(RemoteItemStore::new(
            self.client.clone(),
            self.api_base_url.clone(),
            session.clone(),
        ))
    }
}
