use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::application::ports::storage_ports::KeyValueStore;
use crate::common::errors::Result;
use crate::domain::entities::item::{ItemKey, OwnerId};
use crate::domain::entities::trash_record::TrashRecord;
use crate::domain::repositories::trash_repository::TrashRepository;
use crate::infrastructure::repositories::kv_support::{purge_pending_key, read_list, trash_key};

/// Implementación del ledger de papelera sobre el almacén clave→cadena.
///
/// One list per owner under `trashedItems_<owner>`. Appending a key that is already present
/// replaces the record, so retries never duplicate entries. Pending remote purges live beside it
/// under `purgePending_<owner>`.
pub struct TrashKvRepository {
    kv: Arc<dyn KeyValueStore>,
}

impl TrashKvRepository {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    async fn load(&self, owner: &OwnerId) -> Result<Vec<TrashRecord>> {
        read_list(self.kv.as_ref(), &trash_key(owner), "trash").await
    }

    async fn save(&self, owner: &OwnerId, records: &[TrashRecord]) -> Result<()> {
        let json = serde_json::to_string(records)?;
        self.kv.set(&trash_key(owner), json).await
    }

    async fn save_pending(&self, owner: &OwnerId, keys: &[ItemKey]) -> Result<()> {
        if keys.is_empty() {
            return self.kv.remove(&purge_pending_key(owner)).await;
        }
        let json = serde_json::to_string(keys)?;
        self.kv.set(&purge_pending_key(owner), json).await
    }
}

#[async_trait]
impl TrashRepository for TrashKvRepository {
    #[instrument(skip(self, record), fields(key = %record.key()))]
    async fn add_to_trash(&self, owner: &OwnerId, record: &TrashRecord) -> Result<()> {
        let mut records = self.load(owner).await?;
        records.retain(|existing| existing.key() != record.key());
        records.push(record.clone());
        self.save(owner, &records).await?;
        debug!("Trash of {} now holds {} records", owner, records.len());
        Ok(())
    }

    async fn get_trash_items(&self, owner: &OwnerId) -> Result<Vec<TrashRecord>> {
        self.load(owner).await
    }

    async fn get_trash_item(&self, owner: &OwnerId, key: &ItemKey) -> Result<Option<TrashRecord>> {
        let records = self.load(owner).await?;
        Ok(records.into_iter().find(|record| record.key() == key))
    }

    #[instrument(skip(self))]
    async fn remove_from_trash(&self, owner: &OwnerId, key: &ItemKey) -> Result<Option<TrashRecord>> {
        let mut records = self.load(owner).await?;
        let position = match records.iter().position(|record| record.key() == key) {
            Some(position) => position,
            None => return Ok(None),
        };

        let removed = records.remove(position);
        self.save(owner, &records).await?;
        Ok(Some(removed))
    }

    #[instrument(skip(self))]
    async fn clear_trash(&self, owner: &OwnerId) -> Result<()> {
        self.kv.remove(&trash_key(owner)).await
    }

    #[instrument(skip(self, keys), fields(count = keys.len()))]
    async fn mark_purge_pending(&self, owner: &OwnerId, keys: &[ItemKey]) -> Result<()> {
        let mut pending = self.get_purge_pending(owner).await?;
        let before = pending.len();
        for key in keys {
            if !pending.contains(key) {
                pending.push(key.clone());
            }
        }
        if pending.len() == before {
            return Ok(());
        }
        self.save_pending(owner, &pending).await
    }

    async fn get_purge_pending(&self, owner: &OwnerId) -> Result<Vec<ItemKey>> {
        read_list(self.kv.as_ref(), &purge_pending_key(owner), "purge-pending").await
    }

    #[instrument(skip(self, keys), fields(count = keys.len()))]
    async fn clear_purge_pending(&self, owner: &OwnerId, keys: &[ItemKey]) -> Result<()> {
        let mut pending = self.get_purge_pending(owner).await?;
        let before = pending.len();
        pending.retain(|key| !keys.contains(key));
        if pending.len() == before {
            return Ok(());
        }
        debug!("{} purges still pending for {}", pending.len(), owner);
        self.save_pending(owner, &pending).await
    }
}
