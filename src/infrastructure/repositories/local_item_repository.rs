use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::ports::storage_ports::KeyValueStore;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::item::{next_local_id, Item, ItemDraft, ItemKey, OwnerId};
use crate::domain::repositories::item_repository::{ItemStore, StoreMode};
use crate::domain::services::item_query::ItemQuery;
use crate::infrastructure::repositories::kv_support::{decode_entries, json_kind, read_json, wardrobe_key};

/// Almacén local de prendas, agrupado por categoría bajo `wardrobe_<owner>`.
///
/// The persisted shape is `{ "<category>": [item, ...] }`. On read the bucket name is ignored
/// and each item's own category wins, so legacy bucket names never hide an item.
pub struct LocalItemStore {
    kv: Arc<dyn KeyValueStore>,
    owner: OwnerId,
    key: String,
}

impl LocalItemStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, owner: OwnerId) -> Self {
        let key = wardrobe_key(&owner);
        Self { kv, owner, key }
    }

    async fn load(&self) -> Result<Vec<Item>> {
        let values = match read_json(self.kv.as_ref(), &self.key).await? {
            Some(Value::Object(buckets)) => buckets
                .into_iter()
                .flat_map(|(_, bucket)| match bucket {
                    Value::Array(values) => values,
                    _ => Vec::new(),
                })
                .collect(),
            // formato plano de versiones anteriores
            Some(Value::Array(values)) => values,
            Some(other) => {
                tracing::warn!("Expected a wardrobe under {}, found {}", self.key, json_kind(&other));
                Vec::new()
            }
            None => Vec::new(),
        };

        let mut items: Vec<Item> = decode_entries(values, "wardrobe");
        for item in items.iter_mut() {
            item.owner_id = self.owner.clone();
        }
        Ok(items)
    }

    async fn save(&self, items: &[Item]) -> Result<()> {
        let mut buckets: BTreeMap<&'static str, Vec<&Item>> = BTreeMap::new();
        for item in items {
            buckets.entry(item.category.as_str()).or_default().push(item);
        }
        let json = serde_json::to_string(&buckets)?;
        self.kv.set(&self.key, json).await
    }
}

#[async_trait]
impl ItemStore for LocalItemStore {
    fn mode(&self) -> StoreMode {
        StoreMode::Local
    }

    async fn list(&self, query: &ItemQuery) -> Result<Vec<Item>> {
        let items = self.load().await?;
        Ok(query.apply(items.iter()))
    }

    #[instrument(skip(self, draft), fields(owner = %self.owner))]
    async fn add(&self, draft: ItemDraft) -> Result<Item> {
        let mut items = self.load().await?;
        let item = draft.into_item(ItemKey::Local(next_local_id()), self.owner.clone());
        items.push(item.clone());
        self.save(&items).await?;
        debug!("Stored {} locally", item.key);
        Ok(item)
    }

    async fn reinsert(&self, mut item: Item) -> Result<Item> {
        item.owner_id = self.owner.clone();
        let mut items = self.load().await?;
        items.retain(|existing| !existing.matches_key(&item.key));
        items.push(item.clone());
        self.save(&items).await?;
        Ok(item)
    }

    async fn remove(&self, key: &ItemKey) -> Result<()> {
        let mut items = self.load().await?;
        let before = items.len();
        items.retain(|existing| !existing.matches_key(key));
        if items.len() == before {
            debug!("{} not in the local store, nothing to remove", key);
            return Ok(());
        }
        self.save(&items).await
    }

    async fn update(&self, item: &Item) -> Result<Item> {
        let mut items = self.load().await?;
        let slot = items
            .iter_mut()
            .find(|existing| existing.matches_key(&item.key))
            .ok_or_else(|| DomainError::not_found("Item", item.key.to_string()))?;

        let mut updated = item.clone();
        updated.owner_id = self.owner.clone();
        updated.created_at = slot.created_at;
        *slot = updated.clone();

        self.save(&items).await?;
        Ok(updated)
    }
}
