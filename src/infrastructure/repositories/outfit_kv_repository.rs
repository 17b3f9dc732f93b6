use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::storage_ports::KeyValueStore;
use crate::common::errors::Result;
use crate::domain::entities::item::OwnerId;
use crate::domain::entities::outfit::Outfit;
use crate::domain::repositories::outfit_repository::OutfitRepository;
use crate::infrastructure::repositories::kv_support::{outfits_key, read_list};

/// Conjuntos guardados bajo `savedOutfits_<owner>`
pub struct OutfitKvRepository {
    kv: Arc<dyn KeyValueStore>,
}

impl OutfitKvRepository {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl OutfitRepository for OutfitKvRepository {
    async fn save_outfit(&self, owner: &OwnerId, outfit: &Outfit) -> Result<()> {
        let key = outfits_key(owner);
        let mut outfits: Vec<Outfit> = read_list(self.kv.as_ref(), &key, "outfit").await?;
        outfits.retain(|existing| existing.id != outfit.id);
        outfits.push(outfit.clone());
        self.kv.set(&key, serde_json::to_string(&outfits)?).await
    }

    async fn get_outfits(&self, owner: &OwnerId) -> Result<Vec<Outfit>> {
        read_list(self.kv.as_ref(), &outfits_key(owner), "outfit").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::item::ItemKey;
    use crate::domain::entities::outfit::OutfitSlots;
    use crate::infrastructure::services::memory_kv_store::InMemoryKvStore;

    #[tokio::test]
    async fn test_outfits_are_owner_scoped() {
        let repo = OutfitKvRepository::new(Arc::new(InMemoryKvStore::new()));
        let owner = OwnerId::new("erin");
        let outfit = Outfit::new(
            Some("Monday".to_string()),
            OutfitSlots {
                upper: Some(ItemKey::Local("1".to_string())),
                ..OutfitSlots::default()
            },
        )
        .unwrap();

        repo.save_outfit(&owner, &outfit).await.unwrap();
        repo.save_outfit(&owner, &outfit).await.unwrap();

        assert_eq!(repo.get_outfits(&owner).await.unwrap(), vec![outfit]);
        assert!(repo.get_outfits(&OwnerId::anonymous()).await.unwrap().is_empty());
    }
}
