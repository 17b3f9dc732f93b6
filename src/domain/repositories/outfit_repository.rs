use async_trait::async_trait;

use crate::common::errors::Result;
use crate::domain::entities::item::OwnerId;
use crate::domain::entities::outfit::Outfit;

#[async_trait]
pub trait OutfitRepository: Send + Sync {
    async fn save_outfit(&self, owner: &OwnerId, outfit: &Outfit) -> Result<()>;
    async fn get_outfits(&self, owner: &OwnerId) -> Result<Vec<Outfit>>;
}
