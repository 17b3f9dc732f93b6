use async_trait::async_trait;

use crate::application::dtos::item_dto::ItemDto;
use crate::application::dtos::notice_dto::Outcome;
use crate::application::dtos::trash_dto::TrashedItemDto;
use crate::common::errors::Result;
use crate::domain::entities::item::ItemKey;

/// Port for trash-related use cases of the current owner
#[async_trait]
pub trait TrashUseCase: Send + Sync {
    /// List items in the owner's trash
    async fn trash_items(&self) -> Result<Vec<TrashedItemDto>>;

    /// Move an active item to the trash
    async fn move_to_trash(&self, key: &ItemKey) -> Result<Outcome<TrashedItemDto>>;

    /// Restore a trashed item into the active store; `None` if it was not in the trash
    async fn restore_item(&self, key: &ItemKey) -> Result<Outcome<Option<ItemDto>>>;

    /// Permanently delete an item from trash; idempotent
    async fn permanently_delete(&self, key: &ItemKey) -> Result<Outcome<()>>;

    /// Empty the trash of the current owner; idempotent
    async fn clear_trash(&self) -> Result<Outcome<usize>>;
}
