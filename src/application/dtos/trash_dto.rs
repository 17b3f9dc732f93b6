use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::dtos::item_dto::ItemDto;
use crate::domain::entities::trash_record::TrashRecord;

/// DTO representing an item in the trash
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashedItemDto {
    #[serde(flatten)]
    pub item: ItemDto,
    pub trashed_at: DateTime<Utc>,
}

impl From<TrashRecord> for TrashedItemDto {
    fn from(record: TrashRecord) -> Self {
        let trashed_at = record.trashed_at;
        Self {
            item: ItemDto::from(record.into_item()),
            trashed_at,
        }
    }
}
