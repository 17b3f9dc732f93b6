use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::item::{Item, ItemKey};

/// Frozen snapshot of a trashed item.
///
/// `trashed_at` only exists here; restoring goes through [`TrashRecord::into_item`], which
/// drops it before the item re-enters a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashRecord {
    #[serde(flatten)]
    pub item: Item,
    pub trashed_at: DateTime<Utc>,
}

impl TrashRecord {
    pub fn new(item: Item) -> Self {
        Self {
            item,
            trashed_at: Utc::now(),
        }
    }

    pub fn key(&self) -> &ItemKey {
        &self.item.key
    }

    pub fn into_item(self) -> Item {
        self.item
    }
}
