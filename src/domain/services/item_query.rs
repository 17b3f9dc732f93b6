use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::errors::DomainError;
use crate::domain::entities::item::{Category, Item};

/// Orden de presentación de las prendas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    None,
    Name,
    /// Newest first
    Date,
    Category,
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(SortOrder::None),
            "name" => Ok(SortOrder::Name),
            "date" => Ok(SortOrder::Date),
            "category" => Ok(SortOrder::Category),
            other => Err(DomainError::validation_error("Query", format!("Invalid sort order: {}", other))),
        }
    }
}

/// Filtro de listado: categoría opcional, búsqueda libre y orden
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub category: Option<Category>,
    pub search: Option<String>,
    pub sort: SortOrder,
}

impl ItemQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() { None } else { Some(search) };
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches(&self, item: &Item) -> bool {
        let category_ok = self.category.map_or(true, |c| item.belongs_to(c));
        let search_ok = self.search.as_deref().map_or(true, |q| item.matches_search(q));
        category_ok && search_ok
    }

    /// Filtra y ordena; el orden relativo original se conserva entre empates
    pub fn apply<'a, I>(&self, items: I) -> Vec<Item>
    where
        I: IntoIterator<Item = &'a Item>,
    {
        let mut selected: Vec<Item> = items.into_iter().filter(|i| self.matches(i)).cloned().collect();

        match self.sort {
            SortOrder::None => {}
            SortOrder::Name => selected.sort_by_key(|i| i.name.to_lowercase()),
            SortOrder::Date => selected.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::Category => selected.sort_by_key(|i| i.category),
        }

        selected
    }
}
