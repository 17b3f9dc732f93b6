use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::errors::DomainError;
use crate::domain::services::image_codec;

/// Pseudo-identidad usada cuando no hay sesión autenticada
pub const ANONYMOUS_OWNER: &str = "anonymous";

/// Identity that scopes an item store, a trash ledger and saved outfits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Un identificador vacío se trata como anónimo
    pub fn new<S: Into<String>>(id: S) -> Self {
        let id = id.into();
        if id.trim().is_empty() {
            Self::anonymous()
        } else {
            Self(id)
        }
    }

    pub fn anonymous() -> Self {
        Self(ANONYMOUS_OWNER.to_string())
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS_OWNER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Closed set of wardrobe categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Category {
    Upper,
    Lower,
    Bottom,
    Accessories,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Upper,
        Category::Lower,
        Category::Bottom,
        Category::Accessories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Upper => "upper",
            Category::Lower => "lower",
            Category::Bottom => "bottom",
            Category::Accessories => "accessories",
        }
    }

    /// Etiqueta capitalizada para nombres por defecto
    pub fn label(&self) -> &'static str {
        match self {
            Category::Upper => "Upper",
            Category::Lower => "Lower",
            Category::Bottom => "Bottom",
            Category::Accessories => "Accessories",
        }
    }

    /// Reconoce el conjunto cerrado y los alias heredados de versiones anteriores
    pub fn recognize(raw: &str) -> Option<Category> {
        match raw.trim().to_lowercase().as_str() {
            "upper" | "tops" | "top" | "shirts" | "outerwear" | "dresses" => Some(Category::Upper),
            "lower" | "bottoms" | "pants" => Some(Category::Lower),
            "bottom" | "shoes" | "footwear" => Some(Category::Bottom),
            "accessories" | "accessory" => Some(Category::Accessories),
            _ => None,
        }
    }

    /// Never rejects: unknown or empty values land in `Upper`
    pub fn parse_lenient(raw: &str) -> Category {
        match Self::recognize(raw) {
            Some(category) => category,
            None => {
                tracing::warn!("Unknown category '{}', falling back to '{}'", raw, Category::Upper);
                Category::Upper
            }
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Upper
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Category::parse_lenient(&raw)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Identificador único de una prenda: asignado por el servidor o generado localmente.
///
/// An item carries exactly one of the two, so matching a trash record against an item
/// never has to guess which identifier to compare.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ItemKey {
    Server(String),
    Local(String),
}

impl ItemKey {
    /// Construye la clave a partir de los segmentos `{kind}/{id}` de una ruta HTTP
    pub fn from_parts(kind: &str, id: &str) -> Result<Self, DomainError> {
        if id.trim().is_empty() {
            return Err(DomainError::validation_error("Item", "Empty item id"));
        }
        match kind {
            "server" => Ok(ItemKey::Server(id.to_string())),
            "local" => Ok(ItemKey::Local(id.to_string())),
            _ => Err(DomainError::validation_error("Item", format!("Invalid item kind: {}", kind))),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ItemKey::Server(id) | ItemKey::Local(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ItemKey::Server(_) => "server",
            ItemKey::Local(_) => "local",
        }
    }

    pub fn is_server(&self) -> bool {
        matches!(self, ItemKey::Server(_))
    }
}

impl Display for ItemKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

impl FromStr for ItemKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| DomainError::validation_error("Item", format!("Invalid item key: {}", s)))?;
        ItemKey::from_parts(kind, id)
    }
}

static LAST_LOCAL_ID: AtomicI64 = AtomicI64::new(0);

/// Genera un id local basado en tiempo (ms), estrictamente creciente dentro del proceso
pub fn next_local_id() -> String {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_LOCAL_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_LOCAL_ID.compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return candidate.to_string(),
            Err(actual) => last = actual,
        }
    }
}

/// Logical image locator: a remote URL or an inline payload.
///
/// Serialized as a single string (`https://…` or `data:<mime>;base64,…`), which is also the
/// shape the local store has always persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageLocator {
    Url(String),
    Inline { mime: String, data: Bytes },
}

impl ImageLocator {
    pub fn inline<S: Into<String>>(mime: S, data: impl Into<Bytes>) -> Self {
        ImageLocator::Inline {
            mime: mime.into(),
            data: data.into(),
        }
    }

    /// Valor utilizable directamente como `src` de una imagen
    pub fn to_src(&self) -> String {
        match self {
            ImageLocator::Url(url) => url.clone(),
            ImageLocator::Inline { mime, data } => image_codec::to_data_url(mime, data),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, ImageLocator::Inline { .. })
    }
}

impl From<String> for ImageLocator {
    fn from(raw: String) -> Self {
        if raw.starts_with("data:") {
            match image_codec::parse_data_url(&raw) {
                Ok((mime, data)) => return ImageLocator::Inline { mime, data },
                Err(e) => tracing::warn!("Keeping undecodable data URL as a plain reference: {}", e),
            }
        }
        ImageLocator::Url(raw)
    }
}

impl From<ImageLocator> for String {
    fn from(locator: ImageLocator) -> Self {
        locator.to_src()
    }
}

/// Una prenda del armario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub key: ItemKey,
    pub owner_id: OwnerId,
    pub category: Category,
    pub name: String,
    pub image: ImageLocator,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn matches_key(&self, key: &ItemKey) -> bool {
        &self.key == key
    }

    /// An item shows up in a category view by category or by carrying it as a tag
    pub fn belongs_to(&self, category: Category) -> bool {
        self.category == category || self.tags.contains(category.as_str())
    }

    /// Case-insensitive substring match over name and tags
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
    }
}

/// Datos de una prenda aún no persistida (sin identificador)
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub category: Category,
    pub name: String,
    pub image: ImageLocator,
    pub tags: BTreeSet<String>,
    pub file_name: Option<String>,
}

impl ItemDraft {
    pub fn new(category: Category, name: String, image: ImageLocator, file_name: Option<String>) -> Self {
        let mut tags = BTreeSet::new();
        tags.insert(category.as_str().to_string());
        Self {
            category,
            name,
            image,
            tags,
            file_name,
        }
    }

    /// Materializa el borrador con un identificador ya asignado
    pub fn into_item(self, key: ItemKey, owner_id: OwnerId) -> Item {
        Item {
            key,
            owner_id,
            category: self.category,
            name: self.name,
            image: self.image,
            tags: self.tags,
            is_favorite: false,
            created_at: Utc::now(),
        }
    }
}

/// Nombre por defecto: "Upper - shirt.png"
pub fn default_item_name(category: Category, file_name: Option<&str>) -> String {
    match file_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(file_name) => format!("{} - {}", category.label(), file_name),
        None => format!("{} item", category.label()),
    }
}
