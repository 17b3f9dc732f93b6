use std::collections::{BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::common::errors::{DomainError, ErrorKind, Result};
use crate::domain::entities::item::{Category, ImageLocator, Item, ItemDraft, ItemKey, OwnerId};
use crate::domain::entities::session::Session;
use crate::domain::repositories::item_repository::{ItemStore, StoreMode};
use crate::domain::services::image_codec;
use crate::domain::services::item_query::ItemQuery;
use crate::infrastructure::repositories::kv_support::decode_entries;

/// Forma de una prenda tal y como la devuelve la API remota
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteItem {
    #[serde(alias = "_id")]
    id: Option<String>,
    #[serde(alias = "name")]
    title: Option<String>,
    #[serde(alias = "image")]
    image_url: Option<String>,
    #[serde(default)]
    tags: Option<RemoteTags>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    metadata: Option<RemoteMetadata>,
    #[serde(default)]
    is_favorite: bool,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemoteTags {
    List(Vec<String>),
    Csv(String),
}

impl RemoteTags {
    fn into_set(self) -> BTreeSet<String> {
        let raw = match self {
            RemoteTags::List(tags) => tags,
            RemoteTags::Csv(csv) => csv.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RemoteMetadata {
    #[serde(default)]
    category: Option<String>,
}

impl RemoteItem {
    /// Adapta la forma remota al modelo normalizado
    fn into_item(self, owner: &OwnerId) -> Option<Item> {
        let id = self.id.filter(|id| !id.trim().is_empty())?;
        let tags = self.tags.map(RemoteTags::into_set).unwrap_or_default();

        // metadata.category, luego category, luego la primera etiqueta reconocible
        let category = self
            .metadata
            .and_then(|metadata| metadata.category)
            .or(self.category)
            .and_then(|raw| Category::recognize(&raw))
            .or_else(|| tags.iter().find_map(|tag| Category::recognize(tag)))
            .unwrap_or_else(|| {
                warn!("Remote item {} has no usable category, using {}", id, Category::Upper);
                Category::Upper
            });

        Some(Item {
            key: ItemKey::Server(id),
            owner_id: owner.clone(),
            category,
            name: self.title.unwrap_or_default(),
            image: ImageLocator::Url(self.image_url.unwrap_or_default()),
            tags,
            is_favorite: self.is_favorite,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

/// Quita el sobre `{ success, data }` si la respuesta lo trae
fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

/// Almacén remoto de prendas sobre la API HTTP del backend.
///
/// The backend only needs `GET /items` and `POST /items`. `remove` only hides the item for this
/// session and the server row stays while the item sits in the trash, so `reinsert` just unhides
/// it under its server id. `update` uses `PUT /items/{id}` when the backend has it and otherwise
/// keeps the change for the session. `purge` is the real `DELETE`.
pub struct RemoteItemStore {
    client: Client,
    base_url: String,
    session: Session,
    hidden: RwLock<HashSet<ItemKey>>,
    /// Favoritos que el backend no pudo guardar
    favorites: RwLock<HashMap<ItemKey, bool>>,
}

impl RemoteItemStore {
    pub fn new(client: Client, base_url: impl Into<String>, session: Session) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            hidden: RwLock::new(HashSet::new()),
            favorites: RwLock::new(HashMap::new()),
        }
    }

    fn items_url(&self) -> String {
        format!("{}/items", self.base_url)
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/items/{}", self.base_url, urlencoding::encode(id))
    }

    fn server_id<'a>(&self, key: &'a ItemKey) -> Result<&'a str> {
        match key {
            ItemKey::Server(id) => Ok(id.as_str()),
            ItemKey::Local(_) => Err(DomainError::validation_error(
                "Item",
                format!("{} was never stored on the server", key),
            )
            .with_id(key.to_string())),
        }
    }

    /// Convierte un estado HTTP de error en DomainError, con el mensaje del backend si lo hay
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| {
                ["msg", "error", "message"]
                    .iter()
                    .find_map(|field| value.get(*field).and_then(Value::as_str).map(str::to_string))
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

        let kind = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::AccessDenied,
            StatusCode::NOT_FOUND => ErrorKind::NotFound,
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorKind::Timeout,
            s if s.is_client_error() => ErrorKind::InvalidInput,
            _ => ErrorKind::Unavailable,
        };

        Err(DomainError::new(kind, "RemoteItem", format!("{} ({})", detail, status.as_u16())))
    }

    async fn read_item(&self, response: Response) -> Result<Item> {
        let body = unwrap_envelope(response.json::<Value>().await?);
        let remote: RemoteItem = serde_json::from_value(body)?;
        remote
            .into_item(self.session.owner_id())
            .ok_or_else(|| DomainError::internal_error("RemoteItem", "Server response without an item id"))
    }

    /// Todas las prendas del servidor, sin aplicar lo ocultado en esta sesión
    async fn fetch_all(&self) -> Result<Vec<Item>> {
        let response = self
            .client
            .get(self.items_url())
            .bearer_auth(self.session.token())
            .send()
            .await?;
        let body = unwrap_envelope(Self::check(response).await?.json::<Value>().await?);

        let values = match body {
            Value::Array(values) => values,
            other => {
                warn!("Unexpected item list shape from server: {}", other);
                Vec::new()
            }
        };

        let owner = self.session.owner_id();
        Ok(decode_entries::<RemoteItem>(values, "remote item")
            .into_iter()
            .filter_map(|remote| remote.into_item(owner))
            .collect())
    }
}

/// Estados que indican que el backend no tiene endpoint de actualización
fn update_unsupported(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
    )
}

#[async_trait]
impl ItemStore for RemoteItemStore {
    fn mode(&self) -> StoreMode {
        StoreMode::Remote
    }

    #[instrument(skip(self, query), fields(owner = %self.session.owner_id()))]
    async fn list(&self, query: &ItemQuery) -> Result<Vec<Item>> {
        let mut items = self.fetch_all().await?;

        let hidden = self.hidden.read().await;
        let favorites = self.favorites.read().await;
        items.retain(|item| !hidden.contains(&item.key));
        for item in items.iter_mut() {
            if let Some(is_favorite) = favorites.get(&item.key) {
                item.is_favorite = *is_favorite;
            }
        }

        debug!("Server returned {} items", items.len());
        Ok(query.apply(items.iter()))
    }

    #[instrument(skip(self, draft), fields(owner = %self.session.owner_id()))]
    async fn add(&self, draft: ItemDraft) -> Result<Item> {
        let (mime, data) = match &draft.image {
            ImageLocator::Inline { mime, data } => (mime.clone(), data.clone()),
            ImageLocator::Url(_) => {
                return Err(DomainError::validation_error(
                    "Item",
                    "The server needs the image bytes, not a link",
                ))
            }
        };

        let file_name = draft
            .file_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("{}.{}", draft.category, image_codec::extension_for(&mime)));
        let part = Part::bytes(data.to_vec()).file_name(file_name).mime_str(&mime)?;
        let tags = draft.tags.iter().cloned().collect::<Vec<_>>().join(",");

        let form = Form::new()
            .part("image", part)
            .text("title", draft.name.clone())
            .text("tags", tags)
            .text("category", draft.category.as_str().to_string());

        let response = self
            .client
            .post(self.items_url())
            .bearer_auth(self.session.token())
            .multipart(form)
            .send()
            .await?;
        let mut item = self.read_item(Self::check(response).await?).await?;

        // el backend original no guarda la categoría; la del borrador manda
        item.category = draft.category;
        item.tags.extend(draft.tags);
        if item.name.is_empty() {
            item.name = draft.name;
        }

        debug!("Server stored {}", item.key);
        Ok(item)
    }

    #[instrument(skip(self, item), fields(key = %item.key))]
    async fn reinsert(&self, item: Item) -> Result<Item> {
        self.server_id(&item.key)?;

        // la fila nunca salió del servidor; sólo hay que comprobar que sigue ahí
        match self.fetch_all().await {
            Ok(remote) if !remote.iter().any(|existing| existing.key == item.key) => {
                return Err(DomainError::not_found("RemoteItem", item.key.to_string()));
            }
            Ok(_) => {}
            Err(e) if e.is_auth_failure() => return Err(e),
            Err(e) => debug!("Could not confirm {} on the server ({}), restoring the snapshot", item.key, e),
        }

        self.hidden.write().await.remove(&item.key);
        debug!("{} visible again", item.key);
        Ok(item)
    }

    async fn remove(&self, key: &ItemKey) -> Result<()> {
        self.hidden.write().await.insert(key.clone());
        debug!("{} hidden for this session", key);
        Ok(())
    }

    #[instrument(skip(self, item), fields(key = %item.key))]
    async fn update(&self, item: &Item) -> Result<Item> {
        let id = self.server_id(&item.key)?;
        let body = json!({
            "title": item.name,
            "tags": item.tags,
            "category": item.category,
            "metadata": { "category": item.category },
            "isFavorite": item.is_favorite,
        });

        let response = self
            .client
            .put(self.item_url(id))
            .bearer_auth(self.session.token())
            .json(&body)
            .send()
            .await?;

        if update_unsupported(response.status()) {
            warn!(
                "Server did not accept an update of {} ({}), keeping it for this session",
                item.key,
                response.status().as_u16()
            );
            self.favorites.write().await.insert(item.key.clone(), item.is_favorite);
            return Ok(item.clone());
        }
        let response = Self::check(response).await?;
        self.favorites.write().await.remove(&item.key);

        // algunas versiones del backend responden sin cuerpo
        let mut updated = match self.read_item(response).await {
            Ok(updated) => updated,
            Err(e) => {
                debug!("Update of {} returned no usable item ({}), keeping local copy", item.key, e);
                item.clone()
            }
        };
        updated.category = item.category;
        updated.is_favorite = item.is_favorite;
        updated.created_at = item.created_at;
        if let ImageLocator::Url(url) = &updated.image {
            if url.is_empty() {
                updated.image = item.image.clone();
            }
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn purge(&self, key: &ItemKey) -> Result<()> {
        let id = self.server_id(key)?;
        let response = self
            .client
            .delete(self.item_url(id))
            .bearer_auth(self.session.token())
            .send()
            .await?;

        match Self::check(response).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind == ErrorKind::NotFound => {
                debug!("{} already gone from the server", key);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Multipart, Path, State};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::{get, put};
    use axum::{Json, Router};

    #[derive(Default)]
    struct Backend {
        uploads: Mutex<Vec<(String, String, String, String, usize)>>,
        deleted: Mutex<Vec<String>>,
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map_or(false, |v| v == "Bearer good-token")
    }

    async fn list_items(headers: HeaderMap) -> impl IntoResponse {
        if !authorized(&headers) {
            return (AxumStatus::UNAUTHORIZED, Json(json!({ "msg": "Token is not valid" })));
        }
        (
            AxumStatus::OK,
            Json(json!({
                "success": true,
                "data": [
                    { "_id": "a1", "title": "Blue Shirt", "imageUrl": "https://cdn.test/a1.png",
                      "tags": ["upper", "summer"], "createdAt": "2024-03-01T10:00:00Z" },
                    { "_id": "b2", "title": "Loafers", "imageUrl": "https://cdn.test/b2.png",
                      "tags": "shoes", "metadata": { "category": "bottom" } },
                    { "title": "no id, dropped" }
                ]
            })),
        )
    }

    async fn create_item(
        State(backend): State<Arc<Backend>>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> impl IntoResponse {
        if !authorized(&headers) {
            return (AxumStatus::FORBIDDEN, Json(json!({ "msg": "forbidden" })));
        }
        let (mut title, mut tags, mut category, mut mime, mut size) =
            (String::new(), String::new(), String::new(), String::new(), 0);
        while let Some(field) = multipart.next_field().await.unwrap() {
            match field.name().unwrap_or_default().to_string().as_str() {
                "image" => {
                    mime = field.content_type().unwrap_or_default().to_string();
                    size = field.bytes().await.unwrap().len();
                }
                "title" => title = field.text().await.unwrap(),
                "tags" => tags = field.text().await.unwrap(),
                "category" => category = field.text().await.unwrap(),
                _ => {}
            }
        }
        backend
            .uploads
            .lock()
            .unwrap()
            .push((title.clone(), tags.clone(), category, mime, size));
        (
            AxumStatus::OK,
            Json(json!({ "_id": "new1", "title": title, "imageUrl": "https://cdn.test/new1.png", "tags": tags.split(',').collect::<Vec<_>>() })),
        )
    }

    async fn update_item(Path(id): Path<String>, Json(body): Json<Value>) -> impl IntoResponse {
        if id == "gone" {
            return (AxumStatus::NOT_FOUND, Json(json!({ "msg": "Item not found" })));
        }
        (
            AxumStatus::OK,
            Json(json!({ "success": true, "data": {
                "_id": id, "title": body["title"], "imageUrl": "https://cdn.test/u.png",
                "tags": body["tags"], "isFavorite": body["isFavorite"]
            }})),
        )
    }

    async fn delete_item(State(backend): State<Arc<Backend>>, Path(id): Path<String>) -> impl IntoResponse {
        if id == "gone" {
            return AxumStatus::NOT_FOUND;
        }
        backend.deleted.lock().unwrap().push(id);
        AxumStatus::OK
    }

    async fn spawn_backend() -> (String, Arc<Backend>) {
        let backend = Arc::new(Backend::default());
        let router = Router::new()
            .route("/api/items", get(list_items).post(create_item))
            .route("/api/items/{id}", put(update_item).delete(delete_item))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{}/api", addr), backend)
    }

    /// Backend con sólo `GET /items` y `POST /items`
    async fn spawn_list_and_create_backend() -> String {
        let router = Router::new()
            .route("/api/items", get(list_items).post(create_item))
            .with_state(Arc::new(Backend::default()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    fn store(base_url: &str, token: &str) -> RemoteItemStore {
        let session = Session::new(OwnerId::new("user-1"), token.to_string());
        RemoteItemStore::new(Client::new(), base_url, session)
    }

    #[tokio::test]
    async fn test_list_normalizes_remote_shapes() {
        let (base_url, _) = spawn_backend().await;
        let store = store(&base_url, "good-token");

        let items = store.list(&ItemQuery::all()).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].key, ItemKey::Server("a1".to_string()));
        assert_eq!(items[0].category, Category::Upper);
        assert_eq!(items[0].image, ImageLocator::Url("https://cdn.test/a1.png".to_string()));
        assert_eq!(items[1].category, Category::Bottom);
        assert!(items[1].tags.contains("shoes"));

        let uppers = store.list(&ItemQuery::category(Category::Upper)).await.unwrap();
        assert_eq!(uppers.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_credential_is_access_denied() {
        let (base_url, _) = spawn_backend().await;
        let store = store(&base_url, "expired");

        let err = store.list(&ItemQuery::all()).await.unwrap_err();
        assert!(err.is_auth_failure());
        assert!(err.message.contains("Token is not valid"));
    }

    #[tokio::test]
    async fn test_add_sends_multipart_with_binary_image() {
        let (base_url, backend) = spawn_backend().await;
        let store = store(&base_url, "good-token");

        let draft = ItemDraft::new(
            Category::Lower,
            "Jeans".to_string(),
            ImageLocator::inline("image/jpeg", vec![0xFFu8, 0xD8, 0xFF, 0x00]),
            Some("jeans.jpg".to_string()),
        );
        let item = store.add(draft).await.unwrap();

        assert_eq!(item.key, ItemKey::Server("new1".to_string()));
        assert_eq!(item.category, Category::Lower);
        assert_eq!(item.name, "Jeans");

        let uploads = backend.uploads.lock().unwrap();
        assert_eq!(
            uploads[0],
            ("Jeans".to_string(), "lower".to_string(), "lower".to_string(), "image/jpeg".to_string(), 4)
        );
    }

    #[tokio::test]
    async fn test_add_rejects_link_only_images() {
        let store = store("http://127.0.0.1:9/api", "good-token");
        let draft = ItemDraft::new(
            Category::Upper,
            "Link".to_string(),
            ImageLocator::Url("https://cdn.test/x.png".to_string()),
            None,
        );
        let err = store.add(draft).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_remove_hides_until_reinsert() {
        let (base_url, _) = spawn_backend().await;
        let store = store(&base_url, "good-token");
        let items = store.list(&ItemQuery::all()).await.unwrap();
        let shirt = items[0].clone();

        store.remove(&shirt.key).await.unwrap();
        let after = store.list(&ItemQuery::all()).await.unwrap();
        assert!(after.iter().all(|item| item.key != shirt.key));

        let restored = store.reinsert(shirt.clone()).await.unwrap();
        assert_eq!(restored.key, shirt.key);
        assert_eq!(restored.created_at, shirt.created_at);
        assert_eq!(store.list(&ItemQuery::all()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_purge_treats_missing_as_done() {
        let (base_url, backend) = spawn_backend().await;
        let store = store(&base_url, "good-token");

        store.purge(&ItemKey::Server("a1".to_string())).await.unwrap();
        store.purge(&ItemKey::Server("gone".to_string())).await.unwrap();
        assert!(store.purge(&ItemKey::Local("1".to_string())).await.is_err());
        assert_eq!(*backend.deleted.lock().unwrap(), vec!["a1".to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transient() {
        let store = store("http://127.0.0.1:9/api", "good-token");
        let err = store.list(&ItemQuery::all()).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_reinsert_needs_no_update_endpoint() {
        let base_url = spawn_list_and_create_backend().await;
        let store = store(&base_url, "good-token");
        let shirt = store.list(&ItemQuery::all()).await.unwrap()[0].clone();

        store.remove(&shirt.key).await.unwrap();
        let restored = store.reinsert(shirt.clone()).await.unwrap();

        assert_eq!(restored, shirt);
        let keys: Vec<ItemKey> = store.list(&ItemQuery::all()).await.unwrap().into_iter().map(|i| i.key).collect();
        assert_eq!(keys, vec![ItemKey::Server("a1".to_string()), ItemKey::Server("b2".to_string())]);
    }

    #[tokio::test]
    async fn test_reinsert_of_vanished_row_is_not_found() {
        let (base_url, _) = spawn_backend().await;
        let store = store(&base_url, "good-token");
        let mut ghost = store.list(&ItemQuery::all()).await.unwrap()[0].clone();
        ghost.key = ItemKey::Server("gone".to_string());

        store.remove(&ghost.key).await.unwrap();
        let err = store.reinsert(ghost).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_favorite_kept_for_session_without_update_endpoint() {
        let base_url = spawn_list_and_create_backend().await;
        let store = store(&base_url, "good-token");
        let mut shirt = store.list(&ItemQuery::all()).await.unwrap()[0].clone();
        shirt.is_favorite = true;

        let saved = store.update(&shirt).await.unwrap();
        assert!(saved.is_favorite);
        assert_eq!(saved.key, shirt.key);

        let listed = store.list(&ItemQuery::all()).await.unwrap();
        assert!(listed[0].is_favorite);
        assert!(!listed[1].is_favorite);
    }
}
