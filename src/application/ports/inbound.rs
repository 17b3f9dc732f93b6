use async_trait::async_trait;
use tokio::sync::watch;

use crate::application::dtos::item_dto::{ItemDto, WardrobeStatsDto};
use crate::application::dtos::notice_dto::Outcome;
use crate::application::dtos::outfit_dto::{OutfitDto, SaveOutfitRequest};
use crate::application::dtos::session_dto::SessionDto;
use crate::application::dtos::upload_dto::AddItemRequest;
use crate::common::errors::Result;
use crate::domain::entities::item::ItemKey;
use crate::domain::entities::session::{Session, SessionStatus};
use crate::domain::services::item_query::ItemQuery;

/// Puerto primario para las operaciones sobre el armario activo
#[async_trait]
pub trait WardrobeUseCase: Send + Sync {
    /// Estado de la sesión y del almacén activo
    async fn session(&self) -> SessionDto;

    /// Cambia de propietario (o a anónimo con `None`) y recarga sin mezclar datos
    async fn switch_session(&self, session: Option<Session>) -> Result<Outcome<SessionDto>>;

    /// Canal con el estado de sesión, incluidas las invalidaciones forzadas
    fn subscribe_session(&self) -> watch::Receiver<SessionStatus>;

    /// Vuelve a leer el almacén activo y reconcilia con la papelera
    async fn reload(&self) -> Result<Outcome<usize>>;

    /// Prendas activas según la consulta
    async fn items(&self, query: &ItemQuery) -> Vec<ItemDto>;

    /// Sube una prenda nueva pasando por el pipeline de subida
    async fn add_item(&self, request: AddItemRequest) -> Result<Outcome<ItemDto>>;

    async fn toggle_favorite(&self, key: &ItemKey) -> Result<Outcome<ItemDto>>;

    async fn favorites(&self) -> Vec<ItemDto>;

    async fn save_outfit(&self, request: SaveOutfitRequest) -> Result<OutfitDto>;

    async fn outfits(&self) -> Result<Vec<OutfitDto>>;

    async fn stats(&self) -> Result<WardrobeStatsDto>;
}
