use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

use crate::application::dtos::item_dto::{ItemDto, WardrobeStatsDto};
use crate::application::dtos::notice_dto::{Notice, Outcome};
use crate::application::dtos::outfit_dto::{OutfitDto, SaveOutfitRequest};
use crate::application::dtos::session_dto::SessionDto;
use crate::application::dtos::trash_dto::TrashedItemDto;
use crate::application::dtos::upload_dto::AddItemRequest;
use crate::application::ports::inbound::WardrobeUseCase;
use crate::application::ports::session_ports::CredentialValidator;
use crate::application::ports::storage_ports::ItemStoreFactory;
use crate::application::ports::trash_ports::TrashUseCase;
use crate::application::services::upload_pipeline::UploadPipeline;
use crate::common::errors::{DomainError, ErrorKind, Result};
use crate::domain::entities::item::{Category, Item, ItemDraft, ItemKey, OwnerId};
use crate::domain::entities::outfit::{Outfit, OutfitSlots};
use crate::domain::entities::session::{Session, SessionStatus};
use crate::domain::entities::trash_record::TrashRecord;
use crate::domain::repositories::item_repository::{ItemStore, StoreMode};
use crate::domain::repositories::outfit_repository::OutfitRepository;
use crate::domain::repositories::trash_repository::TrashRepository;
use crate::domain::services::item_query::ItemQuery;

pub const REMOTE_FALLBACK_NOTICE: &str = "Could not reach the server. The item was saved on this device.";
pub const REMOTE_LINK_NOTICE: &str = "The image could not be uploaded. The item was saved on this device.";
pub const SESSION_EXPIRED_NOTICE: &str =
    "Your session is no longer valid. Continuing without an account; items are saved on this device.";
pub const STALE_UPLOAD_NOTICE: &str = "The session changed during the upload; the item was saved to the previous wardrobe.";
pub const REMOTE_LIST_NOTICE: &str = "Could not load items from the server. Showing items saved on this device.";
pub const REMOTE_MISSING_NOTICE: &str = "The item no longer exists on the server. It was restored on this device.";

/// Almacenes activos para un propietario, etiquetados con la época de sesión que los creó
#[derive(Clone)]
struct StoreContext {
    epoch: u64,
    owner: OwnerId,
    primary: Arc<dyn ItemStore>,
    /// Almacén local del mismo propietario; sólo existe en modo remoto
    fallback: Option<Arc<dyn ItemStore>>,
}

impl StoreContext {
    fn mode(&self) -> StoreMode {
        self.primary.mode()
    }

    /// Local keys live on the device even while a remote store is active
    fn store_for(&self, key: &ItemKey) -> &Arc<dyn ItemStore> {
        match (key, &self.fallback) {
            (ItemKey::Local(_), Some(local)) => local,
            _ => &self.primary,
        }
    }

    fn device_store(&self) -> &Arc<dyn ItemStore> {
        self.fallback.as_ref().unwrap_or(&self.primary)
    }
}

struct ManagerState {
    context: StoreContext,
    items: Vec<Item>,
}

/// Única autoridad sobre las transiciones de una prenda:
/// activa → papelera → restaurada | borrada definitivamente.
///
/// Mutations are serialized by `op_lock`. Every operation snapshots the [`StoreContext`] it
/// started with and only touches the in-memory list if the session epoch is unchanged, so an
/// in-flight write against a previous backend completes without leaking into the new one.
pub struct LifecycleManager {
    stores: Arc<dyn ItemStoreFactory>,
    trash_repository: Arc<dyn TrashRepository>,
    outfit_repository: Arc<dyn OutfitRepository>,
    validator: Arc<dyn CredentialValidator>,
    pipeline: UploadPipeline,
    state: RwLock<ManagerState>,
    op_lock: Mutex<()>,
    status: watch::Sender<SessionStatus>,
}

impl LifecycleManager {
    /// Arranca en modo local anónimo; llamar a `reload` o `switch_session` para cargar datos
    pub fn new(
        stores: Arc<dyn ItemStoreFactory>,
        trash_repository: Arc<dyn TrashRepository>,
        outfit_repository: Arc<dyn OutfitRepository>,
        validator: Arc<dyn CredentialValidator>,
        pipeline: UploadPipeline,
    ) -> Self {
        let context = Self::build_context(stores.as_ref(), 0, None);
        let (status, _) = watch::channel(SessionStatus::Anonymous);
        Self {
            stores,
            trash_repository,
            outfit_repository,
            validator,
            pipeline,
            state: RwLock::new(ManagerState {
                context,
                items: Vec::new(),
            }),
            op_lock: Mutex::new(()),
            status,
        }
    }

    pub fn pipeline(&self) -> &UploadPipeline {
        &self.pipeline
    }

    fn build_context(stores: &dyn ItemStoreFactory, epoch: u64, session: Option<&Session>) -> StoreContext {
        match session {
            Some(session) => StoreContext {
                epoch,
                owner: session.owner_id().clone(),
                primary: stores.remote_store(session),
                fallback: Some(stores.local_store(session.owner_id())),
            },
            None => {
                let owner = OwnerId::anonymous();
                StoreContext {
                    epoch,
                    primary: stores.local_store(&owner),
                    fallback: None,
                    owner,
                }
            }
        }
    }

    async fn context(&self) -> StoreContext {
        self.state.read().await.context.clone()
    }

    /// Aplica el cambio sólo si la sesión no cambió desde que empezó la operación
    async fn apply<F>(&self, epoch: u64, change: F) -> bool
    where
        F: FnOnce(&mut Vec<Item>),
    {
        let mut state = self.state.write().await;
        if state.context.epoch != epoch {
            debug!(
                "Discarding stale result from epoch {} (current {})",
                epoch, state.context.epoch
            );
            return false;
        }
        change(&mut state.items);
        true
    }

    /// Instala un contexto nuevo y vacía la vista en memoria
    async fn install(&self, session: Option<&Session>) -> StoreContext {
        let mut state = self.state.write().await;
        let epoch = state.context.epoch + 1;
        let context = Self::build_context(self.stores.as_ref(), epoch, session);
        state.context = context.clone();
        state.items.clear();
        context
    }

    async fn find_active(&self, key: &ItemKey) -> Option<Item> {
        self.state
            .read()
            .await
            .items
            .iter()
            .find(|item| item.matches_key(key))
            .cloned()
    }

    /// Lee los almacenes del contexto y oculta lo que ya está en la papelera o pendiente de purga
    async fn load_items(&self, context: &StoreContext) -> Result<(Vec<Item>, Vec<Notice>)> {
        let mut notices = Vec::new();
        let trashed: HashSet<ItemKey> = self
            .trash_repository
            .get_trash_items(&context.owner)
            .await?
            .into_iter()
            .map(|record| record.item.key)
            .collect();
        let purge_pending = self.trash_repository.get_purge_pending(&context.owner).await?;

        let mut reached_primary = true;
        let mut items = match context.primary.list(&ItemQuery::all()).await {
            Ok(items) => items,
            Err(e) if e.is_auth_failure() => return Err(e),
            Err(e) if context.fallback.is_some() && e.is_transient() => {
                warn!("Remote list failed for {}: {}", context.owner, e);
                notices.push(Notice::warning(REMOTE_LIST_NOTICE));
                reached_primary = false;
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        if let Some(local) = &context.fallback {
            match local.list(&ItemQuery::all()).await {
                Ok(mut saved_on_device) => items.append(&mut saved_on_device),
                Err(e) => warn!("Could not read device items for {}: {}", context.owner, e),
            }
        }

        let mut visible = Vec::with_capacity(items.len());
        for item in items {
            if purge_pending.contains(&item.key) {
                debug!("{} was permanently deleted, waiting for the remote purge", item.key);
            } else if trashed.contains(&item.key) {
                // papelera escrita pero borrado en el almacén pendiente
                debug!("Reconciling {}: already in trash", item.key);
                if let Err(e) = context.store_for(&item.key).remove(&item.key).await {
                    warn!("Could not reconcile {} with the trash: {}", item.key, e);
                }
            } else {
                visible.push(item);
            }
        }

        if reached_primary && !purge_pending.is_empty() {
            self.purge_remote(context, purge_pending).await;
        }

        Ok((visible, notices))
    }

    async fn load_and_apply(&self, context: &StoreContext) -> Result<Vec<Notice>> {
        let (items, notices) = self.load_items(context).await?;
        let count = items.len();
        if self.apply(context.epoch, move |current| *current = items).await {
            debug!("Loaded {} items for {} ({:?})", count, context.owner, context.mode());
        }
        Ok(notices)
    }

    /// Fuerza el modo local tras un 401/403 del almacén remoto.
    ///
    /// Only acts if `context` is still the active one; returns the notice to surface.
    async fn invalidate(&self, context: &StoreContext, cause: &DomainError) -> Vec<Notice> {
        let fresh = {
            let mut state = self.state.write().await;
            if state.context.epoch != context.epoch {
                return Vec::new();
            }
            let epoch = state.context.epoch + 1;
            let fresh = Self::build_context(self.stores.as_ref(), epoch, None);
            state.context = fresh.clone();
            state.items.clear();
            fresh
        };

        warn!("Credential of {} rejected by the remote store: {}", context.owner, cause);
        self.status.send_replace(SessionStatus::Invalidated {
            owner_id: context.owner.clone(),
            reason: cause.message.clone(),
        });

        let mut notices = vec![Notice::warning(SESSION_EXPIRED_NOTICE)];
        match self.load_and_apply(&fresh).await {
            Ok(mut more) => notices.append(&mut more),
            Err(e) => error!("Could not load device items after invalidation: {}", e),
        }
        notices
    }

    async fn reload_context(&self, context: StoreContext) -> Result<Vec<Notice>> {
        match self.load_and_apply(&context).await {
            Ok(notices) => Ok(notices),
            Err(e) if e.is_auth_failure() => Ok(self.invalidate(&context, &e).await),
            Err(e) => Err(e),
        }
    }

    /// Guarda una prenda nueva en el contexto; devuelve la época a la que pertenece el resultado
    async fn persist_new(
        &self,
        context: &StoreContext,
        draft: ItemDraft,
        notices: &mut Vec<Notice>,
    ) -> Result<(Item, u64)> {
        if context.mode() == StoreMode::Local {
            return Ok((context.primary.add(draft).await?, context.epoch));
        }

        let device = context.device_store().clone();
        if !draft.image.is_inline() {
            warn!("Image for '{}' is only a link, keeping the item on the device", draft.name);
            notices.push(Notice::warning(REMOTE_LINK_NOTICE));
            return Ok((device.add(draft).await?, context.epoch));
        }

        match context.primary.add(draft.clone()).await {
            Ok(item) => Ok((item, context.epoch)),
            Err(e) if e.is_auth_failure() => {
                notices.extend(self.invalidate(context, &e).await);
                let current = self.context().await;
                Ok((current.primary.add(draft).await?, current.epoch))
            }
            Err(e) if e.is_transient() => {
                warn!("Remote add failed, saving '{}' on the device: {}", draft.name, e);
                notices.push(Notice::warning(REMOTE_FALLBACK_NOTICE));
                Ok((device.add(draft).await?, context.epoch))
            }
            Err(e) => Err(e),
        }
    }

    /// Anota como pendientes de purga las claves de servidor de `records` y las devuelve
    async fn mark_for_purge(&self, context: &StoreContext, records: &[TrashRecord]) -> Result<Vec<ItemKey>> {
        let keys: Vec<ItemKey> = records
            .iter()
            .filter(|record| record.key().is_server() && record.item.owner_id == context.owner)
            .map(|record| record.key().clone())
            .collect();
        if !keys.is_empty() {
            self.trash_repository.mark_purge_pending(&context.owner, &keys).await?;
        }
        Ok(keys)
    }

    /// Borrado remoto best-effort; sólo las purgas confirmadas salen de la lista de pendientes
    async fn purge_remote(&self, context: &StoreContext, keys: Vec<ItemKey>) {
        if keys.is_empty() {
            return;
        }
        if context.mode() != StoreMode::Remote {
            debug!("{} remote purges wait for a session of {}", keys.len(), context.owner);
            return;
        }

        let results = join_all(keys.into_iter().map(|key| async move {
            let result = context.primary.purge(&key).await;
            (key, result)
        }))
        .await;

        let mut purged = Vec::new();
        for (key, result) in results {
            match result {
                Ok(()) => {
                    debug!("Purged {} from the remote store", key);
                    purged.push(key);
                }
                Err(e) => warn!("Remote purge of {} failed, retrying on next load: {}", key, e),
            }
        }

        if !purged.is_empty() {
            if let Err(e) = self.trash_repository.clear_purge_pending(&context.owner, &purged).await {
                warn!("Could not update pending purges of {}: {}", context.owner, e);
            }
        }
    }

    async fn current_status(&self) -> SessionDto {
        let state = self.state.read().await;
        SessionDto {
            status: self.status.borrow().clone(),
            owner_id: state.context.owner.to_string(),
            mode: state.context.mode(),
        }
    }
}

fn draft_from(item: &Item) -> ItemDraft {
    let mut draft = ItemDraft::new(item.category, item.name.clone(), item.image.clone(), None);
    draft.tags.extend(item.tags.iter().cloned());
    draft
}

fn parse_slot(raw: &Option<String>) -> Result<Option<ItemKey>> {
    match raw.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => Ok(Some(value.parse()?)),
        None => Ok(None),
    }
}

#[async_trait]
impl WardrobeUseCase for LifecycleManager {
    async fn session(&self) -> SessionDto {
        self.current_status().await
    }

    #[instrument(skip(self, session))]
    async fn switch_session(&self, session: Option<Session>) -> Result<Outcome<SessionDto>> {
        let mut notices = Vec::new();

        let (session, status) = match session {
            None => (None, SessionStatus::Anonymous),
            Some(session) if session.owner_id().is_anonymous() => {
                return Err(DomainError::validation_error("Session", "A session needs an owner id"));
            }
            Some(session) => match self.validator.validate(&session) {
                Ok(()) => {
                    let owner_id = session.owner_id().clone();
                    (Some(session), SessionStatus::Authenticated { owner_id })
                }
                Err(e) => {
                    warn!("Rejected session for {}: {}", session.owner_id(), e);
                    notices.push(Notice::warning(SESSION_EXPIRED_NOTICE));
                    let status = SessionStatus::Invalidated {
                        owner_id: session.owner_id().clone(),
                        reason: e.message,
                    };
                    (None, status)
                }
            },
        };

        let context = self.install(session.as_ref()).await;
        info!("Switched to owner {} ({:?} store)", context.owner, context.mode());
        self.status.send_replace(status);

        notices.extend(self.reload_context(context).await?);
        Ok(Outcome::with_notices(self.current_status().await, notices))
    }

    fn subscribe_session(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    #[instrument(skip(self))]
    async fn reload(&self) -> Result<Outcome<usize>> {
        let context = self.context().await;
        let notices = self.reload_context(context).await?;
        let count = self.state.read().await.items.len();
        Ok(Outcome::with_notices(count, notices))
    }

    async fn items(&self, query: &ItemQuery) -> Vec<ItemDto> {
        let state = self.state.read().await;
        query.apply(state.items.iter()).into_iter().map(ItemDto::from).collect()
    }

    #[instrument(skip(self, request))]
    async fn add_item(&self, request: AddItemRequest) -> Result<Outcome<ItemDto>> {
        // el contexto se fija antes de las suspensiones de la subida
        let context = self.context().await;
        let mut prepared = self.pipeline.prepare(request).await?;

        let _guard = self.op_lock.lock().await;
        let mut notices = std::mem::take(&mut prepared.notices);
        let (item, epoch) = self.persist_new(&context, prepared.draft.clone(), &mut notices).await?;
        prepared.mark_persisted();

        let visible = item.clone();
        if self.apply(epoch, move |items| items.push(visible)).await {
            info!(
                "Added {} to {} ({}, upload {:?})",
                item.key,
                item.owner_id,
                item.category,
                prepared.state()
            );
        } else {
            info!("Session changed during upload {}, {} kept out of the current view", prepared.upload_id(), item.key);
            notices.push(Notice::info(STALE_UPLOAD_NOTICE));
        }

        Ok(Outcome::with_notices(ItemDto::from(item), notices))
    }

    #[instrument(skip(self))]
    async fn toggle_favorite(&self, key: &ItemKey) -> Result<Outcome<ItemDto>> {
        let _guard = self.op_lock.lock().await;
        let context = self.context().await;

        let mut updated = self
            .find_active(key)
            .await
            .ok_or_else(|| DomainError::not_found("Item", key.to_string()))?;
        updated.is_favorite = !updated.is_favorite;

        let saved = match context.store_for(key).update(&updated).await {
            Ok(saved) => saved,
            Err(e) if e.is_auth_failure() => {
                self.invalidate(&context, &e).await;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let visible = saved.clone();
        self.apply(context.epoch, move |items| {
            if let Some(slot) = items.iter_mut().find(|item| item.matches_key(&visible.key)) {
                *slot = visible;
            }
        })
        .await;

        debug!("Favorite flag of {} is now {}", key, saved.is_favorite);
        Ok(Outcome::new(ItemDto::from(saved)))
    }

    async fn favorites(&self) -> Vec<ItemDto> {
        let state = self.state.read().await;
        state
            .items
            .iter()
            .filter(|item| item.is_favorite)
            .cloned()
            .map(ItemDto::from)
            .collect()
    }

    #[instrument(skip(self, request))]
    async fn save_outfit(&self, request: SaveOutfitRequest) -> Result<OutfitDto> {
        let slots = OutfitSlots {
            upper: parse_slot(&request.upper)?,
            lower: parse_slot(&request.lower)?,
            bottom: parse_slot(&request.bottom)?,
        };

        let _guard = self.op_lock.lock().await;
        let context = self.context().await;
        for key in [&slots.upper, &slots.lower, &slots.bottom].into_iter().flatten() {
            if self.find_active(key).await.is_none() {
                return Err(DomainError::not_found("Item", key.to_string()));
            }
        }

        let outfit = Outfit::new(request.name, slots)?;
        self.outfit_repository.save_outfit(&context.owner, &outfit).await?;
        info!("Saved outfit {} for {}", outfit.id, context.owner);
        Ok(OutfitDto::from(outfit))
    }

    async fn outfits(&self) -> Result<Vec<OutfitDto>> {
        let context = self.context().await;
        let outfits = self.outfit_repository.get_outfits(&context.owner).await?;
        Ok(outfits.into_iter().map(OutfitDto::from).collect())
    }

    async fn stats(&self) -> Result<WardrobeStatsDto> {
        let (context, items) = {
            let state = self.state.read().await;
            (state.context.clone(), state.items.clone())
        };

        let mut by_category: BTreeMap<Category, usize> = Category::ALL.iter().map(|c| (*c, 0)).collect();
        for item in &items {
            *by_category.entry(item.category).or_insert(0) += 1;
        }

        let outfits = self.outfit_repository.get_outfits(&context.owner).await?.len();
        let trashed = self.trash_repository.get_trash_items(&context.owner).await?.len();

        Ok(WardrobeStatsDto {
            owner_id: context.owner.to_string(),
            mode: context.mode(),
            total_items: items.len(),
            by_category,
            favorites: items.iter().filter(|item| item.is_favorite).count(),
            outfits,
            trashed,
        })
    }
}

#[async_trait]
impl TrashUseCase for LifecycleManager {
    async fn trash_items(&self) -> Result<Vec<TrashedItemDto>> {
        let context = self.context().await;
        let mut records = self.trash_repository.get_trash_items(&context.owner).await?;
        records.sort_by(|a, b| b.trashed_at.cmp(&a.trashed_at));
        Ok(records.into_iter().map(TrashedItemDto::from).collect())
    }

    #[instrument(skip(self))]
    async fn move_to_trash(&self, key: &ItemKey) -> Result<Outcome<TrashedItemDto>> {
        let _guard = self.op_lock.lock().await;
        let context = self.context().await;

        let item = match self.find_active(key).await {
            Some(item) => item,
            None => {
                // reintento tras un fallo parcial: el registro ya está en la papelera
                return match self.trash_repository.get_trash_item(&context.owner, key).await? {
                    Some(record) => Ok(Outcome::new(TrashedItemDto::from(record))),
                    None => Err(DomainError::not_found("Item", key.to_string())),
                };
            }
        };

        // Primero la papelera, luego el almacén
        let record = TrashRecord::new(item);
        self.trash_repository.add_to_trash(&context.owner, &record).await?;

        if let Err(e) = context.store_for(key).remove(key).await {
            warn!("Store removal of {} failed, it will be reconciled on next load: {}", key, e);
        }

        self.apply(context.epoch, |items| items.retain(|item| !item.matches_key(key)))
            .await;

        info!("Moved {} to the trash of {}", key, context.owner);
        Ok(Outcome::new(TrashedItemDto::from(record)))
    }

    #[instrument(skip(self))]
    async fn restore_item(&self, key: &ItemKey) -> Result<Outcome<Option<ItemDto>>> {
        let _guard = self.op_lock.lock().await;
        let context = self.context().await;
        let mut notices = Vec::new();

        let record = match self.trash_repository.get_trash_item(&context.owner, key).await? {
            Some(record) => record,
            None => {
                debug!("{} is not in the trash of {}, nothing to restore", key, context.owner);
                return Ok(Outcome::new(None));
            }
        };

        let item = record.into_item();
        let restored = match context.store_for(key).reinsert(item.clone()).await {
            Ok(restored) => restored,
            Err(e) if e.is_auth_failure() => {
                self.invalidate(&context, &e).await;
                return Err(e);
            }
            Err(e) if e.kind == ErrorKind::NotFound && item.key.is_server() => {
                warn!("{} no longer exists on the server, restoring it on the device", item.key);
                notices.push(Notice::warning(REMOTE_MISSING_NOTICE));
                context.device_store().add(draft_from(&item)).await?
            }
            Err(e) => return Err(e),
        };

        self.trash_repository.remove_from_trash(&context.owner, key).await?;

        let visible = restored.clone();
        self.apply(context.epoch, move |items| {
            items.retain(|item| !item.matches_key(&visible.key));
            items.push(visible);
        })
        .await;

        info!("Restored {} into {}", restored.key, restored.category);
        Ok(Outcome::with_notices(Some(ItemDto::from(restored)), notices))
    }

    #[instrument(skip(self))]
    async fn permanently_delete(&self, key: &ItemKey) -> Result<Outcome<()>> {
        let _guard = self.op_lock.lock().await;
        let context = self.context().await;

        let record = match self.trash_repository.get_trash_item(&context.owner, key).await? {
            Some(record) => record,
            None => {
                debug!("{} already gone from the trash of {}", key, context.owner);
                return Ok(Outcome::new(()));
            }
        };

        // la marca de purga se escribe antes de quitar el registro del ledger
        let pending = self.mark_for_purge(&context, std::slice::from_ref(&record)).await?;
        self.trash_repository.remove_from_trash(&context.owner, key).await?;
        self.purge_remote(&context, pending).await;

        info!("Permanently deleted {}", key);
        Ok(Outcome::new(()))
    }

    #[instrument(skip(self))]
    async fn clear_trash(&self) -> Result<Outcome<usize>> {
        let _guard = self.op_lock.lock().await;
        let context = self.context().await;

        let records = self.trash_repository.get_trash_items(&context.owner).await?;
        let pending = self.mark_for_purge(&context, &records).await?;
        self.trash_repository.clear_trash(&context.owner).await?;
        self.purge_remote(&context, pending).await;

        info!("Cleared {} records from the trash of {}", records.len(), context.owner);
        Ok(Outcome::new(records.len()))
    }
}
