use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::dtos::upload_dto::PendingUploadDto;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::item::Category;
use crate::domain::entities::upload::StyleChoice;

struct PendingSelection {
    info: PendingUploadDto,
    responder: oneshot::Sender<StyleChoice>,
}

/// Canal de petición/respuesta para la elección de estilo de una subida.
///
/// Holds at most one pending request. A new request supersedes the previous one: its
/// responder is dropped and the superseded upload observes a closed channel.
pub struct StyleSelector {
    pending: Mutex<Option<PendingSelection>>,
}

impl StyleSelector {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<PendingSelection>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registra una elección pendiente para `upload_id` y devuelve el extremo que la espera
    pub fn request(
        &self,
        upload_id: Uuid,
        category: Category,
        file_name: Option<String>,
    ) -> oneshot::Receiver<StyleChoice> {
        let (responder, receiver) = oneshot::channel();
        let info = PendingUploadDto {
            upload_id,
            category,
            file_name,
            choices: StyleChoice::ALL.to_vec(),
            requested_at: Utc::now(),
        };

        let previous = self.slot().replace(PendingSelection { info, responder });
        if let Some(previous) = previous {
            if !previous.responder.is_closed() {
                info!(
                    "Upload {} superseded by {} before a style was chosen",
                    previous.info.upload_id, upload_id
                );
            }
        }

        debug!("Waiting for style choice on upload {}", upload_id);
        receiver
    }

    /// Entrega la elección del usuario a la subida pendiente
    pub fn resolve(&self, upload_id: Uuid, choice: StyleChoice) -> Result<()> {
        let pending = {
            let mut slot = self.slot();
            match slot.as_ref() {
                Some(pending) if pending.info.upload_id == upload_id => slot.take(),
                _ => None,
            }
        };

        let pending = pending.ok_or_else(|| DomainError::not_found("Upload", upload_id.to_string()))?;
        pending.responder.send(choice).map_err(|_| {
            warn!("Upload {} was abandoned before its style was chosen", upload_id);
            DomainError::cancelled("Upload", "The upload is no longer waiting for a style")
                .with_id(upload_id.to_string())
        })?;

        debug!("Style {} chosen for upload {}", choice, upload_id);
        Ok(())
    }

    /// Descarta la petición pendiente si sigue siendo la de `upload_id`
    pub fn cancel(&self, upload_id: Uuid) -> bool {
        let mut slot = self.slot();
        match slot.as_ref() {
            Some(pending) if pending.info.upload_id == upload_id => {
                slot.take();
                true
            }
            _ => false,
        }
    }

    /// Petición que espera respuesta, si la hay
    pub fn pending(&self) -> Option<PendingUploadDto> {
        self.slot()
            .as_ref()
            .filter(|pending| !pending.responder.is_closed())
            .map(|pending| pending.info.clone())
    }
}

impl Default for StyleSelector {
    fn default() -> Self {
        Self::new()
    }
}
