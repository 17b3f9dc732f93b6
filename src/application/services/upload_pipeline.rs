use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::application::dtos::notice_dto::Notice;
use crate::application::dtos::upload_dto::AddItemRequest;
use crate::application::ports::transform_ports::{ImageFetchPort, StyleTransformPort};
use crate::application::services::style_selector::StyleSelector;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::item::{default_item_name, ImageLocator, ItemDraft};
use crate::domain::entities::upload::{ImageBlob, ImagePayload, StyleChoice, UploadState};
use crate::domain::services::image_codec;

pub const TRANSFORM_FAILED_NOTICE: &str = "Cartoonization failed. Saving original.";
pub const IMAGE_LINK_NOTICE: &str = "The image could not be downloaded; it was saved as a link.";

/// Imagen tal y como quedó tras la captura
#[derive(Debug, Clone)]
enum CapturedImage {
    Blob(ImageBlob),
    Url(String),
}

/// Sigue los estados de una subida y rechaza transiciones no válidas
#[derive(Debug, Clone)]
struct UploadTracker {
    upload_id: Uuid,
    history: Vec<UploadState>,
}

impl UploadTracker {
    fn new(upload_id: Uuid) -> Self {
        Self {
            upload_id,
            history: vec![UploadState::Captured],
        }
    }

    fn state(&self) -> UploadState {
        self.history.last().copied().unwrap_or(UploadState::Captured)
    }

    fn advance(&mut self, next: UploadState) {
        let current = self.state();
        if current.can_transition_to(next) {
            debug!("Upload {}: {:?} -> {:?}", self.upload_id, current, next);
            self.history.push(next);
        } else {
            warn!("Upload {}: ignoring invalid transition {:?} -> {:?}", self.upload_id, current, next);
        }
    }
}

/// Borrador listo para persistir, con los avisos acumulados durante la subida
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    pub draft: ItemDraft,
    pub style: StyleChoice,
    pub notices: Vec<Notice>,
    tracker: UploadTracker,
}

impl PreparedUpload {
    pub fn upload_id(&self) -> Uuid {
        self.tracker.upload_id
    }

    pub fn state(&self) -> UploadState {
        self.tracker.state()
    }

    pub fn mark_persisted(&mut self) {
        self.tracker.advance(UploadState::Persisted);
    }
}

/// Convierte una imagen capturada en el borrador de una prenda.
///
/// Suspends on the style choice and on the transform call. A failed or timed-out transform
/// never drops the upload: the original image goes on with a warning.
pub struct UploadPipeline {
    selector: Arc<StyleSelector>,
    transformer: Option<Arc<dyn StyleTransformPort>>,
    fetcher: Arc<dyn ImageFetchPort>,
    transform_timeout: Duration,
}

impl UploadPipeline {
    pub fn new(
        selector: Arc<StyleSelector>,
        transformer: Option<Arc<dyn StyleTransformPort>>,
        fetcher: Arc<dyn ImageFetchPort>,
        transform_timeout: Duration,
    ) -> Self {
        Self {
            selector,
            transformer,
            fetcher,
            transform_timeout,
        }
    }

    pub fn selector(&self) -> &Arc<StyleSelector> {
        &self.selector
    }

    #[instrument(skip(self, request), fields(category = %request.category))]
    pub async fn prepare(&self, request: AddItemRequest) -> Result<PreparedUpload> {
        let mut tracker = UploadTracker::new(Uuid::new_v4());
        let mut notices = Vec::new();

        let captured = capture(&request.image, request.file_name.as_deref())?;
        let style = self.select_style(&tracker, &request).await?;
        tracker.advance(UploadState::StyleSelected);

        let captured = if style.needs_transform() {
            self.apply_style(&mut tracker, style, captured, &mut notices).await
        } else {
            captured
        };

        let image = self.materialize(captured, &mut notices).await;

        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_item_name(request.category, request.file_name.as_deref()));

        let mut draft = ItemDraft::new(request.category, name, image, request.file_name.clone());
        draft.tags.extend(
            request
                .tags
                .iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .map(str::to_string),
        );

        info!("Upload {} ready with style {}", tracker.upload_id, style);
        Ok(PreparedUpload {
            draft,
            style,
            notices,
            tracker,
        })
    }

    async fn select_style(&self, tracker: &UploadTracker, request: &AddItemRequest) -> Result<StyleChoice> {
        if let Some(style) = request.style {
            return Ok(style);
        }
        if self.transformer.is_none() {
            debug!("Style transform disabled, keeping original for upload {}", tracker.upload_id);
            return Ok(StyleChoice::Original);
        }

        let receiver = self
            .selector
            .request(tracker.upload_id, request.category, request.file_name.clone());

        receiver.await.map_err(|_| {
            info!("Upload {} dropped without a style choice", tracker.upload_id);
            DomainError::cancelled("Upload", "Upload cancelled or superseded before a style was chosen")
                .with_id(tracker.upload_id.to_string())
        })
    }

    async fn apply_style(
        &self,
        tracker: &mut UploadTracker,
        style: StyleChoice,
        captured: CapturedImage,
        notices: &mut Vec<Notice>,
    ) -> CapturedImage {
        tracker.advance(UploadState::Transforming);

        let transformer = match &self.transformer {
            Some(transformer) => transformer,
            None => {
                warn!("Style {} requested but the transform service is disabled", style);
                tracker.advance(UploadState::TransformFailed);
                notices.push(Notice::warning(TRANSFORM_FAILED_NOTICE));
                return captured;
            }
        };

        let source = match captured {
            CapturedImage::Blob(blob) => blob,
            CapturedImage::Url(url) => match self.fetcher.fetch(&url).await {
                Ok(blob) => blob,
                Err(e) => {
                    warn!("Could not download {} for transformation: {}", url, e);
                    tracker.advance(UploadState::TransformFailed);
                    notices.push(Notice::warning(TRANSFORM_FAILED_NOTICE));
                    return CapturedImage::Url(url);
                }
            },
        };

        match tokio::time::timeout(self.transform_timeout, transformer.transform(style, source.clone())).await {
            Ok(Ok(transformed)) if !transformed.data.is_empty() => {
                tracker.advance(UploadState::Transformed);
                CapturedImage::Blob(transformed)
            }
            Ok(Ok(_)) => {
                warn!("Transform service returned an empty image for upload {}", tracker.upload_id);
                tracker.advance(UploadState::TransformFailed);
                notices.push(Notice::warning(TRANSFORM_FAILED_NOTICE));
                CapturedImage::Blob(source)
            }
            Ok(Err(e)) => {
                warn!("Transform failed for upload {}: {}", tracker.upload_id, e);
                tracker.advance(UploadState::TransformFailed);
                notices.push(Notice::warning(TRANSFORM_FAILED_NOTICE));
                CapturedImage::Blob(source)
            }
            Err(_) => {
                warn!(
                    "Transform timed out after {:?} for upload {}",
                    self.transform_timeout, tracker.upload_id
                );
                tracker.advance(UploadState::TransformFailed);
                notices.push(Notice::warning(TRANSFORM_FAILED_NOTICE));
                CapturedImage::Blob(source)
            }
        }
    }

    /// Embebe la imagen si es posible; una URL que no se puede descargar se guarda como enlace
    async fn materialize(&self, captured: CapturedImage, notices: &mut Vec<Notice>) -> ImageLocator {
        match captured {
            CapturedImage::Blob(blob) => ImageLocator::inline(blob.mime, blob.data),
            CapturedImage::Url(url) => match self.fetcher.fetch(&url).await {
                Ok(blob) => ImageLocator::inline(blob.mime, blob.data),
                Err(e) => {
                    warn!("Keeping {} as an image link: {}", url, e);
                    notices.push(Notice::warning(IMAGE_LINK_NOTICE));
                    ImageLocator::Url(url)
                }
            },
        }
    }
}

fn capture(payload: &ImagePayload, file_name: Option<&str>) -> Result<CapturedImage> {
    match payload {
        ImagePayload::Binary { data, mime } => {
            if data.is_empty() {
                return Err(DomainError::validation_error("Image", "No image provided"));
            }
            let mime = image_codec::infer_mime(mime.as_deref(), data, file_name);
            Ok(CapturedImage::Blob(ImageBlob::new(mime, data.clone())))
        }
        ImagePayload::DataUrl(data_url) => {
            let (declared, data) = image_codec::parse_data_url(data_url)?;
            if data.is_empty() {
                return Err(DomainError::validation_error("Image", "No image provided"));
            }
            let mime = image_codec::infer_mime(Some(&declared), &data, file_name);
            Ok(CapturedImage::Blob(ImageBlob::new(mime, data)))
        }
        ImagePayload::Url(url) => {
            let url = url.trim();
            if url.is_empty() {
                return Err(DomainError::validation_error("Image", "No image provided"));
            }
            Ok(CapturedImage::Url(url.to_string()))
        }
    }
}
