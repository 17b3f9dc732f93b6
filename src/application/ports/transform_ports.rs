use async_trait::async_trait;

use crate::common::errors::Result;
use crate::domain::entities::upload::{ImageBlob, StyleChoice};

/// Puerto secundario hacia el servicio externo de transformación de estilo.
///
/// Best-effort: callers bound every call with a timeout and fall back to the original image.
#[cfg_attr(any(test, feature = "test_utils"), mockall::automock)]
#[async_trait]
pub trait StyleTransformPort: Send + Sync + 'static {
    /// Devuelve la imagen transformada al estilo pedido
    async fn transform(&self, style: StyleChoice, image: ImageBlob) -> Result<ImageBlob>;

    /// Comprueba si el servicio responde
    async fn is_available(&self) -> bool;
}

/// Puerto secundario para descargar imágenes referenciadas por URL
#[cfg_attr(any(test, feature = "test_utils"), mockall::automock)]
#[async_trait]
pub trait ImageFetchPort: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> Result<ImageBlob>;
}
