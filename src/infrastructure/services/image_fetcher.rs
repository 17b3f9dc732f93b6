use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::debug;

use crate::application::ports::transform_ports::ImageFetchPort;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::upload::ImageBlob;
use crate::domain::services::image_codec;

/// Descarga imágenes referenciadas por URL para embeberlas o subirlas
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetchPort for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<ImageBlob> {
        if url.starts_with("data:") {
            let (mime, data) = image_codec::parse_data_url(url)?;
            return Ok(ImageBlob::new(mime, data));
        }

        let response = self.client.get(url).send().await?.error_for_status()?;
        let declared = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let data = response.bytes().await?;

        if data.is_empty() {
            return Err(DomainError::validation_error("Image", format!("Empty image at {}", url)));
        }

        let mime = image_codec::infer_mime(declared.as_deref(), &data, Some(url));
        debug!("Fetched {} bytes of {} from {}", data.len(), mime, url);
        Ok(ImageBlob::new(mime, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    #[tokio::test]
    async fn test_fetch_infers_mime_from_bytes() {
        let router = Router::new()
            .route("/hat", get(|| async { vec![0xFFu8, 0xD8, 0xFF, 0xE0] }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let fetcher = HttpImageFetcher::new(Client::new());
        let blob = fetcher.fetch(&format!("http://{}/hat", addr)).await.unwrap();
        assert_eq!(blob.mime, "image/jpeg");

        let err = fetcher.fetch(&format!("http://{}/missing", addr)).await.unwrap_err();
        assert_eq!(err.kind, crate::common::errors::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_data_urls_need_no_network() {
        let fetcher = HttpImageFetcher::new(Client::new());
        let blob = fetcher.fetch("data:image/gif;base64,R0lGODlh").await.unwrap();
        assert_eq!(blob.mime, "image/gif");
    }
}
