use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::application::ports::transform_ports::StyleTransformPort;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::upload::{ImageBlob, StyleChoice};
use crate::domain::services::image_codec;

/// Cliente HTTP del servicio externo de transformación de estilo.
///
/// `POST <service_url>` with a multipart `image` field; the service answers with the
/// transformed image bytes (or a JSON body carrying a data URL).
pub struct HttpStyleTransformClient {
    client: Client,
    service_url: String,
    health_url: String,
    health_timeout: Duration,
}

const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

impl HttpStyleTransformClient {
    pub fn new(client: Client, service_url: impl Into<String>, health_url: impl Into<String>) -> Self {
        Self {
            client,
            service_url: service_url.into(),
            health_url: health_url.into(),
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }

    /// Límite del sondeo de salud, independiente del de la transformación
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    fn image_from_json(body: &Value) -> Option<ImageBlob> {
        ["image", "dataUrl", "data"]
            .iter()
            .filter_map(|field| body.get(*field).and_then(Value::as_str))
            .find_map(|raw| image_codec::parse_data_url(raw).ok())
            .map(|(mime, data)| ImageBlob::new(mime, data))
    }
}

#[async_trait]
impl StyleTransformPort for HttpStyleTransformClient {
    async fn transform(&self, style: StyleChoice, image: ImageBlob) -> Result<ImageBlob> {
        info!("Requesting {} transform ({} bytes)", style, image.data.len());

        let file_name = format!("image.{}", image_codec::extension_for(&image.mime));
        let part = Part::bytes(image.data.to_vec())
            .file_name(file_name)
            .mime_str(&image.mime)?;
        let form = Form::new().part("image", part).text("style", style.as_str().to_string());

        let response = self.client.post(&self.service_url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("msg").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            return Err(DomainError::unavailable(
                "Transform",
                format!("Transform service error {}: {}", status, detail),
            ));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

        let transformed = match content_type.as_deref() {
            Some(mime) if mime.contains("json") => {
                let body: Value = response.json().await?;
                Self::image_from_json(&body).ok_or_else(|| {
                    DomainError::unavailable("Transform", "Transform service returned no image")
                })?
            }
            declared => {
                let data = response.bytes().await?;
                let mime = image_codec::infer_mime(declared, &data, None);
                ImageBlob::new(mime, data)
            }
        };

        debug!("Transform returned {} bytes of {}", transformed.data.len(), transformed.mime);
        Ok(transformed)
    }

    async fn is_available(&self) -> bool {
        match self
            .client
            .get(&self.health_url)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Transform service health check failed: {}", e);
                false
            }
        }
    }
}
