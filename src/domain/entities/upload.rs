use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::common::errors::DomainError;

/// Estilo elegido para una subida
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleChoice {
    Original,
    Cartoon,
}

impl StyleChoice {
    pub const ALL: [StyleChoice; 2] = [StyleChoice::Original, StyleChoice::Cartoon];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleChoice::Original => "original",
            StyleChoice::Cartoon => "cartoon",
        }
    }

    pub fn needs_transform(&self) -> bool {
        !matches!(self, StyleChoice::Original)
    }
}

impl Display for StyleChoice {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StyleChoice {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "original" => Ok(StyleChoice::Original),
            "cartoon" => Ok(StyleChoice::Cartoon),
            other => Err(DomainError::validation_error("Style", format!("Unknown style: {}", other))),
        }
    }
}

/// Raw image as captured from the user, in whichever shape it arrived
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// Bytes de un fichero, con el MIME declarado si lo hay
    Binary { data: Bytes, mime: Option<String> },
    /// `data:` URL ya codificada
    DataUrl(String),
    /// Referencia a una imagen alojada en otro sitio
    Url(String),
}

/// Imagen binaria con su MIME ya resuelto
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub mime: String,
    pub data: Bytes,
}

impl ImageBlob {
    pub fn new<S: Into<String>>(mime: S, data: impl Into<Bytes>) -> Self {
        Self {
            mime: mime.into(),
            data: data.into(),
        }
    }
}

/// Estados de la máquina de subida.
///
/// `captured → style-selected → (transforming → transformed | transform-failed) → persisted`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadState {
    Captured,
    StyleSelected,
    Transforming,
    Transformed,
    TransformFailed,
    Persisted,
}

impl UploadState {
    /// Transiciones permitidas; `TransformFailed` vuelve a la imagen capturada y sigue a `Persisted`
    pub fn can_transition_to(self, next: UploadState) -> bool {
        use UploadState::*;
        matches!(
            (self, next),
            (Captured, StyleSelected)
                | (StyleSelected, Transforming)
                | (StyleSelected, Persisted)
                | (Transforming, Transformed)
                | (Transforming, TransformFailed)
                | (Transformed, Persisted)
                | (TransformFailed, Persisted)
        )
    }
}
