//! Codificación de payloads de imagen: data URLs, detección de MIME.

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;

use crate::common::errors::DomainError;

/// MIME usado cuando nada permite inferirlo
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Decodifica `data:<mime>[;base64],<payload>` en (mime, bytes)
pub fn parse_data_url(data_url: &str) -> Result<(String, Bytes), DomainError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| DomainError::validation_error("Image", "Not a data URL"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| DomainError::validation_error("Image", "Data URL without payload separator"))?;

    let mut parts = header.split(';');
    let mime = parts
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_IMAGE_MIME)
        .to_string();
    let is_base64 = parts.any(|p| p.trim().eq_ignore_ascii_case("base64"));

    let data = if is_base64 {
        STANDARD.decode(payload.trim())?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    Ok((mime, Bytes::from(data)))
}

pub fn to_data_url(mime: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(data))
}

/// Reconoce los formatos de imagen habituales por sus bytes mágicos
pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Infers a MIME type: declared value, magic bytes, file extension, then the default
pub fn infer_mime(declared: Option<&str>, data: &[u8], file_name: Option<&str>) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|m| m.starts_with("image/")) {
        return declared.to_string();
    }
    if let Some(sniffed) = sniff_mime(data) {
        return sniffed.to_string();
    }
    if let Some(guess) = file_name.and_then(|name| mime_guess::from_path(name).first()) {
        if guess.type_() == mime_guess::mime::IMAGE {
            return guess.essence_str().to_string();
        }
    }
    DEFAULT_IMAGE_MIME.to_string()
}

/// Extensión de fichero razonable para un MIME de imagen
pub fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "png",
    }
}
