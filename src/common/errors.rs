use std::fmt::{Display, Formatter, Result as FmtResult};
use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Tipos de errores comunes en toda la aplicación
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entidad no encontrada
    NotFound,
    /// Entrada inválida o validación fallida
    InvalidInput,
    /// Credencial rechazada por el backend remoto (401/403)
    AccessDenied,
    /// Tiempo de espera agotado
    Timeout,
    /// Servicio remoto inalcanzable o con error transitorio
    Unavailable,
    /// Operación reemplazada o cancelada antes de completarse
    Cancelled,
    /// Error interno del sistema
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ErrorKind::NotFound => write!(f, "Not Found"),
            ErrorKind::InvalidInput => write!(f, "Invalid Input"),
            ErrorKind::AccessDenied => write!(f, "Access Denied"),
            ErrorKind::Timeout => write!(f, "Timeout"),
            ErrorKind::Unavailable => write!(f, "Unavailable"),
            ErrorKind::Cancelled => write!(f, "Cancelled"),
            ErrorKind::InternalError => write!(f, "Internal Error"),
        }
    }
}

/// Error base de dominio que proporciona contexto detallado
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct DomainError {
    /// Tipo de error
    pub kind: ErrorKind,
    /// Tipo de entidad afectada (ej: "Item", "Trash")
    pub entity_type: &'static str,
    /// Identificador de la entidad si está disponible
    pub entity_id: Option<String>,
    /// Mensaje descriptivo del error
    pub message: String,
    /// Error fuente (opcional)
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

pub type Result<T> = std::result::Result<T, DomainError>;

impl DomainError {
    /// Crea un nuevo error de dominio
    pub fn new<S: Into<String>>(
        kind: ErrorKind,
        entity_type: &'static str,
        message: S,
    ) -> Self {
        Self {
            kind,
            entity_type,
            entity_id: None,
            message: message.into(),
            source: None,
        }
    }

    /// Crea un error de entidad no encontrada
    pub fn not_found<S: Into<String>>(entity_type: &'static str, entity_id: S) -> Self {
        let id = entity_id.into();
        Self {
            kind: ErrorKind::NotFound,
            entity_type,
            entity_id: Some(id.clone()),
            message: format!("{} not found: {}", entity_type, id),
            source: None,
        }
    }

    /// Crea un error de tiempo agotado
    pub fn timeout<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self::new(ErrorKind::Timeout, entity_type, message)
    }

    /// Crea un error de servicio no disponible
    pub fn unavailable<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self::new(ErrorKind::Unavailable, entity_type, message)
    }

    /// Crea un error interno
    pub fn internal_error<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self::new(ErrorKind::InternalError, entity_type, message)
    }

    /// Crea un error de operación cancelada
    pub fn cancelled<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self::new(ErrorKind::Cancelled, entity_type, message)
    }

    /// Crea un error de acceso denegado
    pub fn access_denied<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self::new(ErrorKind::AccessDenied, entity_type, message)
    }

    /// Crea un error de validación
    pub fn validation_error<S: Into<String>>(entity_type: &'static str, message: S) -> Self {
        Self::new(ErrorKind::InvalidInput, entity_type, message)
    }

    /// Establece el ID de la entidad
    pub fn with_id<S: Into<String>>(mut self, entity_id: S) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Establece el error fuente
    pub fn with_source<E: StdError + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// 401/403 del backend: la sesión debe invalidarse, nunca reintentarse
    pub fn is_auth_failure(&self) -> bool {
        self.kind == ErrorKind::AccessDenied
    }

    /// Fallos de red recuperables con un fallback local
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout | ErrorKind::Unavailable)
    }
}

/// Convierte errores de librerías externas en [`DomainError`] con contexto del dominio.
///
/// The original error stays reachable through `source` and its text is appended to the message.
pub trait ErrorContext<T> {
    /// Error interno de `entity_type` con el mensaje de `context`
    fn context<C, F>(self, entity_type: &'static str, context: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T, E: StdError + Send + Sync + 'static> ErrorContext<T> for std::result::Result<T, E> {
    fn context<C, F>(self, entity_type: &'static str, context: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let message = format!("{}: {}", context().into(), e);
            DomainError::internal_error(entity_type, message).with_source(e)
        })
    }
}

/// Macro para convertir errores específicos a DomainError
#[macro_export]
macro_rules! impl_from_error {
    ($error_type:ty, $kind:expr, $entity_type:expr) => {
        impl From<$error_type> for DomainError {
            fn from(err: $error_type) -> Self {
                DomainError {
                    kind: $kind,
                    entity_type: $entity_type,
                    entity_id: None,
                    message: format!("{}", err),
                    source: Some(Box::new(err)),
                }
            }
        }
    };
}

impl_from_error!(std::io::Error, ErrorKind::InternalError, "IO");
impl_from_error!(serde_json::Error, ErrorKind::InternalError, "Serialization");
impl_from_error!(base64::DecodeError, ErrorKind::InvalidInput, "Image");

impl From<reqwest::Error> for DomainError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                401 | 403 => ErrorKind::AccessDenied,
                404 => ErrorKind::NotFound,
                400..=499 => ErrorKind::InvalidInput,
                _ => ErrorKind::Unavailable,
            }
        } else if err.is_decode() {
            ErrorKind::InternalError
        } else {
            // conexión rechazada, DNS, cuerpo truncado...
            ErrorKind::Unavailable
        };

        DomainError {
            kind,
            entity_type: "Http",
            entity_id: None,
            message: format!("{}", err),
            source: Some(Box::new(err)),
        }
    }
}

/// Error de la capa HTTP: estado + mensaje serializado como `{"error": ...}`
#[derive(Debug, Error)]
#[error("{status}: {message}")]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        let status = match err.kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::AccessDenied => StatusCode::UNAUTHORIZED,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Cancelled => StatusCode::CONFLICT,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {}", self.message);
        }
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(DomainError::access_denied("Item", "401").is_auth_failure());
        assert!(DomainError::timeout("Transform", "slow").is_transient());
        assert!(DomainError::unavailable("Item", "down").is_transient());
        assert!(!DomainError::not_found("Item", "1").is_transient());
        assert!(!DomainError::validation_error("Item", "bad").is_auth_failure());
    }

    #[test]
    fn test_context_keeps_source_and_detail() {
        let res: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        let err = res.context("Storage", || "Failed to write store").unwrap_err();

        assert_eq!(err.kind, ErrorKind::InternalError);
        assert_eq!(err.entity_type, "Storage");
        assert_eq!(err.message, "Failed to write store: disk full");
        assert!(err.source.is_some());
    }

    #[test]
    fn test_app_error_status_mapping() {
        assert_eq!(AppError::from(DomainError::not_found("Item", "1")).status, StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(DomainError::validation_error("Outfit", "empty")).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(DomainError::cancelled("Upload", "superseded")).status,
            StatusCode::CONFLICT
        );
    }
}
