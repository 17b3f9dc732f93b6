use crate::common::errors::Result;
use crate::domain::entities::session::Session;

/// Decide si la credencial de una sesión es utilizable antes de activar el modo remoto
pub trait CredentialValidator: Send + Sync + 'static {
    fn validate(&self, session: &Session) -> Result<()>;
}
