use std::collections::HashSet;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::application::ports::session_ports::CredentialValidator;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::session::Session;

#[derive(Debug, Deserialize)]
struct ClaimUser {
    id: Option<String>,
}

/// Claims que nos interesan del token emitido por el backend
#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: Option<String>,
    user: Option<ClaimUser>,
}

impl SessionClaims {
    fn subject(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|user| user.id.as_deref())
            .or(self.sub.as_deref())
    }
}

/// Comprueba la credencial localmente antes de activar el modo remoto.
///
/// The signature belongs to the backend and cannot be checked here; only expiry and the
/// subject are. Tokens that are not JWTs are passed through as opaque credentials.
pub struct JwtCredentialValidator {
    leeway_secs: u64,
}

impl JwtCredentialValidator {
    pub fn new(leeway_secs: u64) -> Self {
        Self { leeway_secs }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = self.leeway_secs;
        validation
    }
}

impl Default for JwtCredentialValidator {
    fn default() -> Self {
        Self::new(30)
    }
}

impl CredentialValidator for JwtCredentialValidator {
    fn validate(&self, session: &Session) -> Result<()> {
        let token = session.token().trim();
        if token.is_empty() {
            return Err(DomainError::access_denied("Session", "Missing credential"));
        }

        let claims = match decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &self.validation()) {
            Ok(data) => data.claims,
            Err(e) => {
                return match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        Err(DomainError::access_denied("Session", "Token expired"))
                    }
                    _ => {
                        tracing::debug!("Credential is not a readable JWT ({}), treating it as opaque", e);
                        Ok(())
                    }
                };
            }
        };

        match claims.subject() {
            Some(subject) if subject != session.owner_id().as_str() => Err(DomainError::access_denied(
                "Session",
                format!("Token belongs to {}, not {}", subject, session.owner_id()),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    use crate::common::errors::ErrorKind;
    use crate::domain::entities::item::OwnerId;

    fn token(claims: serde_json::Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"backend-secret")).unwrap()
    }

    fn session(owner: &str, token: String) -> Session {
        Session::new(OwnerId::new(owner), token)
    }

    #[test]
    fn test_valid_token_for_owner() {
        let validator = JwtCredentialValidator::default();
        let exp = Utc::now().timestamp() + 3600;
        let token = token(json!({ "user": { "id": "u-1" }, "exp": exp }));
        assert!(validator.validate(&session("u-1", token)).is_ok());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let validator = JwtCredentialValidator::new(0);
        let exp = Utc::now().timestamp() - 3600;
        let token = token(json!({ "sub": "u-1", "exp": exp }));
        let err = validator.validate(&session("u-1", token)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AccessDenied);
    }

    #[test]
    fn test_token_of_another_owner_is_rejected() {
        let validator = JwtCredentialValidator::default();
        let token = token(json!({ "sub": "someone-else" }));
        assert!(validator.validate(&session("u-1", token)).unwrap_err().is_auth_failure());
    }

    #[test]
    fn test_opaque_and_empty_tokens() {
        let validator = JwtCredentialValidator::default();
        assert!(validator.validate(&session("u-1", "opaque-session-token".to_string())).is_ok());
        assert!(validator.validate(&session("u-1", "  ".to_string())).is_err());
    }
}
