use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::item::OwnerId;

/// Sesión autenticada entregada por el proveedor de autenticación
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub owner_id: OwnerId,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(owner_id: OwnerId, token: String) -> Self {
        Self {
            owner_id,
            token,
            created_at: Utc::now(),
        }
    }

    // Getters
    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Estado observable de la sesión
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    Anonymous,
    Authenticated { owner_id: OwnerId },
    /// The remote store rejected the credential; the manager fell back to local mode
    Invalidated { owner_id: OwnerId, reason: String },
}

impl SessionStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated { .. })
    }
}
