use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};

use crate::crypto::EnvelopeContent;

use super::types::AuthorizationStatus;

/// `AuthorizationData` is the decrypted content of an authorization envelope
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct AuthorizationData {
    pub id: String,
    pub connection_id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,

    #[serde(default)]
    pub authorization_code: Option<String>,
}

impl EnvelopeContent for AuthorizationData {
    fn content_id(&self) -> &str {
        &self.id
    }

    fn content_connection_id(&self) -> &str {
        &self.connection_id
    }
}

/// `AuthorizationItem` is what callers see. `expires_at` is authoritative, an item past it
/// is never submitted again.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct AuthorizationItem {
    pub id: String,
    pub connection_id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub authorization_code: Option<String>,
    pub status: AuthorizationStatus,
}

impl AuthorizationItem {
    pub fn from_data(data: AuthorizationData, status: AuthorizationStatus) -> Self {
        Self {
            id: data.id,
            connection_id: data.connection_id,
            title: data.title,
            description: data.description,
            created_at: data.created_at,
            expires_at: data.expires_at,
            authorization_code: data.authorization_code,
            status,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// `is_actionable` tells whether a confirm or deny may still be sent, see
    /// `AuthorizationDecision::for_item`
    pub fn is_actionable(&self) -> bool {
        !self.is_expired() && !self.status.is_terminal()
    }
}
