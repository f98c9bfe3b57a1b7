use rst_common::standard::chrono::serde::ts_seconds;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::uuid::Uuid;

use super::types::{ApiVersion, ConnectionStatus};

/// `Connection` is the persisted record of a provider link
///
/// `guid` is generated locally and is the keystore alias of the device keys, `id` is the
/// identifier the provider assigned once the connection was accepted
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct Connection {
    pub guid: String,
    pub id: String,
    pub name: String,
    pub code: String,
    pub connect_url: String,
    pub access_token: String,
    pub status: ConnectionStatus,
    pub api_version: ApiVersion,
    pub provider_rsa_public_key_pem: String,

    #[serde(default)]
    pub provider_dh_public_key_pem: Option<String>,

    #[serde(default)]
    pub provider_id: Option<String>,

    #[serde(default)]
    pub push_token: Option<String>,

    #[serde(default)]
    pub logo_url: Option<String>,

    #[serde(default)]
    pub support_email: Option<String>,

    #[serde(default)]
    pub geolocation_required: bool,

    #[serde(default)]
    pub consent_management_supported: bool,

    #[serde(with = "ts_seconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(
        name: String,
        code: String,
        connect_url: String,
        api_version: ApiVersion,
        provider_rsa_public_key_pem: String,
    ) -> Self {
        Self {
            guid: Uuid::new_v4().to_string(),
            id: String::new(),
            name,
            code,
            connect_url,
            access_token: String::new(),
            status: ConnectionStatus::Inactive,
            api_version,
            provider_rsa_public_key_pem,
            provider_dh_public_key_pem: None,
            provider_id: None,
            push_token: None,
            logo_url: None,
            support_email: None,
            geolocation_required: false,
            consent_management_supported: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// `activate` stores what the provider returned when it accepted the connection
    pub fn activate(&mut self, id: String, access_token: String) {
        self.id = id;
        self.access_token = access_token;
        self.status = ConnectionStatus::Active;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.status = ConnectionStatus::Inactive;
        self.updated_at = Utc::now();
    }

    pub fn is_active(&self) -> bool {
        self.status == ConnectionStatus::Active
    }

    pub fn is_v2(&self) -> bool {
        self.api_version == ApiVersion::V2
    }
}
