use std::collections::BTreeMap;

use http::Method;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use crate::authorization::types::AuthorizationStatus;
use crate::authorization::AuthorizationItem;
use crate::connection::types::ApiVersion;
use crate::crypto::CryptoError;
use crate::errors::ApiError;
use crate::keystore::types::KeyStoreError;

pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_ACCEPT_LANGUAGE: &str = "Accept-Language";
pub const HEADER_USER_AGENT: &str = "User-Agent";
pub const HEADER_ACCESS_TOKEN: &str = "Access-Token";
pub const HEADER_EXPIRES_AT: &str = "Expires-at";
pub const HEADER_SIGNATURE: &str = "Signature";
pub const HEADER_JWS_SIGNATURE: &str = "x-jws-signature";
pub const HEADER_GEO_LOCATION: &str = "GEO-Location";
pub const HEADER_AUTHORIZATION_TYPE: &str = "Authorization-Type";

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// `TransportError` is what an HTTP collaborator may report instead of a response
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("request timeout")]
    Timeout,

    #[error("host unreachable: {0}")]
    Unreachable(String),

    #[error("tls error: {0}")]
    Tls(String),

    #[error("http error: {status}")]
    Http { status: u16, body: String },
}

impl From<TransportError> for ApiError {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Timeout => ApiError::host_unreachable("request timeout"),
            TransportError::Unreachable(msg) => ApiError::host_unreachable(msg),
            TransportError::Tls(msg) => ApiError::ssl_handshake(msg),
            TransportError::Http { status, body } => ApiError::from_http_failure(status, &body),
        }
    }
}

impl From<CryptoError> for ApiError {
    fn from(value: CryptoError) -> Self {
        ApiError::request(value.to_string())
    }
}

impl From<KeyStoreError> for ApiError {
    fn from(value: KeyStoreError) -> Self {
        ApiError::request(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// `TransportBuilder` is the HTTP boundary. Implementations only move bytes, every
/// protocol rule stays in the client.
#[async_trait]
pub trait TransportBuilder: Send + Sync + 'static {
    async fn submit(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// `ProviderConfiguration` is served behind the `configuration` url of a connect link
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct ProviderConfiguration {
    pub connect_url: String,
    pub code: String,
    pub name: String,
    pub version: String,

    #[serde(default)]
    pub logo_url: Option<String>,

    #[serde(default)]
    pub support_email: Option<String>,

    #[serde(default)]
    pub provider_id: Option<String>,

    /// X25519 public key of the provider, only sent by `v2` providers
    #[serde(default)]
    pub public_key: Option<String>,

    #[serde(default)]
    pub geolocation_required: bool,

    #[serde(default)]
    pub consent_management: bool,
}

impl ProviderConfiguration {
    pub fn api_version(&self) -> Option<ApiVersion> {
        ApiVersion::from_value(&self.version)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct EncryptedValue {
    pub iv: String,
    pub data: String,
}

/// `PublicKeyMaterial` is how the device introduces its RSA key to the provider
#[derive(Debug, Clone, PartialEq)]
pub enum PublicKeyMaterial {
    V1 {
        rsa_public_key_pem: String,
    },
    V2 {
        dh_public_key_pem: String,
        encrypted_rsa_public_key: EncryptedValue,
    },
}

#[derive(Debug, Clone)]
pub struct CreateConnectionRequest {
    pub connection: crate::connection::Connection,
    pub public_key_material: PublicKeyMaterial,
    pub return_url: String,
    pub platform: String,
    pub push_token: Option<String>,
    pub connect_query: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct ConnectionCreated {
    pub id: String,
    pub connect_url: String,

    #[serde(default)]
    pub access_token: Option<String>,
}

/// `ConnectionFailure` is one failed sub request of a multi connection operation
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionFailure {
    pub connection_id: String,
    pub error: ApiError,
}

/// `FetchResult` carries what succeeded next to what failed, one entry per failed
/// connection
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult<T> {
    pub items: Vec<T>,
    pub errors: Vec<ConnectionFailure>,
}

impl<T> Default for FetchResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RevokeResult {
    pub revoked_ids: Vec<String>,
    pub errors: Vec<ConnectionFailure>,
}

/// `AuthorizationSnapshot` is the state of a single authorization. `item` is missing when
/// the provider only reports a final status
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationSnapshot {
    pub id: String,
    pub connection_id: String,
    pub status: AuthorizationStatus,
    pub item: Option<AuthorizationItem>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthorizationDecision {
    pub authorization_id: String,
    pub authorization_code: Option<String>,
    pub geolocation: Option<String>,
    pub authorization_type: Option<String>,
}

impl AuthorizationDecision {
    pub fn new(authorization_id: impl Into<String>) -> Self {
        Self {
            authorization_id: authorization_id.into(),
            ..Default::default()
        }
    }

    /// `for_item` refuses an item that expired or already reached a final status
    pub fn for_item(item: &AuthorizationItem) -> Result<Self, ApiError> {
        if !item.is_actionable() {
            return Err(ApiError::request(format!(
                "authorization {} is no longer actionable",
                item.id
            )));
        }

        Ok(Self {
            authorization_id: item.id.clone(),
            authorization_code: item.authorization_code.clone(),
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmResult {
    pub authorization_id: String,
    pub connection_id: String,
    pub status: Option<AuthorizationStatus>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    pub connection_id: String,
    pub authorization_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PushTokenUpdate {
    Unchanged,
    Updated { guid: String, push_token: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsentRevoked {
    pub consent_id: String,
    pub connection_id: String,
}
