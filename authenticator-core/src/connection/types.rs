use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use super::Connection;

#[derive(Debug, PartialEq, Error, Clone)]
pub enum ConnectionError {
    #[error("unknown error: {0}")]
    UnknownError(String),

    #[error("unable to save connection: {0}")]
    SaveConnectionError(String),

    #[error("unable to remove connection: {0}")]
    RemoveConnectionError(String),

    #[error("connection not found: {0}")]
    NotFound(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Active,
    Inactive,
}

/// `ApiVersion` selects the wire dialect of a provider. It travels as `"1"` or `"2"`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(crate = "self::serde")]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "1")]
    V1,

    #[serde(rename = "2")]
    V2,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "1",
            ApiVersion::V2 => "2",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "1" => Some(ApiVersion::V1),
            "2" => Some(ApiVersion::V2),
            _ => None,
        }
    }
}

/// `ConnectionStoreBuilder` is the persistence boundary for connection records. The engine
/// reads from it and reports what changed, writing back is up to the caller.
#[async_trait]
pub trait ConnectionStoreBuilder: Clone + Sync + Send {
    async fn list_active(&self) -> Result<Vec<Connection>, ConnectionError>;
    async fn get_by_guid(&self, guid: String) -> Result<Option<Connection>, ConnectionError>;
    async fn save(&self, connection: &Connection) -> Result<(), ConnectionError>;
    async fn update_status(
        &self,
        guid: String,
        status: ConnectionStatus,
    ) -> Result<(), ConnectionError>;
    async fn update_push_token(
        &self,
        guid: String,
        push_token: String,
    ) -> Result<(), ConnectionError>;
    async fn remove(&self, guid: String) -> Result<(), ConnectionError>;
}
