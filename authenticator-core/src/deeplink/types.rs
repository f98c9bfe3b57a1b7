use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use crate::connection::types::ApiVersion;
use crate::connection::Connection;
use crate::errors::ApiError;

pub const PARAM_CONFIGURATION: &str = "configuration";
pub const PARAM_CONNECT_QUERY: &str = "connect_query";
pub const PARAM_ACTION_UUID: &str = "action_uuid";
pub const PARAM_ACTION_ID: &str = "action_id";
pub const PARAM_CONNECT_URL: &str = "connect_url";
pub const PARAM_RETURN_TO: &str = "return_to";
pub const PARAM_PROVIDER_ID: &str = "provider_id";
pub const PARAM_API_VERSION: &str = "api_version";

#[derive(Debug, PartialEq, Error, Clone)]
pub enum DeeplinkError {
    #[error("malformed link: {0}")]
    MalformedLink(String),

    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("insecure configuration url: {0}")]
    InsecureConfiguration(String),

    #[error("unsupported api version: {0}")]
    UnsupportedVersion(String),
}

impl From<DeeplinkError> for ApiError {
    fn from(value: DeeplinkError) -> Self {
        ApiError::invalid_deeplink(value.to_string())
    }
}

/// `ConnectAppLinkData` starts a new connection. `configuration_url` is always `https` and
/// never points to a loopback host
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct ConnectAppLinkData {
    pub configuration_url: String,
    pub connect_query: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct ActionAppLinkData {
    pub action_id: String,
    pub api_version: ApiVersion,
    pub connect_url: Option<String>,
    pub provider_id: Option<String>,
    pub return_to: Option<String>,
}

impl ActionAppLinkData {
    /// `matches` tells whether `connection` may run this action. A `v1` link is matched
    /// by connect url, a `v2` link by provider id.
    pub fn matches(&self, connection: &Connection) -> bool {
        if connection.api_version != self.api_version || !connection.is_active() {
            return false;
        }

        match self.api_version {
            ApiVersion::V1 => self
                .connect_url
                .as_deref()
                .map(|url| same_url(url, &connection.connect_url))
                .unwrap_or(false),
            ApiVersion::V2 => match (&self.provider_id, &connection.provider_id) {
                (Some(expected), Some(actual)) => expected == actual,
                _ => false,
            },
        }
    }

    pub fn candidates<'a>(&self, connections: &'a [Connection]) -> Vec<&'a Connection> {
        connections
            .iter()
            .filter(|connection| self.matches(connection))
            .collect()
    }
}

fn same_url(left: &str, right: &str) -> bool {
    left.trim_end_matches('/') == right.trim_end_matches('/')
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppLink {
    Connect(ConnectAppLinkData),
    Action(ActionAppLinkData),
}
