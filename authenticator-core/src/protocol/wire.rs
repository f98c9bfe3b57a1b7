//! Bodies exchanged with a provider. Every payload is wrapped in a `data` field, `v2`
//! bodies sent by the device also carry the `exp` claim covered by the JWS.
use rst_common::standard::serde::de::DeserializeOwned;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;

use crate::errors::ApiError;

use super::types::EncryptedValue;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Serialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct SignedEnvelope<T> {
    pub data: T,
    pub exp: i64,
}

#[derive(Serialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct CreateConnectionV1Data {
    pub provider_code: String,
    pub public_key: String,
    pub return_url: String,
    pub platform: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_query: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct CreateConnectionV2Data {
    pub provider_id: String,
    pub dh_public_key: String,
    pub encrypted_rsa_public_key: EncryptedValue,
    pub return_url: String,
    pub platform: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_query: Option<String>,
}

/// `DecisionV1Data` is sent in the clear, the request signature covers it
#[derive(Serialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct DecisionV1Data {
    pub confirm: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<String>,
}

/// `DecisionV2Payload` is encrypted under the shared secret before it is sent
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct DecisionV2Payload {
    pub confirm: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_authorization_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct PushTokenData {
    pub push_token: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct ActionV2Data {
    pub connection_id: String,
}

#[derive(Serialize, Debug, Clone, Default)]
#[serde(crate = "self::serde")]
pub struct EmptyData {}

/// `OutcomeData` is the loose shape of every acknowledgement a provider sends back
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(crate = "self::serde")]
pub struct OutcomeData {
    #[serde(default)]
    pub success: Option<bool>,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub authorization_id: Option<String>,

    #[serde(default)]
    pub connection_id: Option<String>,

    #[serde(default)]
    pub revoked_connection_id: Option<String>,

    #[serde(default)]
    pub consent_id: Option<String>,

    #[serde(default)]
    pub status: Option<String>,
}

impl OutcomeData {
    pub fn is_rejected(&self) -> bool {
        self.success == Some(false)
    }
}

pub fn to_body<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|err| ApiError::request(err.to_string()))
}

pub fn parse_data<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str::<DataEnvelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|err| ApiError::response(format!("unexpected response body: {}", err)))
}

/// `parse_outcome` reads an acknowledgement. Only an empty body stands for a plain
/// success, anything else must parse.
pub fn parse_outcome(body: &str) -> Result<OutcomeData, ApiError> {
    if body.trim().is_empty() {
        return Ok(OutcomeData::default());
    }

    parse_data(body)
}
