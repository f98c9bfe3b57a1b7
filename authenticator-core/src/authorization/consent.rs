use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};

use crate::crypto::EnvelopeContent;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct ConsentAccount {
    pub name: String,

    #[serde(default)]
    pub account_number: Option<String>,

    #[serde(default)]
    pub sort_code: Option<String>,

    #[serde(default)]
    pub iban: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(crate = "self::serde")]
pub struct ConsentSharedData {
    #[serde(default)]
    pub balance: bool,

    #[serde(default)]
    pub transactions: bool,
}

/// `ConsentItem` is access a third party provider holds on the user accounts. It is
/// delivered in the same envelopes as authorizations.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct ConsentItem {
    pub id: String,
    pub connection_id: String,
    pub tpp_name: String,
    pub consent_type: String,

    #[serde(default)]
    pub accounts: Vec<ConsentAccount>,

    #[serde(default)]
    pub shared_data: Option<ConsentSharedData>,

    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl EnvelopeContent for ConsentItem {
    fn content_id(&self) -> &str {
        &self.id
    }

    fn content_connection_id(&self) -> &str {
        &self.connection_id
    }
}
