use rst_common::standard::serde::{self, Deserialize, Serialize};

/// `AuthorizationStatus` follows an authorization on the provider side. Only `pending` and
/// `processing` may still change.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    #[default]
    Pending,
    Processing,
    ConfirmProcessed,
    DenyProcessed,
    Confirmed,
    Denied,
    Error,
    TimeOut,
    Unavailable,
    Closed,
}

impl AuthorizationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            AuthorizationStatus::Pending | AuthorizationStatus::Processing
        )
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(AuthorizationStatus::Pending),
            "processing" => Some(AuthorizationStatus::Processing),
            "confirm_processed" => Some(AuthorizationStatus::ConfirmProcessed),
            "deny_processed" => Some(AuthorizationStatus::DenyProcessed),
            "confirmed" => Some(AuthorizationStatus::Confirmed),
            "denied" => Some(AuthorizationStatus::Denied),
            "error" => Some(AuthorizationStatus::Error),
            "time_out" => Some(AuthorizationStatus::TimeOut),
            "unavailable" => Some(AuthorizationStatus::Unavailable),
            "closed" => Some(AuthorizationStatus::Closed),
            _ => None,
        }
    }
}
