//! `errors` defines the closed error taxonomy shared by every protocol operation.
//!
//! An [`ApiError`] is meant for branching, not for display: callers decide their policy
//! (retry, surface, invalidate the connection) from [`ErrorClass`] alone.
use std::fmt;

use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;
use rst_common::with_errors::thiserror::{self, Error};

const CLASS_AUTHENTICATION: &str = "AuthenticationError";
const CLASS_API_RESPONSE: &str = "ApiResponseError";
const CLASS_API_REQUEST: &str = "ApiRequestError";
const CLASS_HOST_UNREACHABLE: &str = "HostUnreachable";
const CLASS_SSL_HANDSHAKE: &str = "SSLHandshakeException";
const CLASS_CONNECTION_NOT_FOUND: &str = "ConnectionNotFound";
const CLASS_AUTHORIZATION_NOT_FOUND: &str = "AuthorizationNotFound";
const CLASS_INVALID_DEEPLINK: &str = "InvalidDeeplink";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub enum ErrorClass {
    AuthenticationError,
    ApiResponseError,
    ApiRequestError,
    HostUnreachable,
    #[serde(rename = "SSLHandshakeException")]
    SslHandshakeException,
    ConnectionNotFound,
    AuthorizationNotFound,
    InvalidDeeplink,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::AuthenticationError => CLASS_AUTHENTICATION,
            ErrorClass::ApiResponseError => CLASS_API_RESPONSE,
            ErrorClass::ApiRequestError => CLASS_API_REQUEST,
            ErrorClass::HostUnreachable => CLASS_HOST_UNREACHABLE,
            ErrorClass::SslHandshakeException => CLASS_SSL_HANDSHAKE,
            ErrorClass::ConnectionNotFound => CLASS_CONNECTION_NOT_FOUND,
            ErrorClass::AuthorizationNotFound => CLASS_AUTHORIZATION_NOT_FOUND,
            ErrorClass::InvalidDeeplink => CLASS_INVALID_DEEPLINK,
        }
    }

    /// `from_class_name` maps the service's `error_class` value. Unknown names are kept
    /// inside the taxonomy as [`ErrorClass::ApiResponseError`]
    pub fn from_class_name(name: &str) -> Self {
        match name {
            CLASS_AUTHENTICATION => ErrorClass::AuthenticationError,
            CLASS_API_REQUEST => ErrorClass::ApiRequestError,
            CLASS_HOST_UNREACHABLE => ErrorClass::HostUnreachable,
            CLASS_SSL_HANDSHAKE => ErrorClass::SslHandshakeException,
            CLASS_CONNECTION_NOT_FOUND => ErrorClass::ConnectionNotFound,
            CLASS_AUTHORIZATION_NOT_FOUND => ErrorClass::AuthorizationNotFound,
            CLASS_INVALID_DEEPLINK => ErrorClass::InvalidDeeplink,
            _ => ErrorClass::ApiResponseError,
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `ApiError` is the single failure type delivered by protocol operations
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[error("{error_class}: {error_message}")]
pub struct ApiError {
    pub error_class: ErrorClass,
    pub error_message: String,
    pub access_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(crate = "self::serde")]
struct ErrorBody {
    error_class: Option<String>,
    error_message: Option<String>,
    access_token: Option<String>,
}

impl ApiError {
    pub fn new(error_class: ErrorClass, error_message: impl Into<String>) -> Self {
        Self {
            error_class,
            error_message: error_message.into(),
            access_token: None,
        }
    }

    pub fn request(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::ApiRequestError, message)
    }

    pub fn response(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::ApiResponseError, message)
    }

    pub fn host_unreachable(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::HostUnreachable, message)
    }

    pub fn ssl_handshake(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::SslHandshakeException, message)
    }

    pub fn invalid_deeplink(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidDeeplink, message)
    }

    /// `from_http_failure` builds an error from a non-success HTTP answer. The service
    /// usually returns `{"error_class": .., "error_message": .., "access_token": ..}`
    pub fn from_http_failure(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody {
                error_class: Some(class),
                error_message,
                access_token,
            }) => Self {
                error_class: ErrorClass::from_class_name(&class),
                error_message: error_message.unwrap_or_else(|| class.clone()),
                access_token,
            },
            _ if status == 401 => Self::new(
                ErrorClass::AuthenticationError,
                format!("http status {}", status),
            ),
            _ => Self::response(format!("http status {}", status)),
        }
    }

    pub fn is_connection_not_found(&self) -> bool {
        self.error_class == ErrorClass::ConnectionNotFound
    }

    pub fn is_authorization_not_found(&self) -> bool {
        self.error_class == ErrorClass::AuthorizationNotFound
    }

    /// `should_invalidate_connection` tells the caller the remote side no longer
    /// recognizes the connection, so the local record should become inactive
    pub fn should_invalidate_connection(&self) -> bool {
        matches!(
            self.error_class,
            ErrorClass::ConnectionNotFound | ErrorClass::AuthenticationError
        )
    }
}
