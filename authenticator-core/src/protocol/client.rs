use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use rst_common::standard::serde::Serialize;
use rst_common::with_logging::log::{debug, warn};
use rst_common::with_tokio::tokio::{self, task};

use crate::authorization::types::AuthorizationStatus;
use crate::authorization::{AuthorizationData, AuthorizationItem};
use crate::config::Client as ClientConfig;
use crate::connection::types::ApiVersion;
use crate::connection::RichConnection;
use crate::crypto::{EncryptedEnvelope, EncryptedEnvelopeV1, EncryptedEnvelopeV2, EnvelopeContent};
use crate::errors::ApiError;
use crate::gate::QueueGate;
use crate::signature;

use super::endpoint::{join_url, Endpoint};
use super::types::{
    ApiRequest, ConnectionFailure, FetchResult, TransportBuilder, CONTENT_TYPE_JSON,
    HEADER_ACCEPT_LANGUAGE, HEADER_ACCESS_TOKEN, HEADER_CONTENT_TYPE, HEADER_EXPIRES_AT,
    HEADER_JWS_SIGNATURE, HEADER_SIGNATURE, HEADER_USER_AGENT,
};
use super::wire::{parse_data, to_body, SignedEnvelope};

/// `ProtocolClient` exposes one async operation per protocol verb
///
/// It keeps no state between calls: everything a request needs comes from the given
/// [`RichConnection`] and the client configuration. Operations over many connections run
/// one task per connection and always report successes next to failures.
pub struct ProtocolClient<TTransport>
where
    TTransport: TransportBuilder,
{
    transport: Arc<TTransport>,
    config: ClientConfig,
}

impl<TTransport> Clone for ProtocolClient<TTransport>
where
    TTransport: TransportBuilder,
{
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            config: self.config.clone(),
        }
    }
}

impl<TTransport> ProtocolClient<TTransport>
where
    TTransport: TransportBuilder,
{
    pub fn new(transport: Arc<TTransport>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(super) fn base_headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert(HEADER_CONTENT_TYPE.to_string(), CONTENT_TYPE_JSON.to_string());
        headers.insert(
            HEADER_ACCEPT_LANGUAGE.to_string(),
            self.config.accept_language(),
        );
        headers.insert(HEADER_USER_AGENT.to_string(), self.config.user_agent());
        headers
    }

    /// `signed_request` builds an authenticated request for the connection. `v1` requests
    /// always carry `Expires-at` and `Signature`, `v2` requests with a body carry the
    /// detached JWS of that body.
    pub(super) fn signed_request(
        &self,
        rich: &RichConnection,
        endpoint: Endpoint<'_>,
        body: Option<String>,
    ) -> Result<ApiRequest, ApiError> {
        let connection = rich.connection();
        let (method, path) = endpoint.route(connection.api_version);
        let url = join_url(&connection.connect_url, &path);

        let mut headers = self.base_headers();
        headers.insert(
            HEADER_ACCESS_TOKEN.to_string(),
            connection.access_token.clone(),
        );

        match connection.api_version {
            ApiVersion::V1 => {
                let expires_at = signature::expires_at(self.config.signature_window());
                let signature = signature::sign_v1(
                    &method,
                    &url,
                    expires_at,
                    body.as_deref().unwrap_or_default(),
                    rich.device_private_key(),
                );

                headers.insert(HEADER_EXPIRES_AT.to_string(), expires_at.to_string());
                headers.insert(HEADER_SIGNATURE.to_string(), signature);
            }
            ApiVersion::V2 => {
                if let Some(body) = body.as_deref() {
                    headers.insert(
                        HEADER_JWS_SIGNATURE.to_string(),
                        signature::sign_v2(body, rich.device_private_key())?,
                    );
                }
            }
        }

        Ok(ApiRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// `v2_body` wraps `data` with a fresh `exp` claim
    pub(super) fn v2_body<T: Serialize>(&self, data: T) -> Result<String, ApiError> {
        to_body(&SignedEnvelope {
            data,
            exp: signature::expires_at(self.config.signature_window()),
        })
    }

    /// `submit` returns the body of a successful response, anything else becomes an
    /// [`ApiError`]
    pub(super) async fn submit(&self, request: ApiRequest) -> Result<String, ApiError> {
        debug!("[protocol:submit] {} {}", request.method, request.url);

        let response = self.transport.submit(request).await?;
        if !response.is_success() {
            return Err(ApiError::from_http_failure(response.status, &response.body));
        }

        Ok(response.body)
    }

    /// `fan_out` runs `operation` for every connection on its own task and joins the
    /// results through a [`QueueGate`]
    pub(super) async fn fan_out<TOutput, TOperation, TFuture>(
        &self,
        riches: Vec<RichConnection>,
        operation: TOperation,
    ) -> Vec<(String, Result<TOutput, ApiError>)>
    where
        TOutput: Send + 'static,
        TOperation: Fn(Self, RichConnection) -> TFuture,
        TFuture: Future<Output = Result<TOutput, ApiError>> + Send + 'static,
    {
        let expected = riches.len();
        let (gate, rx) = QueueGate::with_channel(expected);

        for rich in riches {
            let connection_id = rich.id().to_string();
            let future = operation(self.clone(), rich);
            let gate = gate.clone();

            tokio::spawn(async move {
                let result = future.await;
                gate.complete((connection_id, result));
            });
        }

        drop(gate);
        match rx.await {
            Ok(results) => results,
            Err(_) => {
                warn!(
                    "[protocol:fan_out] a sub request ended without reporting, {} expected",
                    expected
                );
                Vec::new()
            }
        }
    }

    pub(super) fn collect<T>(results: Vec<(String, Result<Vec<T>, ApiError>)>) -> FetchResult<T> {
        results
            .into_iter()
            .fold(FetchResult::default(), |mut acc, (connection_id, result)| {
                match result {
                    Ok(items) => acc.items.extend(items),
                    Err(error) => acc.errors.push(ConnectionFailure {
                        connection_id,
                        error,
                    }),
                }
                acc
            })
    }
}

/// `decode_envelopes` reads a `{"data": [..]}` list in the dialect of the connection
pub(super) fn decode_envelopes(
    version: ApiVersion,
    body: &str,
) -> Result<Vec<EncryptedEnvelope>, ApiError> {
    let envelopes = match version {
        ApiVersion::V1 => parse_data::<Vec<EncryptedEnvelopeV1>>(body)?
            .into_iter()
            .map(EncryptedEnvelope::V1)
            .collect(),
        ApiVersion::V2 => parse_data::<Vec<EncryptedEnvelopeV2>>(body)?
            .into_iter()
            .map(EncryptedEnvelope::V2)
            .collect(),
    };

    Ok(envelopes)
}

pub(super) fn decode_envelope(version: ApiVersion, body: &str) -> Result<EncryptedEnvelope, ApiError> {
    let envelope = match version {
        ApiVersion::V1 => EncryptedEnvelope::V1(parse_data::<EncryptedEnvelopeV1>(body)?),
        ApiVersion::V2 => EncryptedEnvelope::V2(parse_data::<EncryptedEnvelopeV2>(body)?),
    };

    Ok(envelope)
}

/// `open_envelope` decrypts with the key material matching the envelope dialect
pub(super) fn open_envelope<T: EnvelopeContent>(
    envelope: &EncryptedEnvelope,
    rich: &RichConnection,
) -> Option<T> {
    match envelope {
        EncryptedEnvelope::V1(envelope) => envelope.open(rich.device_private_key()),
        EncryptedEnvelope::V2(envelope) => envelope.open(rich.shared_secret()?),
    }
}

pub(super) fn envelope_status(envelope: &EncryptedEnvelope) -> AuthorizationStatus {
    match envelope {
        EncryptedEnvelope::V1(_) => AuthorizationStatus::Pending,
        EncryptedEnvelope::V2(envelope) => envelope
            .status
            .as_deref()
            .and_then(AuthorizationStatus::from_value)
            .unwrap_or_default(),
    }
}

/// `open_authorizations` decrypts a batch on the blocking pool, envelopes that fail to
/// open are dropped
pub(super) async fn open_authorizations(
    rich: RichConnection,
    envelopes: Vec<EncryptedEnvelope>,
) -> Result<Vec<AuthorizationItem>, ApiError> {
    task::spawn_blocking(move || {
        envelopes
            .iter()
            .filter_map(|envelope| {
                let data = open_envelope::<AuthorizationData>(envelope, &rich);
                if data.is_none() {
                    warn!(
                        "[protocol:open_authorizations] dropped envelope {} of connection {}",
                        envelope.id(),
                        envelope.connection_id()
                    );
                }

                data.map(|data| AuthorizationItem::from_data(data, envelope_status(envelope)))
            })
            .collect::<Vec<AuthorizationItem>>()
    })
    .await
    .map_err(|err| ApiError::response(err.to_string()))
}

pub(super) async fn open_contents<T>(
    rich: RichConnection,
    envelopes: Vec<EncryptedEnvelope>,
) -> Result<Vec<T>, ApiError>
where
    T: EnvelopeContent + Send + 'static,
{
    task::spawn_blocking(move || {
        envelopes
            .iter()
            .filter_map(|envelope| {
                let content = open_envelope::<T>(envelope, &rich);
                if content.is_none() {
                    warn!(
                        "[protocol:open_contents] dropped envelope {} of connection {}",
                        envelope.id(),
                        envelope.connection_id()
                    );
                }
                content
            })
            .collect::<Vec<T>>()
    })
    .await
    .map_err(|err| ApiError::response(err.to_string()))
}
