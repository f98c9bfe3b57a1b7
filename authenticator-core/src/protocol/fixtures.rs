use std::sync::Arc;

use mockall::mock;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::{Duration, Utc};
use rst_common::standard::serde_json::{self, json};

use crate::authorization::AuthorizationData;
use crate::config::Client as ClientConfig;
use crate::connection::types::ApiVersion;
use crate::connection::{Connection, RichConnection};
use crate::crypto::rsa::tests::device_key;

use super::types::{ApiRequest, ApiResponse, TransportBuilder, TransportError};
use super::ProtocolClient;

pub(crate) const SHARED_SECRET: [u8; 32] = [7u8; 32];

mock!(
    pub FakeTransport {}

    #[async_trait]
    impl TransportBuilder for FakeTransport {
        async fn submit(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
    }
);

pub(crate) fn client(transport: MockFakeTransport) -> ProtocolClient<MockFakeTransport> {
    ProtocolClient::new(Arc::new(transport), ClientConfig::default())
}

pub(crate) fn access_token(id: &str) -> String {
    format!("token-{}", id)
}

pub(crate) fn connection(id: &str, api_version: ApiVersion) -> Connection {
    let mut connection = Connection::new(
        "Demo Bank".to_string(),
        "demobank".to_string(),
        "https://demo.example.com".to_string(),
        api_version,
        String::new(),
    );
    connection.activate(id.to_string(), access_token(id));
    connection.provider_id = Some("provider-1".to_string());
    connection
}

pub(crate) fn rich_v1(id: &str) -> RichConnection {
    RichConnection::new(connection(id, ApiVersion::V1), device_key(), None, None)
}

pub(crate) fn rich_v2(id: &str) -> RichConnection {
    RichConnection::new(
        connection(id, ApiVersion::V2),
        device_key(),
        None,
        Some(SHARED_SECRET),
    )
}

pub(crate) fn authorization(id: &str, connection_id: &str, expires_in: Duration) -> AuthorizationData {
    AuthorizationData {
        id: id.to_string(),
        connection_id: connection_id.to_string(),
        title: format!("Authorization {}", id),
        description: "Payment of 10 EUR to Shop".to_string(),
        created_at: Utc::now(),
        expires_at: Utc::now() + expires_in,
        authorization_code: Some(format!("code-{}", id)),
    }
}

pub(crate) fn data_body<T: rst_common::standard::serde::Serialize>(data: T) -> String {
    serde_json::to_string(&json!({ "data": data })).unwrap()
}

pub(crate) fn ok(body: String) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse::new(200, body))
}
