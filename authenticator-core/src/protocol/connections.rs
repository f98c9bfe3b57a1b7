use http::Method;
use x25519_dalek::PublicKey as X25519PublicKey;

use rst_common::with_logging::log::{debug, info};

use crate::connection::types::ApiVersion;
use crate::connection::{Connection, RichConnection};
use crate::crypto::envelope::encrypt_with_shared_secret;
use crate::crypto::{dh, pem};
use crate::errors::ApiError;
use crate::keystore::types::{DhKeyPair, KeyStoreBuilder, RsaKeyPair};

use super::client::ProtocolClient;
use super::endpoint::{join_url, Endpoint};
use super::types::{
    ApiRequest, ConnectionCreated, ConnectionFailure, CreateConnectionRequest, EncryptedValue,
    ProviderConfiguration, PublicKeyMaterial, PushTokenUpdate, RevokeResult, TransportBuilder,
};
use super::wire::{
    parse_data, parse_outcome, to_body, CreateConnectionV1Data, CreateConnectionV2Data,
    DataEnvelope, EmptyData, PushTokenData,
};

impl PublicKeyMaterial {
    pub fn v1(rsa_key_pair: &RsaKeyPair) -> Result<Self, ApiError> {
        Ok(PublicKeyMaterial::V1 {
            rsa_public_key_pem: pem::rsa_public_key_to_pem(&rsa_key_pair.public_key)?,
        })
    }

    /// `v2` sends the device DH key in the clear and the device RSA key encrypted under
    /// the freshly agreed shared secret
    pub fn v2(
        rsa_key_pair: &RsaKeyPair,
        dh_key_pair: &DhKeyPair,
        shared_secret: &[u8],
    ) -> Result<Self, ApiError> {
        let rsa_pem = pem::rsa_public_key_to_pem(&rsa_key_pair.public_key)?;
        let (iv, data) = encrypt_with_shared_secret(rsa_pem.as_bytes(), shared_secret)?;

        Ok(PublicKeyMaterial::V2 {
            dh_public_key_pem: pem::x25519_public_key_to_pem(&dh_key_pair.public_key)?,
            encrypted_rsa_public_key: EncryptedValue { iv, data },
        })
    }
}

impl<TTransport> ProtocolClient<TTransport>
where
    TTransport: TransportBuilder,
{
    pub async fn fetch_provider_configuration(
        &self,
        configuration_url: &str,
    ) -> Result<ProviderConfiguration, ApiError> {
        let request = ApiRequest {
            method: Method::GET,
            url: configuration_url.to_string(),
            headers: self.base_headers(),
            body: None,
        };

        let body = self.submit(request).await?;
        let configuration: ProviderConfiguration = parse_data(&body)?;
        if configuration.api_version().is_none() {
            return Err(ApiError::response(format!(
                "unsupported provider version: {}",
                configuration.version
            )));
        }

        Ok(configuration)
    }

    /// `prepare_connection` creates the local record and its keys for a provider. The
    /// record stays inactive until the provider accepts it.
    pub fn prepare_connection<TKeyStore>(
        &self,
        configuration: &ProviderConfiguration,
        keystore: &TKeyStore,
    ) -> Result<(Connection, PublicKeyMaterial), ApiError>
    where
        TKeyStore: KeyStoreBuilder + ?Sized,
    {
        let api_version = configuration.api_version().ok_or_else(|| {
            ApiError::request(format!(
                "unsupported provider version: {}",
                configuration.version
            ))
        })?;

        let provider_dh_pem = match api_version {
            ApiVersion::V1 => None,
            ApiVersion::V2 => Some(configuration.public_key.as_deref().ok_or_else(|| {
                ApiError::request("provider public key is missing".to_string())
            })?),
        };

        let mut connection = Connection::new(
            configuration.name.clone(),
            configuration.code.clone(),
            configuration.connect_url.clone(),
            api_version,
            String::new(),
        );
        connection.provider_id = configuration.provider_id.clone();
        connection.logo_url = configuration.logo_url.clone();
        connection.support_email = configuration.support_email.clone();
        connection.geolocation_required = configuration.geolocation_required;
        connection.consent_management_supported = configuration.consent_management;

        let rsa_key_pair = keystore.generate_rsa_key_pair(&connection.guid)?;
        let material = match provider_dh_pem {
            None => PublicKeyMaterial::v1(&rsa_key_pair)?,
            Some(provider_pem) => {
                let material = keystore
                    .generate_dh_key_pair(&connection.guid, provider_pem)
                    .map_err(ApiError::from)
                    .and_then(|dh_key_pair| {
                        let provider_key: X25519PublicKey =
                            pem::x25519_public_key_from_pem(provider_pem)?;
                        let shared_secret =
                            dh::compute_shared_secret(&dh_key_pair.secret, &provider_key)?;
                        PublicKeyMaterial::v2(&rsa_key_pair, &dh_key_pair, &shared_secret)
                    });

                match material {
                    Ok(material) => {
                        connection.provider_dh_public_key_pem = Some(provider_pem.to_string());
                        material
                    }
                    Err(err) => {
                        keystore.delete_key(&connection.guid);
                        return Err(err);
                    }
                }
            }
        };

        info!(
            "[protocol:prepare_connection] prepared connection {} for {}",
            connection.guid, connection.code
        );
        Ok((connection, material))
    }

    pub async fn create_connection(
        &self,
        request: CreateConnectionRequest,
    ) -> Result<ConnectionCreated, ApiError> {
        let connection = &request.connection;
        let (method, path) = Endpoint::CreateConnection.route(connection.api_version);

        let body = match (&request.public_key_material, connection.api_version) {
            (PublicKeyMaterial::V1 { rsa_public_key_pem }, ApiVersion::V1) => {
                to_body(&DataEnvelope {
                    data: CreateConnectionV1Data {
                        provider_code: connection.code.clone(),
                        public_key: rsa_public_key_pem.clone(),
                        return_url: request.return_url.clone(),
                        platform: request.platform.clone(),
                        push_token: request.push_token.clone(),
                        connect_query: request.connect_query.clone(),
                    },
                })?
            }
            (
                PublicKeyMaterial::V2 {
                    dh_public_key_pem,
                    encrypted_rsa_public_key,
                },
                ApiVersion::V2,
            ) => {
                let provider_id = connection
                    .provider_id
                    .clone()
                    .ok_or_else(|| ApiError::request("provider id is missing".to_string()))?;

                to_body(&DataEnvelope {
                    data: CreateConnectionV2Data {
                        provider_id,
                        dh_public_key: dh_public_key_pem.clone(),
                        encrypted_rsa_public_key: encrypted_rsa_public_key.clone(),
                        return_url: request.return_url.clone(),
                        platform: request.platform.clone(),
                        push_token: request.push_token.clone(),
                        connect_query: request.connect_query.clone(),
                    },
                })?
            }
            _ => {
                return Err(ApiError::request(
                    "public key material does not match the api version".to_string(),
                ))
            }
        };

        let api_request = ApiRequest {
            method,
            url: join_url(&connection.connect_url, &path),
            headers: self.base_headers(),
            body: Some(body),
        };

        let response = self.submit(api_request).await?;
        let created: ConnectionCreated = parse_data(&response)?;
        info!(
            "[protocol:create_connection] provider accepted connection {}",
            created.id
        );
        Ok(created)
    }

    pub async fn revoke_connections(&self, riches: Vec<RichConnection>) -> RevokeResult {
        let results = self
            .fan_out(riches, |client, rich| async move {
                client.revoke_connection(&rich).await
            })
            .await;

        results
            .into_iter()
            .fold(RevokeResult::default(), |mut acc, (connection_id, result)| {
                match result {
                    Ok(_) => acc.revoked_ids.push(connection_id),
                    Err(error) => acc.errors.push(ConnectionFailure {
                        connection_id,
                        error,
                    }),
                }
                acc
            })
    }

    async fn revoke_connection(&self, rich: &RichConnection) -> Result<(), ApiError> {
        let endpoint = Endpoint::RevokeConnection {
            connection_id: rich.id(),
        };

        let body = match rich.connection().api_version {
            ApiVersion::V1 => None,
            ApiVersion::V2 => Some(self.v2_body(EmptyData::default())?),
        };

        let response = self.submit(self.signed_request(rich, endpoint, body)?).await?;
        let outcome = parse_outcome(&response)?;
        if outcome.is_rejected() {
            return Err(ApiError::response("revoke rejected by provider".to_string()));
        }

        debug!("[protocol:revoke_connection] revoked {}", rich.id());
        Ok(())
    }

    /// `update_push_token` only talks to the provider when the stored token is stale.
    /// Persisting the new token is left to the caller.
    pub async fn update_push_token(
        &self,
        rich: &RichConnection,
        current_token: &str,
    ) -> Result<PushTokenUpdate, ApiError> {
        let connection = rich.connection();
        if current_token.is_empty() || connection.push_token.as_deref() == Some(current_token) {
            return Ok(PushTokenUpdate::Unchanged);
        }

        let data = PushTokenData {
            push_token: current_token.to_string(),
        };
        let body = match connection.api_version {
            ApiVersion::V1 => to_body(&DataEnvelope { data })?,
            ApiVersion::V2 => self.v2_body(data)?,
        };

        let endpoint = Endpoint::PushToken {
            connection_id: rich.id(),
        };
        self.submit(self.signed_request(rich, endpoint, Some(body))?)
            .await?;

        info!(
            "[protocol:update_push_token] token refreshed for {}",
            connection.guid
        );
        Ok(PushTokenUpdate::Updated {
            guid: connection.guid.clone(),
            push_token: current_token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::standard::serde_json::{self, Value};
    use rst_common::with_tokio::tokio;

    use crate::config::KeyStore as KeyStoreConfig;
    use crate::connection::build_rich_connection;
    use crate::crypto::envelope::decrypt_with_shared_secret;
    use crate::errors::ErrorClass;
    use crate::keystore::InMemoryKeyStore;
    use crate::protocol::fixtures::{access_token, client, data_body, ok, rich_v1, rich_v2, MockFakeTransport};
    use crate::protocol::types::TransportError;

    fn configuration(version: &str, public_key: Option<String>) -> ProviderConfiguration {
        ProviderConfiguration {
            connect_url: "https://demo.example.com".to_string(),
            code: "demobank".to_string(),
            name: "Demo Bank".to_string(),
            version: version.to_string(),
            logo_url: None,
            support_email: Some("support@demo.example.com".to_string()),
            provider_id: Some("provider-1".to_string()),
            public_key,
            geolocation_required: true,
            consent_management: true,
        }
    }

    #[tokio::test]
    async fn test_fetch_provider_configuration() {
        let body = data_body(configuration("1", None));

        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .withf(|request: &ApiRequest| {
                request.method == Method::GET
                    && request.url == "https://demo.example.com/configuration"
                    && request.header("Access-Token").is_none()
            })
            .returning(move |_| ok(body.clone()));

        let configuration = client(transport)
            .fetch_provider_configuration("https://demo.example.com/configuration")
            .await
            .unwrap();
        assert_eq!(configuration.code, "demobank".to_string())
    }

    #[tokio::test]
    async fn test_fetch_provider_configuration_unknown_version() {
        let body = data_body(configuration("9", None));

        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .returning(move |_| ok(body.clone()));

        let result = client(transport)
            .fetch_provider_configuration("https://demo.example.com/configuration")
            .await;
        assert_eq!(result.unwrap_err().error_class, ErrorClass::ApiResponseError)
    }

    #[test]
    fn test_prepare_connection_v1() {
        let keystore = InMemoryKeyStore::new(&KeyStoreConfig::new(1024));
        let protocol = client(MockFakeTransport::new());

        let (connection, material) = protocol
            .prepare_connection(&configuration("1", None), &keystore)
            .unwrap();

        assert!(!connection.is_active());
        assert!(connection.geolocation_required);
        assert!(matches!(material, PublicKeyMaterial::V1 { .. }));
        assert_eq!(keystore.aliases(), vec![connection.guid.clone()]);
        assert!(build_rich_connection(&connection, &keystore).is_some())
    }

    #[test]
    fn test_prepare_connection_v2() {
        let keystore = InMemoryKeyStore::new(&KeyStoreConfig::new(1024));
        let protocol = client(MockFakeTransport::new());

        let provider_secret = dh::generate_secret();
        let provider_pem =
            pem::x25519_public_key_to_pem(&X25519PublicKey::from(&provider_secret)).unwrap();

        let (connection, material) = protocol
            .prepare_connection(&configuration("2", Some(provider_pem)), &keystore)
            .unwrap();

        let PublicKeyMaterial::V2 {
            dh_public_key_pem,
            encrypted_rsa_public_key,
        } = material
        else {
            panic!("expected v2 key material");
        };

        let device_dh = pem::x25519_public_key_from_pem(&dh_public_key_pem).unwrap();
        let shared_secret = dh::compute_shared_secret(&provider_secret, &device_dh).unwrap();
        let rsa_pem = decrypt_with_shared_secret(
            &encrypted_rsa_public_key.iv,
            &encrypted_rsa_public_key.data,
            &shared_secret,
        )
        .unwrap();

        let device_rsa = pem::rsa_public_key_from_pem(&String::from_utf8(rsa_pem).unwrap()).unwrap();
        let stored = keystore.get_key_pair(&connection.guid).unwrap();
        assert_eq!(device_rsa, stored.public_key);

        let rich = build_rich_connection(&connection, &keystore).unwrap();
        assert_eq!(rich.shared_secret(), Some(shared_secret.as_slice()))
    }

    #[test]
    fn test_prepare_connection_v2_without_provider_key() {
        let keystore = InMemoryKeyStore::new(&KeyStoreConfig::new(1024));
        let protocol = client(MockFakeTransport::new());

        let result = protocol.prepare_connection(&configuration("2", None), &keystore);
        assert_eq!(result.unwrap_err().error_class, ErrorClass::ApiRequestError);
        assert!(keystore.aliases().is_empty())
    }

    #[tokio::test]
    async fn test_create_connection_v1() {
        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .withf(|request: &ApiRequest| {
                let value: Value =
                    serde_json::from_str(request.body.as_deref().unwrap_or("{}")).unwrap();

                request.method == Method::POST
                    && request.url == "https://demo.example.com/api/authenticator/v1/connections"
                    && value["data"]["provider_code"] == "demobank"
                    && value["data"]["public_key"] == "PEM"
                    && value["data"]["connect_query"] == "query-1"
                    && value["data"].get("push_token").is_none()
            })
            .returning(|_| {
                ok(data_body(serde_json::json!({
                    "id": "333",
                    "connect_url": "https://demo.example.com/connect/333"
                })))
            });

        let request = CreateConnectionRequest {
            connection: rich_v1("").connection().clone(),
            public_key_material: PublicKeyMaterial::V1 {
                rsa_public_key_pem: "PEM".to_string(),
            },
            return_url: "authenticator://oauth/redirect".to_string(),
            platform: "android".to_string(),
            push_token: None,
            connect_query: Some("query-1".to_string()),
        };

        let created = client(transport).create_connection(request).await.unwrap();
        assert_eq!(created.id, "333".to_string());
        assert!(created.access_token.is_none())
    }

    #[tokio::test]
    async fn test_create_connection_v2() {
        let keystore = InMemoryKeyStore::new(&KeyStoreConfig::new(1024));
        let provider_secret = dh::generate_secret();
        let provider_pem =
            pem::x25519_public_key_to_pem(&X25519PublicKey::from(&provider_secret)).unwrap();

        let (connection, material) = client(MockFakeTransport::new())
            .prepare_connection(&configuration("2", Some(provider_pem)), &keystore)
            .unwrap();
        let PublicKeyMaterial::V2 {
            dh_public_key_pem,
            encrypted_rsa_public_key,
        } = material.clone()
        else {
            panic!("expected v2 key material");
        };

        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .withf(move |request: &ApiRequest| {
                let value: Value =
                    serde_json::from_str(request.body.as_deref().unwrap_or("{}")).unwrap();

                request.method == Method::POST
                    && request.url == "https://demo.example.com/api/authenticator/v2/connections"
                    && request.header("Access-Token").is_none()
                    && value["data"]["provider_id"] == "provider-1"
                    && value["data"]["dh_public_key"] == dh_public_key_pem.as_str()
                    && value["data"]["encrypted_rsa_public_key"]["iv"]
                        == encrypted_rsa_public_key.iv.as_str()
                    && value["data"]["encrypted_rsa_public_key"]["data"]
                        == encrypted_rsa_public_key.data.as_str()
                    && value["data"]["push_token"] == "push-1"
                    && value["data"].get("provider_code").is_none()
            })
            .returning(|_| {
                ok(data_body(serde_json::json!({
                    "id": "444",
                    "connect_url": "https://demo.example.com/connect/444"
                })))
            });

        let request = CreateConnectionRequest {
            connection: connection.clone(),
            public_key_material: material.clone(),
            return_url: "authenticator://oauth/redirect".to_string(),
            platform: "android".to_string(),
            push_token: Some("push-1".to_string()),
            connect_query: None,
        };

        let created = client(transport).create_connection(request).await.unwrap();
        assert_eq!(created.id, "444".to_string());

        let mut without_provider = connection;
        without_provider.provider_id = None;

        let mut transport = MockFakeTransport::new();
        transport.expect_submit().never();

        let request = CreateConnectionRequest {
            connection: without_provider,
            public_key_material: material,
            return_url: "authenticator://oauth/redirect".to_string(),
            platform: "android".to_string(),
            push_token: None,
            connect_query: None,
        };

        let result = client(transport).create_connection(request).await;
        assert_eq!(result.unwrap_err().error_class, ErrorClass::ApiRequestError)
    }

    #[tokio::test]
    async fn test_create_connection_material_mismatch() {
        let mut transport = MockFakeTransport::new();
        transport.expect_submit().never();

        let request = CreateConnectionRequest {
            connection: rich_v2("").connection().clone(),
            public_key_material: PublicKeyMaterial::V1 {
                rsa_public_key_pem: "PEM".to_string(),
            },
            return_url: "authenticator://oauth/redirect".to_string(),
            platform: "android".to_string(),
            push_token: None,
            connect_query: None,
        };

        let result = client(transport).create_connection(request).await;
        assert_eq!(result.unwrap_err().error_class, ErrorClass::ApiRequestError)
    }

    #[tokio::test]
    async fn test_revoke_connections() {
        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(3)
            .returning(|request: ApiRequest| {
                match request.header("Access-Token") {
                    Some(token) if token == access_token("2") => Err(TransportError::Http {
                        status: 404,
                        body: r#"{"error_class":"ConnectionNotFound","error_message":"missing"}"#
                            .to_string(),
                    }),
                    Some(token) if token == access_token("3") => {
                        let url_ok = request.method == Method::PUT
                            && request.url.ends_with("/api/authenticator/v2/connections/3/revoke")
                            && request.header("x-jws-signature").is_some();
                        assert!(url_ok);
                        ok(data_body(serde_json::json!({"revoked_connection_id": "3"})))
                    }
                    _ => ok(data_body(serde_json::json!({"success": true}))),
                }
            });

        let result = client(transport)
            .revoke_connections(vec![rich_v1("1"), rich_v1("2"), rich_v2("3")])
            .await;

        let mut revoked = result.revoked_ids.clone();
        revoked.sort();
        assert_eq!(revoked, vec!["1".to_string(), "3".to_string()]);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].error.should_invalidate_connection())
    }

    #[tokio::test]
    async fn test_update_push_token_unchanged() {
        let mut transport = MockFakeTransport::new();
        transport.expect_submit().never();

        let mut connection = rich_v1("1").connection().clone();
        connection.push_token = Some("push-1".to_string());
        let rich = RichConnection::new(connection, rich_v1("1").device_private_key().clone(), None, None);

        let protocol = client(transport);
        let result = protocol.update_push_token(&rich, "push-1").await.unwrap();
        assert_eq!(result, PushTokenUpdate::Unchanged);

        let result = protocol.update_push_token(&rich, "").await.unwrap();
        assert_eq!(result, PushTokenUpdate::Unchanged)
    }

    #[tokio::test]
    async fn test_update_push_token_stale() {
        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .withf(|request: &ApiRequest| {
                request.url == "https://demo.example.com/api/authenticator/v2/connections/2/push_token"
                    && request
                        .body
                        .as_deref()
                        .map(|body| body.contains(r#""push_token":"push-2""#))
                        .unwrap_or(false)
            })
            .returning(|_| ok(data_body(serde_json::json!({"success": true}))));

        let rich = rich_v2("2");
        let result = client(transport)
            .update_push_token(&rich, "push-2")
            .await
            .unwrap();

        assert_eq!(
            result,
            PushTokenUpdate::Updated {
                guid: rich.guid().to_string(),
                push_token: "push-2".to_string(),
            }
        )
    }
}
