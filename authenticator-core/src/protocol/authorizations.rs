use rst_common::with_logging::log::{debug, info};

use crate::authorization::types::AuthorizationStatus;
use crate::authorization::AuthorizationItem;
use crate::connection::types::ApiVersion;
use crate::connection::RichConnection;
use crate::crypto::envelope::encrypt_with_shared_secret;
use crate::errors::ApiError;

use super::client::{
    decode_envelope, decode_envelopes, envelope_status, open_authorizations, ProtocolClient,
};
use super::endpoint::Endpoint;
use super::types::{
    ActionResult, AuthorizationDecision, AuthorizationSnapshot, ConfirmResult, EncryptedValue,
    FetchResult, TransportBuilder, HEADER_AUTHORIZATION_TYPE, HEADER_GEO_LOCATION,
};
use super::wire::{
    parse_data, parse_outcome, to_body, ActionV2Data, DataEnvelope, DecisionV1Data,
    DecisionV2Payload, OutcomeData,
};

impl<TTransport> ProtocolClient<TTransport>
where
    TTransport: TransportBuilder,
{
    /// `fetch_authorizations` asks every connection for its pending authorizations. Items
    /// are ordered by creation time, failed connections are listed in `errors`.
    pub async fn fetch_authorizations(
        &self,
        riches: Vec<RichConnection>,
    ) -> FetchResult<AuthorizationItem> {
        let total = riches.len();
        let results = self
            .fan_out(riches, |client, rich| async move {
                client.fetch_connection_authorizations(rich).await
            })
            .await;

        let mut result = Self::collect(results);
        result
            .items
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        debug!(
            "[protocol:fetch_authorizations] {} items from {} connections, {} failed",
            result.items.len(),
            total,
            result.errors.len()
        );
        result
    }

    async fn fetch_connection_authorizations(
        &self,
        rich: RichConnection,
    ) -> Result<Vec<AuthorizationItem>, ApiError> {
        let request = self.signed_request(&rich, Endpoint::Authorizations, None)?;
        let body = self.submit(request).await?;

        let envelopes = decode_envelopes(rich.connection().api_version, &body)?;
        open_authorizations(rich, envelopes).await
    }

    pub async fn fetch_authorization(
        &self,
        rich: &RichConnection,
        authorization_id: &str,
    ) -> Result<AuthorizationSnapshot, ApiError> {
        if authorization_id.is_empty() {
            return Err(ApiError::request("authorization id is empty".to_string()));
        }

        let endpoint = Endpoint::Authorization { authorization_id };
        let body = self.submit(self.signed_request(rich, endpoint, None)?).await?;
        let envelope = decode_envelope(rich.connection().api_version, &body)?;

        let status = envelope_status(&envelope);
        let item = open_authorizations(rich.clone(), vec![envelope.clone()])
            .await?
            .into_iter()
            .next();

        if item.is_none() && !status.is_terminal() {
            return Err(ApiError::response(format!(
                "unable to open authorization {}",
                authorization_id
            )));
        }

        Ok(AuthorizationSnapshot {
            id: envelope.id().to_string(),
            connection_id: envelope.connection_id().to_string(),
            status,
            item,
        })
    }

    pub async fn confirm_authorization(
        &self,
        rich: &RichConnection,
        decision: AuthorizationDecision,
    ) -> Result<ConfirmResult, ApiError> {
        self.decide(rich, decision, true).await
    }

    pub async fn deny_authorization(
        &self,
        rich: &RichConnection,
        decision: AuthorizationDecision,
    ) -> Result<ConfirmResult, ApiError> {
        self.decide(rich, decision, false).await
    }

    async fn decide(
        &self,
        rich: &RichConnection,
        decision: AuthorizationDecision,
        confirm: bool,
    ) -> Result<ConfirmResult, ApiError> {
        if decision.authorization_id.is_empty() {
            return Err(ApiError::request("authorization id is empty".to_string()));
        }

        let connection = rich.connection();
        let authorization_id = decision.authorization_id.as_str();
        let endpoint = if confirm {
            Endpoint::ConfirmAuthorization { authorization_id }
        } else {
            Endpoint::DenyAuthorization { authorization_id }
        };

        let request = match connection.api_version {
            ApiVersion::V1 => {
                let body = to_body(&DataEnvelope {
                    data: DecisionV1Data {
                        confirm,
                        authorization_code: decision.authorization_code.clone(),
                    },
                })?;

                let mut request = self.signed_request(rich, endpoint, Some(body))?;
                if let Some(geolocation) = &decision.geolocation {
                    request
                        .headers
                        .insert(HEADER_GEO_LOCATION.to_string(), geolocation.clone());
                }
                if let Some(authorization_type) = &decision.authorization_type {
                    request.headers.insert(
                        HEADER_AUTHORIZATION_TYPE.to_string(),
                        authorization_type.clone(),
                    );
                }
                request
            }
            ApiVersion::V2 => {
                let shared_secret = rich.shared_secret().ok_or_else(|| {
                    ApiError::request("connection has no shared secret".to_string())
                })?;

                let payload = to_body(&DecisionV2Payload {
                    confirm,
                    authorization_code: decision.authorization_code.clone(),
                    user_authorization_type: decision.authorization_type.clone(),
                    geolocation: decision.geolocation.clone(),
                })?;
                let (iv, data) = encrypt_with_shared_secret(payload.as_bytes(), shared_secret)?;

                let body = self.v2_body(EncryptedValue { iv, data })?;
                self.signed_request(rich, endpoint, Some(body))?
            }
        };

        let response = self.submit(request).await?;
        let outcome = parse_outcome(&response)?;
        if outcome.is_rejected() {
            return Err(ApiError::response(format!(
                "authorization {} rejected by provider",
                authorization_id
            )));
        }

        info!(
            "[protocol:decide] authorization {} {}",
            authorization_id,
            if confirm { "confirmed" } else { "denied" }
        );

        Ok(ConfirmResult {
            authorization_id: outcome
                .authorization_id
                .or(outcome.id)
                .unwrap_or_else(|| authorization_id.to_string()),
            connection_id: rich.id().to_string(),
            status: outcome
                .status
                .as_deref()
                .and_then(AuthorizationStatus::from_value),
        })
    }

    /// `send_action` submits an action started outside the app, usually from an action
    /// deep link. The provider may answer with the authorization it created.
    pub async fn send_action(
        &self,
        action_uuid: &str,
        rich: &RichConnection,
    ) -> Result<ActionResult, ApiError> {
        if action_uuid.is_empty() {
            return Err(ApiError::request("action uuid is empty".to_string()));
        }

        let body = match rich.connection().api_version {
            ApiVersion::V1 => None,
            ApiVersion::V2 => Some(self.v2_body(ActionV2Data {
                connection_id: rich.id().to_string(),
            })?),
        };

        let endpoint = Endpoint::Action { action_uuid };
        let response = self.submit(self.signed_request(rich, endpoint, body)?).await?;
        let outcome: OutcomeData = parse_data(&response)?;
        if outcome.is_rejected() {
            return Err(ApiError::response(format!(
                "action {} rejected by provider",
                action_uuid
            )));
        }

        Ok(ActionResult {
            connection_id: outcome
                .connection_id
                .unwrap_or_else(|| rich.id().to_string()),
            authorization_id: outcome.authorization_id,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use http::Method;
    use rst_common::standard::chrono::Duration;
    use rst_common::standard::serde_json::{self, Value};
    use rst_common::with_tokio::tokio;

    use crate::crypto::envelope::decrypt_with_shared_secret;
    use crate::crypto::rsa::tests::{device_key, other_key};
    use crate::crypto::{EncryptedEnvelopeV1, EncryptedEnvelopeV2};
    use crate::errors::ErrorClass;
    use crate::protocol::fixtures::{
        access_token, authorization, client, data_body, ok, rich_v1, rich_v2, MockFakeTransport,
        SHARED_SECRET,
    };
    use crate::protocol::types::{
        ApiRequest, ApiResponse, TransportError, HEADER_EXPIRES_AT, HEADER_SIGNATURE,
    };
    use crate::signature::{verify_v1, verify_v2};

    fn v1_list(ids: &[&str], connection_id: &str) -> String {
        let public_key = device_key().to_public_key();
        let envelopes = ids
            .iter()
            .map(|id| {
                EncryptedEnvelopeV1::seal(
                    id,
                    connection_id,
                    &authorization(id, connection_id, Duration::minutes(5)),
                    &public_key,
                )
                .unwrap()
            })
            .collect::<Vec<EncryptedEnvelopeV1>>();

        data_body(envelopes)
    }

    #[tokio::test]
    async fn test_fetch_authorizations_partial_failure() {
        let body_first = v1_list(&["a1", "a2"], "1");
        let body_third = v1_list(&["c1"], "3");

        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(3)
            .returning(move |request: ApiRequest| {
                let token = request.header("Access-Token").unwrap_or_default().to_string();
                if token == access_token("1") {
                    ok(body_first.clone())
                } else if token == access_token("3") {
                    ok(body_third.clone())
                } else {
                    Err(TransportError::Timeout)
                }
            });

        let result = client(transport)
            .fetch_authorizations(vec![rich_v1("1"), rich_v1("2"), rich_v1("3")])
            .await;

        let mut ids = result
            .items
            .iter()
            .map(|item| item.id.clone())
            .collect::<Vec<String>>();
        ids.sort();
        assert_eq!(ids, vec!["a1", "a2", "c1"]);

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].connection_id, "2".to_string());
        assert_eq!(
            result.errors[0].error.error_class,
            ErrorClass::HostUnreachable
        )
    }

    #[tokio::test]
    async fn test_fetch_authorizations_drops_foreign_envelope() {
        let envelope = EncryptedEnvelopeV1::seal(
            "444",
            "1",
            &authorization("444", "1", Duration::minutes(5)),
            &other_key().to_public_key(),
        )
        .unwrap();
        assert_eq!(envelope.algorithm, "AES-256-CBC".to_string());
        let body = data_body(vec![envelope]);

        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .returning(move |_| ok(body.clone()));

        let result = client(transport).fetch_authorizations(vec![rich_v1("1")]).await;
        assert!(result.items.is_empty());
        assert!(result.errors.is_empty())
    }

    #[tokio::test]
    async fn test_fetch_authorizations_signed_v1() {
        let body = v1_list(&["444"], "1");

        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .withf(|request: &ApiRequest| {
                let expires_at = request
                    .header(HEADER_EXPIRES_AT)
                    .and_then(|value| value.parse::<i64>().ok())
                    .unwrap_or_default();
                let signature = request.header(HEADER_SIGNATURE).unwrap_or_default();

                request.method == Method::GET
                    && request.url
                        == "https://demo.example.com/api/authenticator/v1/authorizations"
                    && verify_v1(
                        &request.method,
                        &request.url,
                        expires_at,
                        "",
                        signature,
                        &device_key().to_public_key(),
                    )
            })
            .returning(move |_| ok(body.clone()));

        let result = client(transport).fetch_authorizations(vec![rich_v1("1")]).await;
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].id, "444".to_string());
        assert_eq!(result.items[0].status, AuthorizationStatus::Pending)
    }

    #[tokio::test]
    async fn test_fetch_authorizations_v2() {
        let mut envelope = EncryptedEnvelopeV2::seal(
            "555",
            "2",
            &authorization("555", "2", Duration::minutes(5)),
            &SHARED_SECRET,
        )
        .unwrap();
        envelope.status = Some("processing".to_string());
        let body = data_body(vec![envelope]);

        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .withf(|request: &ApiRequest| {
                request.url == "https://demo.example.com/api/authenticator/v2/authorizations"
                    && request.header(HEADER_SIGNATURE).is_none()
            })
            .returning(move |_| ok(body.clone()));

        let result = client(transport).fetch_authorizations(vec![rich_v2("2")]).await;
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].status, AuthorizationStatus::Processing)
    }

    #[tokio::test]
    async fn test_fetch_authorizations_empty() {
        let mut transport = MockFakeTransport::new();
        transport.expect_submit().never();

        let result = client(transport).fetch_authorizations(Vec::new()).await;
        assert!(result.items.is_empty());
        assert!(result.errors.is_empty())
    }

    #[tokio::test]
    async fn test_fetch_authorization_closed_without_data() {
        let body = data_body(json_envelope_v2("555", "2", "closed"));

        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .withf(|request: &ApiRequest| {
                request.url == "https://demo.example.com/api/authenticator/v2/authorizations/555"
            })
            .returning(move |_| ok(body.clone()));

        let snapshot = client(transport)
            .fetch_authorization(&rich_v2("2"), "555")
            .await
            .unwrap();
        assert_eq!(snapshot.status, AuthorizationStatus::Closed);
        assert!(snapshot.item.is_none())
    }

    #[tokio::test]
    async fn test_fetch_authorization_not_found() {
        let mut transport = MockFakeTransport::new();
        transport.expect_submit().times(1).returning(|_| {
            Ok(ApiResponse::new(
                404,
                r#"{"error_class":"AuthorizationNotFound","error_message":"not found"}"#,
            ))
        });

        let result = client(transport)
            .fetch_authorization(&rich_v1("1"), "444")
            .await;
        assert!(result.unwrap_err().is_authorization_not_found())
    }

    fn json_envelope_v2(id: &str, connection_id: &str, status: &str) -> Value {
        serde_json::json!({
            "id": id,
            "connection_id": connection_id,
            "algorithm": "AES-256-CBC",
            "iv": "",
            "data": "",
            "status": status,
        })
    }

    #[tokio::test]
    async fn test_confirm_empty_id_not_submitted() {
        let mut transport = MockFakeTransport::new();
        transport.expect_submit().never();

        let result = client(transport)
            .confirm_authorization(&rich_v1("1"), AuthorizationDecision::new(""))
            .await;
        assert_eq!(result.unwrap_err().error_class, ErrorClass::ApiRequestError)
    }

    #[tokio::test]
    async fn test_confirm_v2_without_shared_secret() {
        let mut transport = MockFakeTransport::new();
        transport.expect_submit().never();

        let rich = RichConnection::new(
            rich_v2("2").connection().clone(),
            device_key(),
            None,
            None,
        );
        let result = client(transport)
            .deny_authorization(&rich, AuthorizationDecision::new("555"))
            .await;
        assert_eq!(result.unwrap_err().error_class, ErrorClass::ApiRequestError)
    }

    #[tokio::test]
    async fn test_confirm_v1_headers() {
        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .withf(|request: &ApiRequest| {
                request.method == Method::PUT
                    && request.url
                        == "https://demo.example.com/api/authenticator/v1/authorizations/444"
                    && request.body.as_deref()
                        == Some(r#"{"data":{"confirm":true,"authorization_code":"code-444"}}"#)
                    && request.header("GEO-Location") == Some("GEO:52.506931;13.144558")
                    && request.header("Authorization-Type") == Some("biometrics")
                    && request.header(HEADER_SIGNATURE).is_some()
            })
            .returning(|_| ok(data_body(serde_json::json!({"success": true, "id": "444"}))));

        let decision = AuthorizationDecision {
            authorization_id: "444".to_string(),
            authorization_code: Some("code-444".to_string()),
            geolocation: Some("GEO:52.506931;13.144558".to_string()),
            authorization_type: Some("biometrics".to_string()),
        };

        let result = client(transport)
            .confirm_authorization(&rich_v1("1"), decision)
            .await
            .unwrap();
        assert_eq!(result.authorization_id, "444".to_string());
        assert_eq!(result.connection_id, "1".to_string())
    }

    #[tokio::test]
    async fn test_deny_v2_encrypted_payload() {
        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .withf(|request: &ApiRequest| {
                let body = request.body.clone().unwrap_or_default();
                let jws = request.header("x-jws-signature").unwrap_or_default();
                if !verify_v2(jws, &body, &device_key().to_public_key()) {
                    return false;
                }

                let value: Value = serde_json::from_str(&body).unwrap();
                let iv = value["data"]["iv"].as_str().unwrap_or_default();
                let data = value["data"]["data"].as_str().unwrap_or_default();
                let payload = decrypt_with_shared_secret(iv, data, &SHARED_SECRET).unwrap();
                let payload: DecisionV2Payload = serde_json::from_slice(&payload).unwrap();

                request.url
                    == "https://demo.example.com/api/authenticator/v2/authorizations/555/deny"
                    && value["exp"].is_i64()
                    && !payload.confirm
            })
            .returning(|_| {
                ok(data_body(serde_json::json!({
                    "authorization_id": "555",
                    "status": "deny_processed"
                })))
            });

        let result = client(transport)
            .deny_authorization(&rich_v2("2"), AuthorizationDecision::new("555"))
            .await
            .unwrap();
        assert_eq!(result.status, Some(AuthorizationStatus::DenyProcessed))
    }

    #[tokio::test]
    async fn test_confirm_rejected() {
        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .returning(|_| ok(data_body(serde_json::json!({"success": false}))));

        let result = client(transport)
            .confirm_authorization(&rich_v1("1"), AuthorizationDecision::new("444"))
            .await;
        assert_eq!(result.unwrap_err().error_class, ErrorClass::ApiResponseError)
    }

    #[tokio::test]
    async fn test_decision_for_item() {
        let live = AuthorizationItem::from_data(
            authorization("444", "1", Duration::minutes(5)),
            AuthorizationStatus::Pending,
        );
        let decision = AuthorizationDecision::for_item(&live).unwrap();
        assert_eq!(decision.authorization_id, "444".to_string());
        assert_eq!(decision.authorization_code, Some("code-444".to_string()));

        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .withf(|request: &ApiRequest| {
                let value: Value =
                    serde_json::from_str(request.body.as_deref().unwrap_or("{}")).unwrap();
                value["data"]["authorization_code"] == "code-444"
            })
            .returning(|_| ok(data_body(serde_json::json!({"success": true}))));

        let result = client(transport)
            .confirm_authorization(&rich_v1("1"), decision)
            .await;
        assert!(result.is_ok());

        let expired = AuthorizationItem::from_data(
            authorization("445", "1", Duration::seconds(-1)),
            AuthorizationStatus::Pending,
        );
        let err = AuthorizationDecision::for_item(&expired).unwrap_err();
        assert_eq!(err.error_class, ErrorClass::ApiRequestError);

        let denied = AuthorizationItem::from_data(
            authorization("446", "1", Duration::minutes(5)),
            AuthorizationStatus::Denied,
        );
        assert!(AuthorizationDecision::for_item(&denied).is_err())
    }

    #[tokio::test]
    async fn test_confirm_garbled_acknowledgement() {
        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .returning(|_| ok("<html>maintenance</html>".to_string()));

        let result = client(transport)
            .confirm_authorization(&rich_v1("1"), AuthorizationDecision::new("444"))
            .await;
        assert_eq!(result.unwrap_err().error_class, ErrorClass::ApiResponseError)
    }

    #[tokio::test]
    async fn test_confirm_empty_acknowledgement() {
        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .returning(|_| ok(String::new()));

        let result = client(transport)
            .confirm_authorization(&rich_v1("1"), AuthorizationDecision::new("444"))
            .await;
        assert!(result.is_ok())
    }

    #[tokio::test]
    async fn test_send_action() {
        let mut transport = MockFakeTransport::new();
        transport
            .expect_submit()
            .times(1)
            .withf(|request: &ApiRequest| {
                request.method == Method::PUT
                    && request.url
                        == "https://demo.example.com/api/authenticator/v1/actions/action-1"
            })
            .returning(|_| {
                ok(data_body(serde_json::json!({
                    "success": true,
                    "connection_id": "1",
                    "authorization_id": "444"
                })))
            });

        let result = client(transport)
            .send_action("action-1", &rich_v1("1"))
            .await
            .unwrap();
        assert_eq!(
            result,
            ActionResult {
                connection_id: "1".to_string(),
                authorization_id: Some("444".to_string()),
            }
        )
    }
}
