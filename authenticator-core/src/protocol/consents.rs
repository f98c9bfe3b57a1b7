use rst_common::with_logging::log::{debug, info};

use crate::authorization::ConsentItem;
use crate::connection::types::ApiVersion;
use crate::connection::RichConnection;
use crate::errors::ApiError;

use super::client::{decode_envelopes, open_contents, ProtocolClient};
use super::endpoint::Endpoint;
use super::types::{ConsentRevoked, FetchResult, TransportBuilder};
use super::wire::{parse_outcome, EmptyData};

impl<TTransport> ProtocolClient<TTransport>
where
    TTransport: TransportBuilder,
{
    /// `fetch_consents` only asks connections whose provider manages consents, the others
    /// are skipped without an error
    pub async fn fetch_consents(&self, riches: Vec<RichConnection>) -> FetchResult<ConsentItem> {
        let supported = riches
            .into_iter()
            .filter(|rich| rich.connection().consent_management_supported)
            .collect::<Vec<RichConnection>>();

        let results = self
            .fan_out(supported, |client, rich| async move {
                client.fetch_connection_consents(rich).await
            })
            .await;

        let result = Self::collect(results);
        debug!(
            "[protocol:fetch_consents] {} consents, {} failed",
            result.items.len(),
            result.errors.len()
        );
        result
    }

    async fn fetch_connection_consents(
        &self,
        rich: RichConnection,
    ) -> Result<Vec<ConsentItem>, ApiError> {
        let body = self
            .submit(self.signed_request(&rich, Endpoint::Consents, None)?)
            .await?;

        let envelopes = decode_envelopes(rich.connection().api_version, &body)?;
        open_contents::<ConsentItem>(rich, envelopes).await
    }

    pub async fn revoke_consent(
        &self,
        rich: &RichConnection,
        consent_id: &str,
    ) -> Result<ConsentRevoked, ApiError> {
        if consent_id.is_empty() {
            return Err(ApiError::request("consent id is empty".to_string()));
        }

        if !rich.connection().consent_management_supported {
            return Err(ApiError::request(format!(
                "connection {} does not manage consents",
                rich.id()
            )));
        }

        let body = match rich.connection().api_version {
            ApiVersion::V1 => None,
            ApiVersion::V2 => Some(self.v2_body(EmptyData::default())?),
        };

        let endpoint = Endpoint::RevokeConsent { consent_id };
        let response = self.submit(self.signed_request(rich, endpoint, body)?).await?;
        let outcome = parse_outcome(&response)?;
        if outcome.is_rejected() {
            return Err(ApiError::response(format!(
                "consent {} revoke rejected by provider",
                consent_id
            )));
        }

        info!("[protocol:revoke_consent] revoked consent {}", consent_id);
        Ok(ConsentRevoked {
            consent_id: outcome.consent_id.unwrap_or_else(|| consent_id.to_string()),
            connection_id: rich.id().to_string(),
        })
    }
}
