use http::Method;

use crate::connection::types::ApiVersion;

const V1_PREFIX: &str = "/api/authenticator/v1";
const V2_PREFIX: &str = "/api/authenticator/v2";

/// `Endpoint` names a protocol verb, [`Endpoint::route`] resolves it for an api version
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint<'a> {
    CreateConnection,
    RevokeConnection { connection_id: &'a str },
    Authorizations,
    Authorization { authorization_id: &'a str },
    ConfirmAuthorization { authorization_id: &'a str },
    DenyAuthorization { authorization_id: &'a str },
    Action { action_uuid: &'a str },
    PushToken { connection_id: &'a str },
    Consents,
    RevokeConsent { consent_id: &'a str },
}

impl<'a> Endpoint<'a> {
    pub fn route(&self, version: ApiVersion) -> (Method, String) {
        match version {
            ApiVersion::V1 => self.route_v1(),
            ApiVersion::V2 => self.route_v2(),
        }
    }

    fn route_v1(&self) -> (Method, String) {
        match self {
            Endpoint::CreateConnection => (Method::POST, format!("{}/connections", V1_PREFIX)),
            Endpoint::RevokeConnection { .. } => {
                (Method::DELETE, format!("{}/connections", V1_PREFIX))
            }
            Endpoint::Authorizations => (Method::GET, format!("{}/authorizations", V1_PREFIX)),
            Endpoint::Authorization { authorization_id } => (
                Method::GET,
                format!("{}/authorizations/{}", V1_PREFIX, authorization_id),
            ),
            Endpoint::ConfirmAuthorization { authorization_id }
            | Endpoint::DenyAuthorization { authorization_id } => (
                Method::PUT,
                format!("{}/authorizations/{}", V1_PREFIX, authorization_id),
            ),
            Endpoint::Action { action_uuid } => {
                (Method::PUT, format!("{}/actions/{}", V1_PREFIX, action_uuid))
            }
            Endpoint::PushToken { .. } => (
                Method::PUT,
                format!("{}/connections/push_token", V1_PREFIX),
            ),
            Endpoint::Consents => (Method::GET, format!("{}/consents", V1_PREFIX)),
            Endpoint::RevokeConsent { consent_id } => (
                Method::DELETE,
                format!("{}/consents/{}", V1_PREFIX, consent_id),
            ),
        }
    }

    fn route_v2(&self) -> (Method, String) {
        match self {
            Endpoint::CreateConnection => (Method::POST, format!("{}/connections", V2_PREFIX)),
            Endpoint::RevokeConnection { connection_id } => (
                Method::PUT,
                format!("{}/connections/{}/revoke", V2_PREFIX, connection_id),
            ),
            Endpoint::Authorizations => (Method::GET, format!("{}/authorizations", V2_PREFIX)),
            Endpoint::Authorization { authorization_id } => (
                Method::GET,
                format!("{}/authorizations/{}", V2_PREFIX, authorization_id),
            ),
            Endpoint::ConfirmAuthorization { authorization_id } => (
                Method::PUT,
                format!("{}/authorizations/{}/confirm", V2_PREFIX, authorization_id),
            ),
            Endpoint::DenyAuthorization { authorization_id } => (
                Method::PUT,
                format!("{}/authorizations/{}/deny", V2_PREFIX, authorization_id),
            ),
            Endpoint::Action { action_uuid } => {
                (Method::POST, format!("{}/actions/{}", V2_PREFIX, action_uuid))
            }
            Endpoint::PushToken { connection_id } => (
                Method::PUT,
                format!("{}/connections/{}/push_token", V2_PREFIX, connection_id),
            ),
            Endpoint::Consents => (Method::GET, format!("{}/consents", V2_PREFIX)),
            Endpoint::RevokeConsent { consent_id } => (
                Method::PUT,
                format!("{}/consents/{}/revoke", V2_PREFIX, consent_id),
            ),
        }
    }
}

/// `join_url` appends an absolute path to the connect url of a provider
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
