use std::collections::HashMap;
use std::net::IpAddr;

use rst_common::with_logging::log::debug;
use url::{Host, Url};

use crate::connection::types::ApiVersion;

use super::types::{
    ActionAppLinkData, AppLink, ConnectAppLinkData, DeeplinkError, PARAM_ACTION_ID,
    PARAM_ACTION_UUID, PARAM_API_VERSION, PARAM_CONFIGURATION, PARAM_CONNECT_QUERY,
    PARAM_CONNECT_URL, PARAM_PROVIDER_ID, PARAM_RETURN_TO,
};

fn query_params(link: &str) -> Result<HashMap<String, String>, DeeplinkError> {
    let url = Url::parse(link.trim()).map_err(|err| DeeplinkError::MalformedLink(err.to_string()))?;

    Ok(url
        .query_pairs()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect())
}

fn is_loopback(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Host::Ipv4(addr) => IpAddr::V4(*addr).is_loopback() || addr.is_unspecified(),
        Host::Ipv6(addr) => {
            let mapped = addr
                .to_ipv4_mapped()
                .map(|v4| v4.is_loopback() || v4.is_unspecified())
                .unwrap_or(false);

            IpAddr::V6(*addr).is_loopback() || addr.is_unspecified() || mapped
        }
    }
}

fn validate_configuration_url(value: &str) -> Result<(), DeeplinkError> {
    let url = Url::parse(value)
        .map_err(|err| DeeplinkError::InsecureConfiguration(format!("{}: {}", value, err)))?;

    if url.scheme() != "https" {
        return Err(DeeplinkError::InsecureConfiguration(value.to_string()));
    }

    match url.host() {
        Some(host) if !is_loopback(&host) => Ok(()),
        _ => Err(DeeplinkError::InsecureConfiguration(value.to_string())),
    }
}

pub fn parse_connect_link(link: &str) -> Result<ConnectAppLinkData, DeeplinkError> {
    let mut params = query_params(link)?;
    let configuration_url = params
        .remove(PARAM_CONFIGURATION)
        .ok_or_else(|| DeeplinkError::MissingParameter(PARAM_CONFIGURATION.to_string()))?;

    validate_configuration_url(&configuration_url)?;
    debug!("[deeplink:connect] configuration at {}", configuration_url);

    Ok(ConnectAppLinkData {
        configuration_url,
        connect_query: params.remove(PARAM_CONNECT_QUERY),
    })
}

pub fn parse_action_link(link: &str) -> Result<ActionAppLinkData, DeeplinkError> {
    let mut params = query_params(link)?;
    let action_id = params
        .remove(PARAM_ACTION_UUID)
        .or_else(|| params.remove(PARAM_ACTION_ID))
        .ok_or_else(|| DeeplinkError::MissingParameter(PARAM_ACTION_UUID.to_string()))?;

    let api_version = match params.remove(PARAM_API_VERSION) {
        Some(value) => ApiVersion::from_value(&value)
            .ok_or(DeeplinkError::UnsupportedVersion(value))?,
        None => ApiVersion::V1,
    };

    let data = ActionAppLinkData {
        action_id,
        api_version,
        connect_url: params.remove(PARAM_CONNECT_URL),
        provider_id: params.remove(PARAM_PROVIDER_ID),
        return_to: params.remove(PARAM_RETURN_TO),
    };

    match data.api_version {
        ApiVersion::V1 if data.connect_url.is_none() => Err(DeeplinkError::MissingParameter(
            PARAM_CONNECT_URL.to_string(),
        )),
        ApiVersion::V2 if data.provider_id.is_none() => Err(DeeplinkError::MissingParameter(
            PARAM_PROVIDER_ID.to_string(),
        )),
        _ => Ok(data),
    }
}

/// `parse_link` picks the link kind from its parameters, a link carrying a configuration
/// url is a connect link
pub fn parse_link(link: &str) -> Result<AppLink, DeeplinkError> {
    let params = query_params(link)?;
    if params.contains_key(PARAM_CONFIGURATION) {
        return parse_connect_link(link).map(AppLink::Connect);
    }

    if params.contains_key(PARAM_ACTION_UUID) || params.contains_key(PARAM_ACTION_ID) {
        return parse_action_link(link).map(AppLink::Action);
    }

    Err(DeeplinkError::MalformedLink(
        "neither a connect nor an action link".to_string(),
    ))
}
