use std::time::Duration;

use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

pub const DEFAULT_USER_AGENT: &str = "sca-authenticator/0.1";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en";
pub const DEFAULT_SIGNATURE_EXPIRY_SECS: u64 = 300;
pub const MAX_SIGNATURE_EXPIRY_SECS: u64 = 86_400;

/// `Client` configures the headers and the signature window used by the protocol client
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Client {
    pub(super) user_agent: String,
    pub(super) accept_language: String,
    pub(super) signature_expiry_secs: u64,
}

impl Client {
    pub fn new(user_agent: String, accept_language: String, signature_expiry_secs: u64) -> Self {
        Self {
            user_agent,
            accept_language,
            signature_expiry_secs,
        }
    }

    pub fn user_agent(&self) -> String {
        self.user_agent.to_owned()
    }

    pub fn accept_language(&self) -> String {
        self.accept_language.to_owned()
    }

    pub fn signature_window(&self) -> Duration {
        Duration::from_secs(self.signature_expiry_secs)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            signature_expiry_secs: DEFAULT_SIGNATURE_EXPIRY_SECS,
        }
    }
}

impl ToValidate for Client {
    fn validate(&self) -> Result<(), CommonError> {
        if self.user_agent.is_empty() {
            return Err(CommonError::ValidationError(
                "config: client:user_agent is missing".to_string(),
            ));
        }

        if self.accept_language.is_empty() {
            return Err(CommonError::ValidationError(
                "config: client:accept_language is missing".to_string(),
            ));
        }

        if self.signature_expiry_secs == 0 {
            return Err(CommonError::ValidationError(
                "config: client:signature_expiry_secs must be positive".to_string(),
            ));
        }

        if self.signature_expiry_secs > MAX_SIGNATURE_EXPIRY_SECS {
            return Err(CommonError::ValidationError(format!(
                "config: client:signature_expiry_secs must be at most {}",
                MAX_SIGNATURE_EXPIRY_SECS
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::env;
    use std::path::PathBuf;

    use rstdev_config::format::use_toml;
    use rstdev_config::parser::from_file;
    use rstdev_config::{types::ConfigError, Builder};

    use crate::common::helpers;

    #[test]
    fn test_parse_client_config() -> Result<(), ConfigError> {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("src/config/fixtures");

        let toml_file = format!("{}/config_client.toml", path.display());
        let config_toml = {
            let config_builder: Result<Client, ConfigError> =
                Builder::new(from_file(toml_file)).fetch()?.parse(use_toml);

            config_builder
        };

        assert!(!config_toml.is_err());

        let config_client = config_toml.unwrap();
        assert_eq!(config_client.user_agent(), "bank-authenticator/2.4".to_string());
        assert_eq!(config_client.accept_language(), "de".to_string());
        assert_eq!(config_client.signature_window(), Duration::from_secs(120));
        Ok(())
    }

    #[test]
    fn test_client_validation_failed() {
        let mut client = Client::default();
        client.user_agent = "".to_string();

        let validation = helpers::validate(client.clone());
        assert!(validation.is_err());
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("client:user_agent"));

        client.user_agent = "agent".to_string();
        client.signature_expiry_secs = 0;
        let validation = helpers::validate(client);
        assert!(validation.is_err());
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("client:signature_expiry_secs"))
    }

    #[test]
    fn test_client_signature_window_bounded() {
        let mut client = Client::default();
        client.signature_expiry_secs = u64::MAX;

        let validation = helpers::validate(client.clone());
        assert!(validation.is_err());
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("at most 86400"));

        client.signature_expiry_secs = MAX_SIGNATURE_EXPIRY_SECS;
        assert!(!helpers::validate(client).is_err())
    }

    #[test]
    fn test_client_default_is_valid() {
        let validation = helpers::validate(Client::default());
        assert!(!validation.is_err());
    }
}
