use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

use super::{Client, KeyStore, Polling};

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(crate = "self::serde")]
pub struct Config {
    #[serde(default)]
    pub(super) client: Client,

    #[serde(default)]
    pub(super) polling: Polling,

    #[serde(default)]
    pub(super) keystore: KeyStore,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn polling(&self) -> &Polling {
        &self.polling
    }

    pub fn keystore(&self) -> &KeyStore {
        &self.keystore
    }
}

impl ToValidate for Config {
    fn validate(&self) -> Result<(), CommonError> {
        _ = self.client.validate()?;
        _ = self.polling.validate()?;
        _ = self.keystore.validate()?;

        Ok(())
    }
}
