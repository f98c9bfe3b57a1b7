use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

pub const DEFAULT_RSA_KEY_BITS: usize = 2048;
// RS256 signing refuses smaller moduli
pub const MIN_RSA_KEY_BITS: usize = 2048;

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct KeyStore {
    pub(super) rsa_key_bits: usize,
}

impl KeyStore {
    pub fn new(rsa_key_bits: usize) -> Self {
        Self { rsa_key_bits }
    }

    pub fn rsa_key_bits(&self) -> usize {
        self.rsa_key_bits
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self {
            rsa_key_bits: DEFAULT_RSA_KEY_BITS,
        }
    }
}

impl ToValidate for KeyStore {
    fn validate(&self) -> Result<(), CommonError> {
        if self.rsa_key_bits < MIN_RSA_KEY_BITS {
            return Err(CommonError::ValidationError(format!(
                "config: keystore:rsa_key_bits must be at least {}",
                MIN_RSA_KEY_BITS
            )));
        }

        Ok(())
    }
}
