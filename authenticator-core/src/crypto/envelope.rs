use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rsa::{RsaPrivateKey, RsaPublicKey};

use rst_common::standard::serde::de::DeserializeOwned;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;
use rst_common::with_logging::log::debug;

use super::aes::{aes_decrypt, aes_encrypt, generate_iv, generate_key};
use super::rsa::{rsa_decrypt, rsa_encrypt};
use super::types::{CryptoError, AES_IV_LEN, AES_KEY_LEN, SUPPORTED_ALGORITHM};

/// `EnvelopeContent` is implemented by every payload that travels inside an envelope.
/// The decrypted object must name the same item and connection as its envelope.
pub trait EnvelopeContent: DeserializeOwned {
    fn content_id(&self) -> &str;
    fn content_connection_id(&self) -> &str;
}

/// `EncryptedEnvelopeV1` carries its own AES key and IV, both wrapped with the device
/// RSA public key
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct EncryptedEnvelopeV1 {
    pub id: String,
    pub connection_id: String,
    pub algorithm: String,
    pub key: String,
    pub iv: String,
    pub data: String,
}

/// `EncryptedEnvelopeV2` is encrypted with the connection shared secret
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct EncryptedEnvelopeV2 {
    pub id: String,
    pub connection_id: String,
    pub algorithm: String,
    pub iv: String,
    pub data: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EncryptedEnvelope {
    V1(EncryptedEnvelopeV1),
    V2(EncryptedEnvelopeV2),
}

impl EncryptedEnvelope {
    pub fn id(&self) -> &str {
        match self {
            EncryptedEnvelope::V1(envelope) => &envelope.id,
            EncryptedEnvelope::V2(envelope) => &envelope.id,
        }
    }

    pub fn connection_id(&self) -> &str {
        match self {
            EncryptedEnvelope::V1(envelope) => &envelope.connection_id,
            EncryptedEnvelope::V2(envelope) => &envelope.connection_id,
        }
    }
}

impl EncryptedEnvelopeV1 {
    pub fn seal<T: Serialize>(
        id: &str,
        connection_id: &str,
        content: &T,
        public_key: &RsaPublicKey,
    ) -> Result<Self, CryptoError> {
        let plaintext =
            serde_json::to_vec(content).map_err(|err| CryptoError::EncodeError(err.to_string()))?;

        let key = generate_key();
        let iv = generate_iv();
        let data = aes_encrypt(&plaintext, &key, &iv)?;

        Ok(Self {
            id: id.to_string(),
            connection_id: connection_id.to_string(),
            algorithm: SUPPORTED_ALGORITHM.to_string(),
            key: STANDARD.encode(rsa_encrypt(&key, public_key)?),
            iv: STANDARD.encode(rsa_encrypt(&iv, public_key)?),
            data: STANDARD.encode(data),
        })
    }

    pub fn decrypt(&self, private_key: &RsaPrivateKey) -> Option<Vec<u8>> {
        if self.algorithm != SUPPORTED_ALGORITHM {
            debug!("[envelope:decrypt] unsupported algorithm: {}", self.algorithm);
            return None;
        }

        let key = rsa_decrypt(&STANDARD.decode(&self.key).ok()?, private_key)?;
        let iv = rsa_decrypt(&STANDARD.decode(&self.iv).ok()?, private_key)?;
        if key.len() != AES_KEY_LEN || iv.len() != AES_IV_LEN {
            return None;
        }

        aes_decrypt(&STANDARD.decode(&self.data).ok()?, &key, &iv)
    }

    pub fn open<T: EnvelopeContent>(&self, private_key: &RsaPrivateKey) -> Option<T> {
        let plaintext = self.decrypt(private_key)?;
        parse_content(&plaintext, &self.id, &self.connection_id)
    }
}

impl EncryptedEnvelopeV2 {
    pub fn seal<T: Serialize>(
        id: &str,
        connection_id: &str,
        content: &T,
        shared_secret: &[u8],
    ) -> Result<Self, CryptoError> {
        let plaintext =
            serde_json::to_vec(content).map_err(|err| CryptoError::EncodeError(err.to_string()))?;
        let (iv, data) = encrypt_with_shared_secret(&plaintext, shared_secret)?;

        Ok(Self {
            id: id.to_string(),
            connection_id: connection_id.to_string(),
            algorithm: SUPPORTED_ALGORITHM.to_string(),
            iv,
            data,
            status: None,
        })
    }

    pub fn decrypt(&self, shared_secret: &[u8]) -> Option<Vec<u8>> {
        if self.algorithm != SUPPORTED_ALGORITHM {
            debug!("[envelope:decrypt] unsupported algorithm: {}", self.algorithm);
            return None;
        }

        decrypt_with_shared_secret(&self.iv, &self.data, shared_secret)
    }

    pub fn open<T: EnvelopeContent>(&self, shared_secret: &[u8]) -> Option<T> {
        let plaintext = self.decrypt(shared_secret)?;
        parse_content(&plaintext, &self.id, &self.connection_id)
    }
}

/// `encrypt_with_shared_secret` returns the base64 IV and the base64 ciphertext
pub fn encrypt_with_shared_secret(
    plaintext: &[u8],
    shared_secret: &[u8],
) -> Result<(String, String), CryptoError> {
    let iv = generate_iv();
    let data = aes_encrypt(plaintext, shared_secret, &iv)?;
    Ok((STANDARD.encode(iv), STANDARD.encode(data)))
}

pub fn decrypt_with_shared_secret(iv: &str, data: &str, shared_secret: &[u8]) -> Option<Vec<u8>> {
    let iv = STANDARD.decode(iv).ok()?;
    if iv.len() != AES_IV_LEN {
        return None;
    }

    aes_decrypt(&STANDARD.decode(data).ok()?, shared_secret, &iv)
}

fn parse_content<T: EnvelopeContent>(plaintext: &[u8], id: &str, connection_id: &str) -> Option<T> {
    let content: T = match serde_json::from_slice(plaintext) {
        Ok(content) => content,
        Err(err) => {
            debug!("[envelope:open] unable to parse content: {}", err);
            return None;
        }
    };

    if content.content_id() != id || content.content_connection_id() != connection_id {
        debug!("[envelope:open] content does not match envelope {}", id);
        return None;
    }

    Some(content)
}
