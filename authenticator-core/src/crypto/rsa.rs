use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

use super::types::CryptoError;

pub fn generate_private_key(bits: usize) -> Result<RsaPrivateKey, CryptoError> {
    RsaPrivateKey::new(&mut OsRng, bits).map_err(|err| CryptoError::GenerateKeyError(err.to_string()))
}

/// `rsa_encrypt` uses PKCS#1 v1.5 padding, the scheme providers expect for wrapped AES keys
pub fn rsa_encrypt(plaintext: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>, CryptoError> {
    public_key
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)
        .map_err(|err| CryptoError::RsaEncryptError(err.to_string()))
}

pub fn rsa_decrypt(ciphertext: &[u8], private_key: &RsaPrivateKey) -> Option<Vec<u8>> {
    private_key.decrypt(Pkcs1v15Encrypt, ciphertext).ok()
}

pub fn private_key_to_der(private_key: &RsaPrivateKey) -> Result<Vec<u8>, CryptoError> {
    private_key
        .to_pkcs8_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|err| CryptoError::EncodeError(err.to_string()))
}

pub fn private_key_from_der(der: &[u8]) -> Option<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_der(der).ok()
}
