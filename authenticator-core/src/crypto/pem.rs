//! PEM wrappers for the public keys exchanged with a provider. RSA keys travel as SPKI
//! (`PUBLIC KEY`) or PKCS#1 (`RSA PUBLIC KEY`), X25519 keys only as SPKI.
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::der::asn1::BitStringRef;
use rsa::pkcs8::spki::{
    self, AlgorithmIdentifierRef, DecodePublicKey, EncodePublicKey, SubjectPublicKeyInfoRef,
};
use rsa::pkcs8::{Document, LineEnding, ObjectIdentifier};
use rsa::RsaPublicKey;
use x25519_dalek::PublicKey as X25519PublicKey;

use super::types::CryptoError;

pub const X25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.110");

/// `X25519Spki` carries the raw key through the SPKI encoder and decoder
struct X25519Spki([u8; 32]);

impl TryFrom<SubjectPublicKeyInfoRef<'_>> for X25519Spki {
    type Error = spki::Error;

    fn try_from(info: SubjectPublicKeyInfoRef<'_>) -> spki::Result<Self> {
        info.algorithm.assert_algorithm_oid(X25519_OID)?;
        if info.algorithm.parameters.is_some() {
            return Err(spki::Error::KeyMalformed);
        }

        info.subject_public_key
            .as_bytes()
            .ok_or(spki::Error::KeyMalformed)?
            .try_into()
            .map(X25519Spki)
            .map_err(|_| spki::Error::KeyMalformed)
    }
}

impl EncodePublicKey for X25519Spki {
    fn to_public_key_der(&self) -> spki::Result<Document> {
        SubjectPublicKeyInfoRef {
            algorithm: AlgorithmIdentifierRef {
                oid: X25519_OID,
                parameters: None,
            },
            subject_public_key: BitStringRef::new(0, &self.0)?,
        }
        .try_into()
    }
}

pub fn rsa_public_key_to_pem(public_key: &RsaPublicKey) -> Result<String, CryptoError> {
    public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|err| CryptoError::EncodeError(err.to_string()))
}

/// `rsa_public_key_from_pem` accepts the SPKI and the PKCS#1 wrappers, anything else is
/// refused
pub fn rsa_public_key_from_pem(pem: &str) -> Result<RsaPublicKey, CryptoError> {
    let pem = pem.trim();
    RsaPublicKey::from_public_key_pem(pem).or_else(|spki_err| {
        RsaPublicKey::from_pkcs1_pem(pem).map_err(|pkcs1_err| {
            CryptoError::PemError(format!("spki: {}, pkcs1: {}", spki_err, pkcs1_err))
        })
    })
}

pub fn x25519_public_key_to_pem(public_key: &X25519PublicKey) -> Result<String, CryptoError> {
    X25519Spki(public_key.to_bytes())
        .to_public_key_pem(LineEnding::LF)
        .map_err(|err| CryptoError::EncodeError(err.to_string()))
}

pub fn x25519_public_key_from_pem(pem: &str) -> Result<X25519PublicKey, CryptoError> {
    X25519Spki::from_public_key_pem(pem.trim())
        .map(|key| X25519PublicKey::from(key.0))
        .map_err(|err| CryptoError::PemError(err.to_string()))
}
